//! Per-loop-variable annotation: thread binding, for-kind overrides, and
//! pragmas.

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{
    AttrKey, AttrNode, Expr, ForKind, IterVar, Stmt, Var, VarMap, mutate_children, post_order_visit, substitute_stmt,
};

use crate::error::*;
use crate::stage::{IterVarAttr, Stage};

/// Applies the stage's per-variable attributes to the reordered tree.
///
/// For each leaf variable (resolved through the rebase alias map to the
/// variable actually present in the tree): verify it occurs in exactly one
/// loop, then
///
/// - thread binding replaces the loop with its body, substituting the
///   loop variable with the thread-index variable and wrapping the result
///   in a `thread_extent` attribute carrying the loop's extent;
/// - otherwise a differing expected for-kind rebuilds the loop node with
///   the new kind, preserving bounds and body;
/// - pragmas wrap the result in scoped pragma attributes, applied in
///   declaration order (the last-declared pragma ends outermost).
pub fn apply_loop_annotations(
    stage: &Stage,
    rebased: &HashMap<IterVar, IterVar>,
    stmt: &Rc<Stmt>,
) -> Result<Rc<Stmt>> {
    let mut stmt = stmt.clone();
    for leaf in &stage.leaf_iter_vars {
        let actual = rebased.get(leaf).unwrap_or(leaf);
        let var = actual.var();
        let attr = stage.iter_var_attrs.get(leaf);
        let expected = attr.and_then(|a| a.iter_type).unwrap_or(leaf.iter_type()).for_kind();

        if let Some(attr) = attr {
            if attr.pragma_keys.len() != attr.pragma_values.len() {
                return PragmaAritySnafu { keys: attr.pragma_keys.len(), values: attr.pragma_values.len() }.fail();
            }
        }

        // The variable must be referenced by exactly one loop node; the
        // scan also captures that loop's current shape.
        let mut found = 0usize;
        let mut shape: Option<(ForKind, Rc<Expr>)> = None;
        post_order_visit(&stmt, &mut |s| {
            if let Stmt::For { loop_var, kind, extent, .. } = &**s {
                if loop_var == var {
                    found += 1;
                    shape = Some((*kind, extent.clone()));
                }
            }
        });
        let Some((current_kind, current_extent)) = shape else {
            return LoopMultiplicitySnafu { var: var.name(), found: 0usize }.fail();
        };
        if found != 1 {
            return LoopMultiplicitySnafu { var: var.name(), found }.fail();
        }

        let needs_change = expected != current_kind
            || attr.is_some_and(|a| a.bind_thread.is_some() || !a.pragma_keys.is_empty());
        if !needs_change {
            continue;
        }

        if let Some(attr) = attr {
            if let Some(thread) = &attr.bind_thread {
                if let Some(dom) = thread.dom() {
                    if !dom.is_zero_based() {
                        return NonZeroBaseSnafu { var: thread.var().name(), min: dom.min.to_string() }.fail();
                    }
                    if dom.extent != current_extent {
                        return ThreadExtentMismatchSnafu {
                            var: var.name(),
                            declared: dom.extent.to_string(),
                            actual: current_extent.to_string(),
                        }
                        .fail();
                    }
                }
            }
        }

        let annotator = LoopAnnotator { var, attr, expected };
        stmt = annotator.rewrite(&stmt);
    }
    Ok(stmt)
}

struct LoopAnnotator<'a> {
    var: &'a Var,
    attr: Option<&'a IterVarAttr>,
    expected: ForKind,
}

impl LoopAnnotator<'_> {
    fn rewrite(&self, stmt: &Rc<Stmt>) -> Rc<Stmt> {
        match &**stmt {
            Stmt::For { loop_var, min, extent, kind, body } if loop_var == self.var => {
                let mut out = stmt.clone();
                let bind_thread = self.attr.and_then(|a| a.bind_thread.as_ref());
                if let Some(thread) = bind_thread {
                    let rmap = VarMap::from([(loop_var.clone(), Expr::var(thread.var()))]);
                    let body = substitute_stmt(body, &rmap);
                    out = Stmt::attr(AttrNode::IterVar(thread.clone()), AttrKey::ThreadExtent, extent.clone(), body);
                } else if self.expected != *kind {
                    out = Stmt::loop_(loop_var, min.clone(), extent.clone(), self.expected, body.clone());
                }
                if let Some(attr) = self.attr {
                    for (key, value) in attr.pragma_keys.iter().zip(&attr.pragma_values) {
                        out = Stmt::attr(
                            AttrNode::Var(loop_var.clone()),
                            AttrKey::Pragma(key.clone()),
                            value.clone(),
                            out,
                        );
                    }
                }
                out
            }
            _ => mutate_children(stmt, &mut |child| self.rewrite(child)),
        }
    }
}
