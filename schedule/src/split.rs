//! Loop splitting: rewrite one loop into an outer/inner pair.

use std::rc::Rc;

use ravel_ir::{AttrKey, Expr, IterVar, Range, Stmt, Var, VarMap, mutate_children, substitute_expr, substitute_stmt};

use crate::error::*;
use crate::stage::DomMap;

/// Applies one `Split(parent, outer, inner, factor)` relation.
///
/// The unique loop over `parent` becomes
///
/// ```text
/// for (outer, 0, extent(outer)) {
///   for (inner, 0, extent(inner)) {
///     if likely(outer*factor < parent_extent - inner) {   // non-divisible only
///       body[parent := inner + outer*factor]
/// ```
///
/// The guard keeps exactly this predicate shape so downstream bound
/// reasoning can recover the original extent; it is omitted only when
/// constant arithmetic proves `extent(outer) * factor` equals the parent
/// extent. Buffer-bind attribute values referencing `parent` are
/// substituted with the same index expression wherever they sit.
pub fn split_loop(
    parent: &IterVar,
    outer: &IterVar,
    inner: &IterVar,
    factor: &Rc<Expr>,
    dom_map: &DomMap,
    stmt: &Rc<Stmt>,
) -> Result<Rc<Stmt>> {
    let mut splitter = LoopSplitter::new(parent, outer, inner, factor, dom_map)?;
    let out = splitter.rewrite(stmt);
    if !splitter.split {
        return LoopNotFoundSnafu { var: parent.var().name() }.fail();
    }
    Ok(out)
}

struct LoopSplitter {
    parent: Var,
    factor: Rc<Expr>,
    outer: IterVar,
    inner: IterVar,
    /// `parent -> inner + outer*factor`, shared by loop bodies and
    /// buffer-bind attribute values.
    rmap: VarMap,
    split: bool,
}

impl LoopSplitter {
    fn new(parent: &IterVar, outer: &IterVar, inner: &IterVar, factor: &Rc<Expr>, dom_map: &DomMap) -> Result<Self> {
        let inner = resolve_split_var(inner, dom_map)?;
        let outer = resolve_split_var(outer, dom_map)?;

        let replacement =
            Expr::add(Expr::var(inner.var()), Expr::mul(Expr::var(outer.var()), factor.clone()));
        let rmap = VarMap::from([(parent.var().clone(), replacement)]);

        Ok(Self { parent: parent.var().clone(), factor: factor.clone(), outer, inner, rmap, split: false })
    }

    fn rewrite(&mut self, stmt: &Rc<Stmt>) -> Rc<Stmt> {
        match &**stmt {
            Stmt::For { loop_var, extent, body, .. } if *loop_var == self.parent => {
                let body = substitute_stmt(body, &self.rmap);
                let body = if self.divides_evenly(extent) {
                    body
                } else {
                    let cond = Expr::likely(Expr::lt(
                        Expr::mul(Expr::var(self.outer.var()), self.factor.clone()),
                        Expr::sub(extent.clone(), Expr::var(self.inner.var())),
                    ));
                    Stmt::if_then(cond, body)
                };
                let inner_dom = self.inner.dom().expect("split var resolved against the bound map");
                let outer_dom = self.outer.dom().expect("split var resolved against the bound map");
                let body = Stmt::loop_(
                    self.inner.var(),
                    Expr::int(0),
                    inner_dom.extent.clone(),
                    self.inner.iter_type().for_kind(),
                    body,
                );
                let ret = Stmt::loop_(
                    self.outer.var(),
                    Expr::int(0),
                    outer_dom.extent.clone(),
                    self.outer.iter_type().for_kind(),
                    body,
                );
                self.split = true;
                ret
            }
            Stmt::Attr { node, key: AttrKey::BufferBindScope, value, body } => {
                let new_value = substitute_expr(value, &self.rmap);
                let new_body = self.rewrite(body);
                if Rc::ptr_eq(&new_value, value) && Rc::ptr_eq(&new_body, body) {
                    stmt.clone()
                } else {
                    Stmt::attr(node.clone(), AttrKey::BufferBindScope, new_value, new_body)
                }
            }
            _ => mutate_children(stmt, &mut |child| self.rewrite(child)),
        }
    }

    /// True when the outer extent times the factor provably covers the
    /// parent extent exactly, making the range guard redundant.
    fn divides_evenly(&self, parent_extent: &Rc<Expr>) -> bool {
        let outer_extent = self.outer.dom().and_then(|dom| dom.extent.as_const_int());
        match (outer_extent, self.factor.as_const_int(), parent_extent.as_const_int()) {
            (Some(outer), Some(factor), Some(parent)) => outer * factor == parent,
            _ => false,
        }
    }
}

/// Fetches the fresh variable's range from the bound map and re-anchors the
/// iteration variable on it. Split domains must be zero-based: a non-zero
/// min would silently shift every substituted index.
fn resolve_split_var(iter_var: &IterVar, dom_map: &DomMap) -> Result<IterVar> {
    let dom: &Range = dom_map
        .get(iter_var)
        .ok_or_else(|| MissingBindingSnafu { var: iter_var.var().name() }.build())?;
    if !dom.is_zero_based() {
        return NonZeroBaseSnafu { var: iter_var.var().name(), min: dom.min.to_string() }.fail();
    }
    Ok(IterVar::new(Some(dom.clone()), iter_var.var().clone(), iter_var.iter_type()))
}
