//! General loop reordering.
//!
//! Permutes an existing loop nest into the stage's required leaf order by
//! repeated extract/re-insert moves. Each move takes the innermost loop
//! that sits behind its required position, splices its body in place, and
//! re-inserts a fresh loop immediately enclosing the loop that the
//! required order places right after it. Every move brings one loop
//! strictly closer to its slot, so variable scope never shrinks below a
//! use site and the procedure converges in at most one pass per loop,
//! O(n²) moves total.
//!
//! Example: current `io ii jo ji`, required `ji ii io jo`:
//!
//! ```text
//! io ii jo ji -> io ji ii jo -> ii io ji jo -> ji ii io jo
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{AttrKey, AttrNode, Expr, ForKind, IterVar, Range, Stmt, Var, mutate_children, post_order_visit};
use tracing::trace;

use crate::error::*;
use crate::stage::{DomMap, Stage};

/// Permutes the loop nest of `stmt` into the stage's required leaf order.
///
/// The required order substitutes rebased leaf variables with their rebase
/// parents (the variables actually present in the tree) and resolves each
/// variable's range from its own domain if defined, else the bound map.
pub fn apply_loop_order(
    stage: &Stage,
    dom_map: &DomMap,
    rebased: &HashMap<IterVar, IterVar>,
    stmt: &Rc<Stmt>,
) -> Result<Rc<Stmt>> {
    let required = required_order(stage, dom_map, rebased)?;
    let mut stmt = stmt.clone();
    let mut current = current_order(&stmt);

    // Defensive bound: one pass per loop is provably enough, so anything
    // past n² + n moves is an inconsistency, not slow convergence.
    let limit = required.len() * required.len() + required.len();
    let mut moves = 0usize;

    while reorder_needed(&current, &required)? {
        if moves > limit {
            return ReorderDivergedSnafu { iterations: moves, loops: required.len() }.fail();
        }
        let plan = plan_move(&current, &required, stage, dom_map)?;
        trace!(target_var = %plan.target, slot = plan.slot, "moving loop toward its required position");

        let mut extractor = Extractor { target: &plan.target, attrs: Vec::new() };
        let stripped = extractor.rewrite(&stmt);
        let mut inserter = Inserter { plan: &plan, attrs: extractor.attrs };
        stmt = inserter.rewrite(&stripped);

        current = current_order(&stmt);
        moves += 1;
    }
    Ok(stmt)
}

/// One extract/re-insert move, planned against the current order.
pub(crate) struct LoopMove {
    /// Variable of the loop being moved.
    pub(crate) target: Var,
    /// Index in the required order where the moved loop belongs.
    pub(crate) slot: usize,
    /// Variable whose loop the re-inserted loop must immediately enclose.
    pub(crate) immediate_after: Var,
    /// Range of the re-inserted loop, resolved at plan time.
    pub(crate) range: Range,
    pub(crate) kind: ForKind,
}

/// Current loop nesting order, outermost to innermost.
pub(crate) fn current_order(stmt: &Rc<Stmt>) -> Vec<Var> {
    let mut order = Vec::new();
    post_order_visit(stmt, &mut |s| {
        if let Stmt::For { loop_var, .. } = &**s {
            order.push(loop_var.clone());
        }
    });
    order.reverse();
    order
}

fn required_order(stage: &Stage, dom_map: &DomMap, rebased: &HashMap<IterVar, IterVar>) -> Result<Vec<IterVar>> {
    stage
        .leaf_iter_vars
        .iter()
        .map(|leaf| {
            let required = rebased.get(leaf).unwrap_or(leaf).clone();
            if required.dom().is_none() && !dom_map.contains_key(&required) {
                return UndefinedDomainSnafu { var: required.var().name() }.fail();
            }
            Ok(required)
        })
        .collect()
}

fn reorder_needed(current: &[Var], required: &[IterVar]) -> Result<bool> {
    if current.len() != required.len() {
        return LoopCountMismatchSnafu { current: current.len(), required: required.len() }.fail();
    }
    Ok(current.iter().zip(required).any(|(cur, req)| cur != req.var()))
}

/// Scans from the innermost loop outward for the first one behind its
/// required position, and resolves where it must go.
pub(crate) fn plan_move(
    current: &[Var],
    required: &[IterVar],
    stage: &Stage,
    dom_map: &DomMap,
) -> Result<LoopMove> {
    for i in (0..current.len()).rev() {
        if current[i] == *required[i].var() {
            continue;
        }
        for slot in (0..i).rev() {
            if current[i] != *required[slot].var() {
                continue;
            }
            let target_iv = &required[slot];
            let range = match target_iv.dom() {
                Some(dom) => dom.clone(),
                None => dom_map
                    .get(target_iv)
                    .cloned()
                    .ok_or_else(|| UndefinedDomainSnafu { var: target_iv.var().name() }.build())?,
            };
            let kind = stage
                .iter_var_attrs
                .get(target_iv)
                .and_then(|attr| attr.iter_type)
                .unwrap_or(target_iv.iter_type())
                .for_kind();
            return Ok(LoopMove {
                target: current[i].clone(),
                slot,
                immediate_after: required[slot + 1].var().clone(),
                range,
                kind,
            });
        }
    }
    NoOutOfOrderLoopSnafu.fail()
}

/// Removes the targeted loop, splicing its body in place, and detaches
/// every scoped attribute targeting the loop's variable (they must travel
/// with it).
pub(crate) struct Extractor<'a> {
    pub(crate) target: &'a Var,
    /// Detached attributes in original outer-to-inner order.
    pub(crate) attrs: Vec<(AttrKey, Rc<Expr>)>,
}

impl Extractor<'_> {
    pub(crate) fn rewrite(&mut self, stmt: &Rc<Stmt>) -> Rc<Stmt> {
        match &**stmt {
            Stmt::For { loop_var, body, .. } if loop_var == self.target => self.rewrite(body),
            Stmt::Attr { node: AttrNode::Var(var), key, value, body } if var == self.target => {
                self.attrs.push((key.clone(), value.clone()));
                self.rewrite(body)
            }
            _ => mutate_children(stmt, &mut |child| self.rewrite(child)),
        }
    }
}

/// Re-inserts the moved loop immediately enclosing the loop of
/// `immediate_after`, reattaching the detached attributes around it in
/// their original relative order.
pub(crate) struct Inserter<'a> {
    pub(crate) plan: &'a LoopMove,
    pub(crate) attrs: Vec<(AttrKey, Rc<Expr>)>,
}

impl Inserter<'_> {
    pub(crate) fn rewrite(&mut self, stmt: &Rc<Stmt>) -> Rc<Stmt> {
        match &**stmt {
            Stmt::For { loop_var, .. } if *loop_var == self.plan.immediate_after => {
                let mut body = Stmt::loop_(
                    &self.plan.target,
                    self.plan.range.min.clone(),
                    self.plan.range.extent.clone(),
                    self.plan.kind,
                    stmt.clone(),
                );
                for (key, value) in self.attrs.iter().rev() {
                    body = Stmt::attr(AttrNode::Var(self.plan.target.clone()), key.clone(), value.clone(), body);
                }
                body
            }
            _ => mutate_children(stmt, &mut |child| self.rewrite(child)),
        }
    }
}
