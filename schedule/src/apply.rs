//! Pass sequencing and loop-variable gathering.

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{IterVar, Range, Stmt, post_order_visit};
use tracing::debug;

use crate::annotate::apply_loop_annotations;
use crate::error::*;
use crate::fuse::fuse_loops;
use crate::reorder::apply_loop_order;
use crate::split::split_loop;
use crate::stage::{DomMap, Relation, Stage};

/// Applies the stage's split and fuse relations in declaration order.
/// Rebase relations change no loop shapes and are skipped here; they are
/// resolved as aliases by reorder and annotation.
pub fn apply_loop_shapes(stage: &Stage, dom_map: &DomMap, stmt: &Rc<Stmt>) -> Result<Rc<Stmt>> {
    let mut stmt = stmt.clone();
    for relation in &stage.relations {
        match relation {
            Relation::Split { parent, outer, inner, factor } => {
                stmt = split_loop(parent, outer, inner, factor, dom_map, &stmt)?;
            }
            Relation::Fuse { outer, inner, fused } => {
                stmt = fuse_loops(outer, inner, fused, &stmt)?;
            }
            Relation::Rebase { .. } => {}
        }
    }
    Ok(stmt)
}

/// Orchestrator entry point: rewrites `stmt` to match the stage.
///
/// Strict pass order: rebase aliases are gathered first (reorder and
/// annotation need them to resolve leaf variables), then splits/fuses in
/// declaration order, then reorder, then annotation. Reorder requires the
/// post-split loop variables to exist, and annotation requires the final
/// nesting to attribute the correct physical loop node.
pub fn apply_schedule(stage: &Stage, dom_map: &DomMap, stmt: &Rc<Stmt>) -> Result<Rc<Stmt>> {
    debug!(
        relations = stage.relations.len(),
        leaf_vars = stage.leaf_iter_vars.len(),
        "applying schedule"
    );
    let mut rebased: HashMap<IterVar, IterVar> = HashMap::new();
    for relation in &stage.relations {
        if let Relation::Rebase { parent, rebased: fresh } = relation {
            if parent.dom().is_none() {
                return UndefinedDomainSnafu { var: parent.var().name() }.fail();
            }
            if !dom_map.contains_key(fresh) {
                return MissingBindingSnafu { var: fresh.var().name() }.fail();
            }
            rebased.insert(fresh.clone(), parent.clone());
        }
    }

    let stmt = apply_loop_shapes(stage, dom_map, stmt)?;
    let stmt = apply_loop_order(stage, dom_map, &rebased, &stmt)?;
    apply_loop_annotations(stage, &rebased, &stmt)
}

/// Derives the implicit iteration variables of a freshly authored body:
/// one [`IterVar`] per loop node, outermost first, with the domain taken
/// from the loop bounds and the iteration kind recovered from the loop
/// kind. Used to seed a schedulable unit's axis list at construction time.
pub fn gather_loop_vars(stmt: &Rc<Stmt>) -> Vec<IterVar> {
    let mut vars = Vec::new();
    post_order_visit(stmt, &mut |s| {
        if let Stmt::For { loop_var, min, extent, kind, .. } = &**s {
            let dom = Range::by_min_extent(min.clone(), extent.clone());
            vars.push(IterVar::new(Some(dom), loop_var.clone(), kind.iter_type()));
        }
    });
    vars.reverse();
    vars
}
