//! Loop fusing: merge nested loops into a single one.

use std::rc::Rc;

use ravel_ir::{AttrKey, Expr, IterVar, Stmt, Var, VarMap, substitute_expr, substitute_stmt, try_mutate_children};

use crate::error::*;

/// Applies one `Fuse(outer, inner, fused)` relation.
///
/// The fused variable ranges over `[0, extent(outer) * extent(inner))`,
/// where the inner extent accumulates across any intermediate loops
/// between the two levels: a 3+-level transitive fuse needs the running
/// product of every skipped level. Uses rewrite to the mixed-radix
/// decomposition
///
/// ```text
/// inner   -> fused mod extent(inner)
/// mid     -> (fused floordiv below) mod extent(mid)
/// outer   -> fused floordiv below
/// ```
///
/// so the fused loop visits exactly the original combinations in the
/// original order. Intermediate levels must be perfectly nested loops;
/// a conditional between the fused levels never matches and the relation
/// fails with [`Error::FuseScope`].
pub fn fuse_loops(outer: &IterVar, inner: &IterVar, fused: &IterVar, stmt: &Rc<Stmt>) -> Result<Rc<Stmt>> {
    let mut fuser = LoopFuser::new(outer, inner, fused);
    let out = fuser.rewrite(stmt)?;
    if !fuser.fused_flag {
        return LoopNotFoundSnafu { var: outer.var().name() }.fail();
    }
    Ok(out)
}

struct LoopFuser {
    outer: Var,
    inner: Var,
    fused: IterVar,
    under_outer: bool,
    /// Running product of the extents below the level currently being
    /// unwound; set when the inner loop is reached.
    extent: Rc<Expr>,
    /// Extent recorded at the inner loop itself, for buffer-bind values.
    inner_extent: Rc<Expr>,
    fused_flag: bool,
}

impl LoopFuser {
    fn new(outer: &IterVar, inner: &IterVar, fused: &IterVar) -> Self {
        Self {
            outer: outer.var().clone(),
            inner: inner.var().clone(),
            fused: fused.clone(),
            under_outer: false,
            // Placeholders until the inner loop is seen.
            extent: Expr::int(1),
            inner_extent: Expr::int(1),
            fused_flag: false,
        }
    }

    fn rewrite(&mut self, stmt: &Rc<Stmt>) -> Result<Rc<Stmt>> {
        match &**stmt {
            Stmt::For { loop_var, extent, body, .. } if *loop_var == self.inner => {
                if !self.under_outer {
                    return FuseScopeSnafu { inner: self.inner.name(), outer: self.outer.name() }.fail();
                }
                let rmap =
                    VarMap::from([(loop_var.clone(), Expr::floormod(Expr::var(self.fused.var()), extent.clone()))]);
                self.extent = extent.clone();
                self.inner_extent = extent.clone();
                self.fused_flag = true;
                Ok(substitute_stmt(body, &rmap))
            }
            Stmt::For { loop_var, extent, kind, body, .. } if *loop_var == self.outer => {
                self.under_outer = true;
                let body = self.rewrite(body)?;
                self.under_outer = false;
                if !self.fused_flag {
                    return FuseScopeSnafu { inner: self.inner.name(), outer: self.outer.name() }.fail();
                }
                let rmap = VarMap::from([(
                    loop_var.clone(),
                    Expr::floordiv(Expr::var(self.fused.var()), self.extent.clone()),
                )]);
                let body = substitute_stmt(&body, &rmap);
                Ok(Stmt::loop_(
                    self.fused.var(),
                    Expr::int(0),
                    Expr::mul(self.extent.clone(), extent.clone()),
                    *kind,
                    body,
                ))
            }
            Stmt::For { loop_var, extent, body, .. } if self.under_outer => {
                // Intermediate level of a transitive fuse: unwind from the
                // inside out, folding this extent into the running product.
                let body = self.rewrite(body)?;
                let rmap = VarMap::from([(
                    loop_var.clone(),
                    Expr::floormod(
                        Expr::floordiv(Expr::var(self.fused.var()), self.extent.clone()),
                        extent.clone(),
                    ),
                )]);
                let body = substitute_stmt(&body, &rmap);
                self.extent = Expr::mul(self.extent.clone(), extent.clone());
                Ok(body)
            }
            Stmt::Attr { node, key: AttrKey::BufferBindScope, value, body } => {
                let new_body = self.rewrite(body)?;
                let rmap = VarMap::from([
                    (self.inner.clone(), Expr::floormod(Expr::var(self.fused.var()), self.inner_extent.clone())),
                    (self.outer.clone(), Expr::floordiv(Expr::var(self.fused.var()), self.extent.clone())),
                ]);
                let new_value = substitute_expr(value, &rmap);
                if Rc::ptr_eq(&new_value, value) && Rc::ptr_eq(&new_body, body) {
                    Ok(stmt.clone())
                } else {
                    Ok(Stmt::attr(node.clone(), AttrKey::BufferBindScope, new_value, new_body))
                }
            }
            _ => try_mutate_children(stmt, &mut |child| self.rewrite(child)),
        }
    }
}
