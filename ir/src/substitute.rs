//! Variable substitution over expressions and statements.
//!
//! Replaces every free use of a mapped variable with its replacement
//! expression. Binding occurrences (`For::loop_var`) are left untouched.
//! Untouched subtrees are returned as the same `Rc`, so callers can detect
//! no-ops with `Rc::ptr_eq`.
//!
//! Substitution recurses into scoped-attribute values as well as loop
//! bounds, conditional predicates, provide values/indices, and realize
//! bounds: a mapping that skipped attribute values would silently corrupt
//! the buffer-bind regions travelling with a rewritten loop.

use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::Expr;
use crate::itervar::Range;
use crate::stmt::Stmt;
use crate::var::Var;

/// Mapping from variable to replacement expression.
pub type VarMap = HashMap<Var, Rc<Expr>>;

pub fn substitute_expr(expr: &Rc<Expr>, vmap: &VarMap) -> Rc<Expr> {
    match &**expr {
        Expr::Var(v) => match vmap.get(v) {
            Some(replacement) => replacement.clone(),
            None => expr.clone(),
        },
        Expr::Int(_) => expr.clone(),
        Expr::Binary(op, lhs, rhs) => {
            let new_lhs = substitute_expr(lhs, vmap);
            let new_rhs = substitute_expr(rhs, vmap);
            if Rc::ptr_eq(&new_lhs, lhs) && Rc::ptr_eq(&new_rhs, rhs) {
                expr.clone()
            } else {
                Rc::new(Expr::Binary(*op, new_lhs, new_rhs))
            }
        }
        Expr::Likely(cond) => {
            let new_cond = substitute_expr(cond, vmap);
            if Rc::ptr_eq(&new_cond, cond) { expr.clone() } else { Rc::new(Expr::Likely(new_cond)) }
        }
        Expr::Read { tensor, indices } => {
            let new_indices: crate::expr::Indices = indices.iter().map(|i| substitute_expr(i, vmap)).collect();
            if new_indices.iter().zip(indices).all(|(n, o)| Rc::ptr_eq(n, o)) {
                expr.clone()
            } else {
                Rc::new(Expr::Read { tensor: tensor.clone(), indices: new_indices })
            }
        }
        Expr::Tuple(values) => {
            let new_values: Vec<_> = values.iter().map(|v| substitute_expr(v, vmap)).collect();
            if new_values.iter().zip(values).all(|(n, o)| Rc::ptr_eq(n, o)) {
                expr.clone()
            } else {
                Rc::new(Expr::Tuple(new_values))
            }
        }
    }
}

fn substitute_range(range: &Range, vmap: &VarMap) -> Range {
    Range { min: substitute_expr(&range.min, vmap), extent: substitute_expr(&range.extent, vmap) }
}

pub fn substitute_stmt(stmt: &Rc<Stmt>, vmap: &VarMap) -> Rc<Stmt> {
    match &**stmt {
        Stmt::For { loop_var, min, extent, kind, body } => {
            let new_min = substitute_expr(min, vmap);
            let new_extent = substitute_expr(extent, vmap);
            let new_body = substitute_stmt(body, vmap);
            if Rc::ptr_eq(&new_min, min) && Rc::ptr_eq(&new_extent, extent) && Rc::ptr_eq(&new_body, body) {
                stmt.clone()
            } else {
                Stmt::loop_(loop_var, new_min, new_extent, *kind, new_body)
            }
        }
        Stmt::Attr { node, key, value, body } => {
            let new_value = substitute_expr(value, vmap);
            let new_body = substitute_stmt(body, vmap);
            if Rc::ptr_eq(&new_value, value) && Rc::ptr_eq(&new_body, body) {
                stmt.clone()
            } else {
                Stmt::attr(node.clone(), key.clone(), new_value, new_body)
            }
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            let new_cond = substitute_expr(cond, vmap);
            let new_then = substitute_stmt(then_case, vmap);
            let new_else = else_case.as_ref().map(|e| substitute_stmt(e, vmap));
            let unchanged = Rc::ptr_eq(&new_cond, cond)
                && Rc::ptr_eq(&new_then, then_case)
                && match (&new_else, else_case) {
                    (Some(n), Some(o)) => Rc::ptr_eq(n, o),
                    (None, None) => true,
                    _ => false,
                };
            if unchanged {
                stmt.clone()
            } else {
                Rc::new(Stmt::IfThenElse { cond: new_cond, then_case: new_then, else_case: new_else })
            }
        }
        Stmt::Provide { tensor, value, indices } => {
            let new_value = substitute_expr(value, vmap);
            let new_indices: crate::expr::Indices = indices.iter().map(|i| substitute_expr(i, vmap)).collect();
            if Rc::ptr_eq(&new_value, value) && new_indices.iter().zip(indices).all(|(n, o)| Rc::ptr_eq(n, o)) {
                stmt.clone()
            } else {
                Rc::new(Stmt::Provide { tensor: tensor.clone(), value: new_value, indices: new_indices })
            }
        }
        Stmt::Realize { tensor, bounds, body } => {
            let new_bounds: Vec<_> = bounds.iter().map(|r| substitute_range(r, vmap)).collect();
            let new_body = substitute_stmt(body, vmap);
            let bounds_unchanged = new_bounds
                .iter()
                .zip(bounds)
                .all(|(n, o)| Rc::ptr_eq(&n.min, &o.min) && Rc::ptr_eq(&n.extent, &o.extent));
            if bounds_unchanged && Rc::ptr_eq(&new_body, body) {
                stmt.clone()
            } else {
                Stmt::realize(tensor.clone(), new_bounds, new_body)
            }
        }
        Stmt::Block(stmts) => {
            let new_stmts: Vec<_> = stmts.iter().map(|s| substitute_stmt(s, vmap)).collect();
            if new_stmts.iter().zip(stmts).all(|(n, o)| Rc::ptr_eq(n, o)) {
                stmt.clone()
            } else {
                Stmt::block(new_stmts)
            }
        }
    }
}
