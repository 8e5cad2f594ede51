//! Tensor identity replacement in reads and provides.
//!
//! A schedulable unit's body is authored against its own logical output
//! tensors; once the unit joins the operation graph, readers must see the
//! graph-bound identities instead. These two replacers rewrite the write
//! sites (provide targets) and the read sites (element reads, realize
//! targets) against an explicit mapping. Both are purely structural: a
//! body that never writes a declared output is left for later validation
//! to surface.

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{Expr, Indices, Stmt, Tensor, mutate_children};

/// Rewrites every provide (write) whose target tensor is mapped.
///
/// Returns the rewritten tree and whether any write site was replaced;
/// when nothing matched the original tree is returned untouched.
pub fn replace_provide_tensor(stmt: &Rc<Stmt>, replace: &HashMap<Tensor, Tensor>) -> (Rc<Stmt>, bool) {
    let mut found = false;
    let out = rewrite_provides(stmt, replace, &mut found);
    if found { (out, true) } else { (stmt.clone(), false) }
}

fn rewrite_provides(stmt: &Rc<Stmt>, replace: &HashMap<Tensor, Tensor>, found: &mut bool) -> Rc<Stmt> {
    if let Stmt::Provide { tensor, value, indices } = &**stmt {
        if let Some(mapped) = replace.get(tensor) {
            *found = true;
            return Stmt::provide(mapped.clone(), value.clone(), indices.iter().cloned());
        }
        return stmt.clone();
    }
    mutate_children(stmt, &mut |child| rewrite_provides(child, replace, found))
}

/// Rewrites every read reference to a mapped tensor: element reads inside
/// expressions and realize targets. The parallel replacer to
/// [`replace_provide_tensor`], also used by the operation-graph machinery
/// when inputs are substituted during graph rewriting.
pub fn replace_tensor(stmt: &Rc<Stmt>, replace: &HashMap<Tensor, Tensor>) -> Rc<Stmt> {
    match &**stmt {
        Stmt::Provide { tensor, value, indices } => {
            let new_value = rewrite_expr(value, replace);
            let new_indices: Indices = indices.iter().map(|i| rewrite_expr(i, replace)).collect();
            if Rc::ptr_eq(&new_value, value) && new_indices.iter().zip(indices).all(|(n, o)| Rc::ptr_eq(n, o)) {
                stmt.clone()
            } else {
                Stmt::provide(tensor.clone(), new_value, new_indices)
            }
        }
        Stmt::Realize { tensor, bounds, body } => {
            let new_body = replace_tensor(body, replace);
            match replace.get(tensor) {
                Some(mapped) => Stmt::realize(mapped.clone(), bounds.clone(), new_body),
                None if Rc::ptr_eq(&new_body, body) => stmt.clone(),
                None => Stmt::realize(tensor.clone(), bounds.clone(), new_body),
            }
        }
        Stmt::Attr { node, key, value, body } => {
            let new_value = rewrite_expr(value, replace);
            let new_body = replace_tensor(body, replace);
            if Rc::ptr_eq(&new_value, value) && Rc::ptr_eq(&new_body, body) {
                stmt.clone()
            } else {
                Stmt::attr(node.clone(), key.clone(), new_value, new_body)
            }
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            let new_cond = rewrite_expr(cond, replace);
            let new_then = replace_tensor(then_case, replace);
            let new_else = else_case.as_ref().map(|e| replace_tensor(e, replace));
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
        _ => mutate_children(stmt, &mut |child| replace_tensor(child, replace)),
    }
}

fn rewrite_expr(expr: &Rc<Expr>, replace: &HashMap<Tensor, Tensor>) -> Rc<Expr> {
    match &**expr {
        Expr::Read { tensor, indices } => {
            let new_indices: Indices = indices.iter().map(|i| rewrite_expr(i, replace)).collect();
            let indices_unchanged = new_indices.iter().zip(indices).all(|(n, o)| Rc::ptr_eq(n, o));
            match replace.get(tensor) {
                Some(mapped) => Rc::new(Expr::Read { tensor: mapped.clone(), indices: new_indices }),
                None if indices_unchanged => expr.clone(),
                None => Rc::new(Expr::Read { tensor: tensor.clone(), indices: new_indices }),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let new_lhs = rewrite_expr(lhs, replace);
            let new_rhs = rewrite_expr(rhs, replace);
            if Rc::ptr_eq(&new_lhs, lhs) && Rc::ptr_eq(&new_rhs, rhs) {
                expr.clone()
            } else {
                Rc::new(Expr::Binary(*op, new_lhs, new_rhs))
            }
        }
        Expr::Likely(cond) => {
            let new_cond = rewrite_expr(cond, replace);
            if Rc::ptr_eq(&new_cond, cond) { expr.clone() } else { Rc::new(Expr::Likely(new_cond)) }
        }
        Expr::Tuple(values) => {
            let new_values: Vec<_> = values.iter().map(|v| rewrite_expr(v, replace)).collect();
            if new_values.iter().zip(values).all(|(n, o)| Rc::ptr_eq(n, o)) {
                expr.clone()
            } else {
                Rc::new(Expr::Tuple(new_values))
            }
        }
        Expr::Int(_) | Expr::Var(_) => expr.clone(),
    }
}
