//! Statement traversal and child-mutation helpers.

use std::rc::Rc;

use crate::stmt::Stmt;

/// Visit every statement node in post order (children before parents).
///
/// For a loop nest this yields the innermost loop first and the outermost
/// loop last, which is what order-recovery passes rely on.
pub fn post_order_visit<F: FnMut(&Rc<Stmt>)>(stmt: &Rc<Stmt>, f: &mut F) {
    match &**stmt {
        Stmt::For { body, .. } | Stmt::Attr { body, .. } | Stmt::Realize { body, .. } => post_order_visit(body, f),
        Stmt::IfThenElse { then_case, else_case, .. } => {
            post_order_visit(then_case, f);
            if let Some(else_case) = else_case {
                post_order_visit(else_case, f);
            }
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                post_order_visit(s, f);
            }
        }
        Stmt::Provide { .. } => {}
    }
    f(stmt);
}

/// Rebuild `stmt` with `f` applied to each direct child statement,
/// preserving identity when every child comes back unchanged.
pub fn mutate_children<F: FnMut(&Rc<Stmt>) -> Rc<Stmt>>(stmt: &Rc<Stmt>, f: &mut F) -> Rc<Stmt> {
    // Plain wrapper over the fallible version; the closure cannot fail.
    try_mutate_children::<(), _>(stmt, &mut |s| Ok(f(s))).expect("infallible child mutation")
}

/// Fallible variant of [`mutate_children`]; the first error aborts the
/// rebuild.
pub fn try_mutate_children<E, F>(stmt: &Rc<Stmt>, f: &mut F) -> Result<Rc<Stmt>, E>
where
    F: FnMut(&Rc<Stmt>) -> Result<Rc<Stmt>, E>,
{
    match &**stmt {
        Stmt::For { loop_var, min, extent, kind, body } => {
            let new_body = f(body)?;
            if Rc::ptr_eq(&new_body, body) {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::loop_(loop_var, min.clone(), extent.clone(), *kind, new_body))
            }
        }
        Stmt::Attr { node, key, value, body } => {
            let new_body = f(body)?;
            if Rc::ptr_eq(&new_body, body) {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::attr(node.clone(), key.clone(), value.clone(), new_body))
            }
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            let new_then = f(then_case)?;
            let new_else = match else_case {
                Some(e) => Some(f(e)?),
                None => None,
            };
            let unchanged = Rc::ptr_eq(&new_then, then_case)
                && match (&new_else, else_case) {
                    (Some(n), Some(o)) => Rc::ptr_eq(n, o),
                    (None, None) => true,
                    _ => false,
                };
            if unchanged {
                Ok(stmt.clone())
            } else {
                Ok(Rc::new(Stmt::IfThenElse { cond: cond.clone(), then_case: new_then, else_case: new_else }))
            }
        }
        Stmt::Realize { tensor, bounds, body } => {
            let new_body = f(body)?;
            if Rc::ptr_eq(&new_body, body) {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::realize(tensor.clone(), bounds.clone(), new_body))
            }
        }
        Stmt::Block(stmts) => {
            let mut new_stmts = Vec::with_capacity(stmts.len());
            for s in stmts {
                new_stmts.push(f(s)?);
            }
            if new_stmts.iter().zip(stmts).all(|(n, o)| Rc::ptr_eq(n, o)) {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::block(new_stmts))
            }
        }
        Stmt::Provide { .. } => Ok(stmt.clone()),
    }
}
