use std::rc::Rc;

use crate::{DType, Expr, ForKind, Stmt, Tensor, Var, mutate_children, post_order_visit};

#[test]
fn loops_are_visited_innermost_first() {
    let i = Var::new("i");
    let j = Var::new("j");
    let k = Var::new("k");
    let a = Tensor::new("A", [Expr::int(2)], DType::Float32);
    let body = Stmt::provide(a, Expr::int(0), [Expr::var(&k)]);
    let nest = Stmt::loop_(
        &i,
        Expr::int(0),
        Expr::int(2),
        ForKind::Serial,
        Stmt::loop_(
            &j,
            Expr::int(0),
            Expr::int(3),
            ForKind::Serial,
            Stmt::loop_(&k, Expr::int(0), Expr::int(4), ForKind::Serial, body),
        ),
    );

    let mut order = Vec::new();
    post_order_visit(&nest, &mut |s| {
        if let Stmt::For { loop_var, .. } = &**s {
            order.push(loop_var.clone());
        }
    });
    assert_eq!(order, vec![k, j, i]);
}

#[test]
fn mutate_children_preserves_identity_on_noop() {
    let i = Var::new("i");
    let a = Tensor::new("A", [Expr::int(2)], DType::Float32);
    let body = Stmt::provide(a, Expr::int(0), [Expr::var(&i)]);
    let nest = Stmt::loop_(&i, Expr::int(0), Expr::int(2), ForKind::Serial, body);

    let out = mutate_children(&nest, &mut |child| child.clone());
    assert!(Rc::ptr_eq(&out, &nest));
}
