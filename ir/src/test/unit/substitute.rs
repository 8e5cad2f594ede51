use std::rc::Rc;

use crate::{AttrKey, AttrNode, DType, Expr, ForKind, Stmt, Tensor, Var, VarMap, substitute_stmt};

fn simple_nest(i: &Var, j: &Var, tensor: &Tensor) -> Rc<Stmt> {
    let body = Stmt::provide(tensor.clone(), Expr::int(0), [Expr::var(i), Expr::var(j)]);
    let inner = Stmt::loop_(j, Expr::int(0), Expr::int(8), ForKind::Serial, body);
    Stmt::loop_(i, Expr::int(0), Expr::int(4), ForKind::Serial, inner)
}

#[test]
fn replaces_uses_in_provide_indices() {
    let i = Var::new("i");
    let j = Var::new("j");
    let a = Tensor::new("A", [Expr::int(4), Expr::int(8)], DType::Float32);
    let nest = simple_nest(&i, &j, &a);

    let fused = Var::new("fused");
    let vmap = VarMap::from([(i.clone(), Expr::floordiv(Expr::var(&fused), Expr::int(8)))]);
    let out = substitute_stmt(&nest, &vmap);

    let mut seen = false;
    crate::post_order_visit(&out, &mut |s| {
        if let Stmt::Provide { indices, .. } = &**s {
            seen = true;
            assert_eq!(indices[0].to_string(), "floordiv(fused, 8)");
            assert_eq!(indices[1].to_string(), "j");
        }
    });
    assert!(seen);
}

#[test]
fn unmapped_tree_returns_same_rc() {
    let i = Var::new("i");
    let j = Var::new("j");
    let a = Tensor::new("A", [Expr::int(4), Expr::int(8)], DType::Float32);
    let nest = simple_nest(&i, &j, &a);

    let unrelated = Var::new("k");
    let vmap = VarMap::from([(unrelated, Expr::int(0))]);
    let out = substitute_stmt(&nest, &vmap);
    assert!(Rc::ptr_eq(&out, &nest));
}

#[test]
fn reaches_attr_values() {
    let i = Var::new("i");
    let a = Tensor::new("A", [Expr::int(4)], DType::Float32);
    let body = Stmt::provide(a.clone(), Expr::int(0), [Expr::var(&i)]);
    let wrapped = Stmt::attr(
        AttrNode::Var(i.clone()),
        AttrKey::Pragma("stride".into()),
        Expr::mul(Expr::var(&i), Expr::int(2)),
        body,
    );

    let vmap = VarMap::from([(i.clone(), Expr::int(3))]);
    let out = substitute_stmt(&wrapped, &vmap);
    let Stmt::Attr { value, .. } = &*out else { panic!("expected attr") };
    // Substitution is structural; it does not re-fold the product.
    assert_eq!(value.to_string(), "(3*2)");
}

#[test]
fn binding_occurrence_is_not_rewritten() {
    let i = Var::new("i");
    let a = Tensor::new("A", [Expr::int(4)], DType::Float32);
    let body = Stmt::provide(a.clone(), Expr::int(0), [Expr::var(&i)]);
    let nest = Stmt::loop_(&i, Expr::int(0), Expr::int(4), ForKind::Serial, body);

    let vmap = VarMap::from([(i.clone(), Expr::int(9))]);
    let out = substitute_stmt(&nest, &vmap);
    let Stmt::For { loop_var, body, .. } = &*out else { panic!("expected loop") };
    assert_eq!(*loop_var, i);
    let Stmt::Provide { indices, .. } = &**body else { panic!("expected provide") };
    assert_eq!(indices[0].as_const_int(), Some(9));
}
