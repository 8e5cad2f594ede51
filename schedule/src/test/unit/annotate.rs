use std::collections::HashMap;

use ravel_ir::{AttrKey, AttrNode, Expr, ForKind, IterType, IterVar, Stmt, Var};

use crate::annotate::apply_loop_annotations;
use crate::error::Error;
use crate::stage::{IterVarAttr, Stage};
use crate::test::helpers::*;

fn no_rebase() -> HashMap<IterVar, IterVar> {
    HashMap::new()
}

/// Pragmas wrap the loop in declaration order; the last-declared pragma
/// ends outermost.
#[test]
fn pragma_list_nests_in_declaration_order() {
    let i = iter_var("i", 0, 8);
    let a = tensor("A", &[8]);
    let nest = nest_with_provide(&a, &[(i.var(), 8)]);

    let mut attr = IterVarAttr::default();
    attr.add_pragma("unroll", Expr::int(1));
    attr.add_pragma("vectorize", Expr::int(0));
    let mut stage = Stage::new(vec![i.clone()]);
    stage.set_attr(&i, attr);

    let out = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap();

    let Stmt::Attr { key: outer_key, body, .. } = &*out else { panic!("expected pragma attr, got:\n{out}") };
    assert_eq!(outer_key.to_string(), "pragma_vectorize");
    let Stmt::Attr { node, key: inner_key, body, .. } = &**body else { panic!("expected second pragma attr") };
    assert_eq!(inner_key.to_string(), "pragma_unroll");
    assert_eq!(node, &AttrNode::Var(i.var().clone()));
    assert!(matches!(&**body, Stmt::For { .. }));
}

#[test]
fn thread_binding_replaces_loop_with_attr_scope() {
    let x = iter_var("x", 0, 64);
    let a = tensor("A", &[64]);
    let nest = nest_with_provide(&a, &[(x.var(), 64)]);
    let original = run(&nest);

    let tx = IterVar::thread(Some(range(0, 64)), "threadIdx.x");
    let mut stage = Stage::new(vec![x.clone()]);
    stage.set_attr(&x, IterVarAttr::bind(tx.clone()));

    let out = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap();

    let Stmt::Attr { node, key, value, body } = &*out else { panic!("expected thread_extent attr, got:\n{out}") };
    assert_eq!(node, &AttrNode::IterVar(tx.clone()));
    assert_eq!(*key, AttrKey::ThreadExtent);
    assert_eq!(value.as_const_int(), Some(64));
    // The loop is gone; its body now indexes through the thread var.
    let Stmt::Provide { indices, .. } = &**body else { panic!("expected provide") };
    assert_eq!(indices[0].to_string(), "threadIdx.x");

    // One iteration per thread index: the executed set is unchanged.
    assert_eq!(run(&out), original);
}

#[test]
fn thread_extent_mismatch_is_fatal() {
    let x = iter_var("x", 0, 64);
    let a = tensor("A", &[64]);
    let nest = nest_with_provide(&a, &[(x.var(), 64)]);

    let tx = IterVar::thread(Some(range(0, 32)), "threadIdx.x");
    let mut stage = Stage::new(vec![x.clone()]);
    stage.set_attr(&x, IterVarAttr::bind(tx));

    let err = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap_err();
    assert!(matches!(err, Error::ThreadExtentMismatch { .. }), "got {err:?}");
}

#[test]
fn for_kind_override_rebuilds_loop() {
    let i = iter_var("i", 0, 8);
    let a = tensor("A", &[8]);
    let nest = nest_with_provide(&a, &[(i.var(), 8)]);

    let mut stage = Stage::new(vec![i.clone()]);
    stage.set_attr(&i, IterVarAttr::with_iter_type(IterType::Unrolled));

    let out = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap();
    let Stmt::For { kind, min, extent, .. } = &*out else { panic!("expected loop") };
    assert_eq!(*kind, ForKind::Unrolled);
    assert_eq!(min.as_const_int(), Some(0));
    assert_eq!(extent.as_const_int(), Some(8));
}

#[test]
fn unannotated_matching_loop_is_untouched() {
    let i = iter_var("i", 0, 8);
    let a = tensor("A", &[8]);
    let nest = nest_with_provide(&a, &[(i.var(), 8)]);

    let stage = Stage::new(vec![i.clone()]);
    let out = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap();
    assert!(std::rc::Rc::ptr_eq(&out, &nest));
}

#[test]
fn duplicated_loop_variable_is_fatal() {
    let i = iter_var("i", 0, 4);
    let a = tensor("A", &[4]);
    // The same variable driving two loops is malformed by construction.
    let inner = nest_with_provide(&a, &[(i.var(), 4)]);
    let nest = Stmt::loop_(i.var(), Expr::int(0), Expr::int(4), ForKind::Serial, inner);

    let stage = Stage::new(vec![i.clone()]);
    let err = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap_err();
    assert_eq!(err, Error::LoopMultiplicity { var: "i".into(), found: 2 });
}

#[test]
fn missing_loop_variable_is_fatal() {
    let i = iter_var("i", 0, 4);
    let ghost = iter_var("ghost", 0, 4);
    let a = tensor("A", &[4]);
    let nest = nest_with_provide(&a, &[(i.var(), 4)]);

    let stage = Stage::new(vec![ghost.clone()]);
    let err = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap_err();
    assert_eq!(err, Error::LoopMultiplicity { var: "ghost".into(), found: 0 });
}

#[test]
fn pragma_arity_mismatch_is_fatal() {
    let i = iter_var("i", 0, 8);
    let a = tensor("A", &[8]);
    let nest = nest_with_provide(&a, &[(i.var(), 8)]);

    let mut attr = IterVarAttr::default();
    attr.pragma_keys.push("unroll".into());
    let mut stage = Stage::new(vec![i.clone()]);
    stage.set_attr(&i, attr);

    let err = apply_loop_annotations(&stage, &no_rebase(), &nest).unwrap_err();
    assert_eq!(err, Error::PragmaArity { keys: 1, values: 0 });
}

/// A rebased leaf variable resolves to its parent, the variable actually
/// present in the tree.
#[test]
fn rebase_alias_resolves_to_tree_variable() {
    let i = IterVar::new(Some(range(0, 8)), Var::new("i"), IterType::DataPar);
    let rebased = IterVar::new(Some(range(0, 8)), Var::new("i.rb"), IterType::DataPar);
    let a = tensor("A", &[8]);
    let nest = nest_with_provide(&a, &[(i.var(), 8)]);

    let mut stage = Stage::new(vec![rebased.clone()]);
    stage.set_attr(&rebased, IterVarAttr::with_iter_type(IterType::Unrolled));
    let aliases = HashMap::from([(rebased.clone(), i.clone())]);

    let out = apply_loop_annotations(&stage, &aliases, &nest).unwrap();
    let Stmt::For { loop_var, kind, .. } = &*out else { panic!("expected loop") };
    assert_eq!(loop_var, i.var());
    assert_eq!(*kind, ForKind::Unrolled);
}
