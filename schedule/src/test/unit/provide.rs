use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{AttrKey, AttrNode, Expr, ForKind, Stmt, Tensor, Var};

use crate::provide::{replace_provide_tensor, replace_tensor};
use crate::stage::Stage;
use crate::test::helpers::*;
use crate::unit::ScheduleUnit;

/// `out(i) = in(i) + 1` authored against the unit's own tensor handles.
fn authored_body(i: &Var, input: &Tensor, output: &Tensor) -> Rc<Stmt> {
    let value = Expr::add(Expr::read(input.clone(), [Expr::var(i)]), Expr::int(1));
    let provide = Stmt::provide(output.clone(), value, [Expr::var(i)]);
    Stmt::loop_(i, Expr::int(0), Expr::int(16), ForKind::Serial, provide)
}

#[test]
fn rewrites_provide_targets_and_reports_found() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let logical = tensor("out_local", &[16]);
    let graph = tensor("out", &[16]);
    let body = authored_body(&i, &input, &logical);

    let rmap = HashMap::from([(logical.clone(), graph.clone())]);
    let (out, found) = replace_provide_tensor(&body, &rmap);
    assert!(found);

    let mut target = None;
    ravel_ir::post_order_visit(&out, &mut |s| {
        if let Stmt::Provide { tensor, .. } = &**s {
            target = Some(tensor.clone());
        }
    });
    assert_eq!(target, Some(graph));
}

#[test]
fn unmatched_provide_map_returns_original_tree() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let logical = tensor("out_local", &[16]);
    let body = authored_body(&i, &input, &logical);

    let unrelated = HashMap::from([(tensor("other", &[4]), tensor("other2", &[4]))]);
    let (out, found) = replace_provide_tensor(&body, &unrelated);
    assert!(!found);
    assert!(Rc::ptr_eq(&out, &body));
}

#[test]
fn replace_tensor_rewrites_reads_not_writes() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let replacement = tensor("in_cached", &[16]);
    let logical = tensor("out_local", &[16]);
    let body = authored_body(&i, &input, &logical);

    let rmap = HashMap::from([(input.clone(), replacement.clone())]);
    let out = replace_tensor(&body, &rmap);

    let mut read = None;
    let mut write = None;
    ravel_ir::post_order_visit(&out, &mut |s| {
        if let Stmt::Provide { tensor, value, .. } = &**s {
            write = Some(tensor.clone());
            if let Expr::Binary(_, lhs, _) = &**value {
                if let Expr::Read { tensor, .. } = &**lhs {
                    read = Some(tensor.clone());
                }
            }
        }
    });
    assert_eq!(read, Some(replacement));
    assert_eq!(write, Some(logical));
}

/// The rebinder wraps the body in bind scopes with inputs outermost, then
/// outputs, then the extern marker, and rewrites both reads and provides
/// of the logical output to the graph-bound identity.
#[test]
fn build_provide_binds_and_rebinds() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let logical = tensor("out_local", &[16]);
    let graph = tensor("out", &[16]);
    let body = authored_body(&i, &input, &logical);

    let unit = ScheduleUnit::new("offset_by_one", vec![input.clone()], vec![logical.clone()], body);
    assert_eq!(unit.num_outputs(), 1);
    assert_eq!(unit.root_iter_vars().len(), 1);

    let stage = Stage::new(unit.root_iter_vars().to_vec());
    let out = unit.build_provide(&[graph.clone()], &stage, &dom_map(&[])).unwrap();

    // Input bind is outermost and defaults to the full declared shape.
    let Stmt::Attr { node, key, value, body } = &*out else { panic!("expected input bind, got:\n{out}") };
    let AttrNode::BufferBind { tensor, .. } = node else { panic!("expected buffer bind target") };
    assert_eq!(tensor, &input);
    assert_eq!(*key, AttrKey::BufferBindScope);
    assert_eq!(value.to_string(), "tuple(0, 16)");

    // Then the output bind, against the graph-bound tensor.
    let Stmt::Attr { node, key, body, .. } = &**body else { panic!("expected output bind") };
    let AttrNode::BufferBind { tensor, .. } = node else { panic!("expected buffer bind target") };
    assert_eq!(tensor, &graph);
    assert_eq!(*key, AttrKey::BufferBindScope);

    // Then the extern marker around the rewritten body.
    let Stmt::Attr { key, body, .. } = &**body else { panic!("expected extern scope") };
    assert_eq!(*key, AttrKey::ExternScope);

    let mut provide_target = None;
    ravel_ir::post_order_visit(body, &mut |s| {
        if let Stmt::Provide { tensor, .. } = &**s {
            provide_target = Some(tensor.clone());
        }
    });
    assert_eq!(provide_target, Some(graph));
}

#[test]
fn build_provide_uses_declared_regions() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let logical = tensor("out_local", &[16]);
    let graph = tensor("out", &[16]);
    let body = authored_body(&i, &input, &logical);

    let mut unit = ScheduleUnit::new("offset_by_one", vec![input.clone()], vec![logical.clone()], body);
    let backing = ravel_ir::Buffer::new("in_window", [Expr::int(32)], input.dtype());
    unit.bind_input(&input, backing, vec![range(8, 16)]);

    let stage = Stage::new(unit.root_iter_vars().to_vec());
    let out = unit.build_provide(&[graph], &stage, &dom_map(&[])).unwrap();

    let Stmt::Attr { node, value, .. } = &*out else { panic!("expected input bind") };
    let AttrNode::BufferBind { buffer, .. } = node else { panic!("expected buffer bind target") };
    assert_eq!(buffer.name(), "in_window");
    assert_eq!(value.to_string(), "tuple(8, 16)");
}

#[test]
fn replace_inputs_rewrites_body_and_input_list() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let replacement = tensor("in_fused", &[16]);
    let logical = tensor("out_local", &[16]);
    let body = authored_body(&i, &input, &logical);

    let unit = ScheduleUnit::new("offset_by_one", vec![input.clone()], vec![logical.clone()], body);
    let rmap = HashMap::from([(input.clone(), replacement.clone())]);
    let replaced = unit.replace_inputs(&rmap);
    assert_eq!(replaced.input_tensors(), [replacement.clone()]);

    let mut read = None;
    ravel_ir::post_order_visit(&replaced.body, &mut |s| {
        if let Stmt::Provide { value, .. } = &**s {
            if let Expr::Binary(_, lhs, _) = &**value {
                if let Expr::Read { tensor, .. } = &**lhs {
                    read = Some(tensor.clone());
                }
            }
        }
    });
    assert_eq!(read, Some(replacement));
}

#[test]
fn build_realize_wraps_each_output() {
    let i = Var::new("i");
    let input = tensor("in", &[16]);
    let logical = tensor("out_local", &[16]);
    let graph = tensor("out", &[16]);
    let body = authored_body(&i, &input, &logical);

    let unit = ScheduleUnit::new("offset_by_one", vec![input], vec![logical], body.clone());
    let wrapped = unit.build_realize(&[graph.clone()], &body);

    let Stmt::Realize { tensor, bounds, .. } = &*wrapped else { panic!("expected realize") };
    assert_eq!(tensor, &graph);
    assert_eq!(bounds.len(), 1);
    assert_eq!(bounds[0].min.as_const_int(), Some(0));
    assert_eq!(bounds[0].extent.as_const_int(), Some(16));
}
