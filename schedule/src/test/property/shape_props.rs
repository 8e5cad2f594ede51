//! Property tests for split/fuse correctness laws.

use proptest::prelude::*;

use ravel_ir::{Expr, Var};

use crate::apply::apply_schedule;
use crate::fuse::fuse_loops;
use crate::split::split_loop;
use crate::stage::{Relation, Stage};
use crate::test::helpers::*;

proptest! {
    /// Splitting any `[0, extent)` loop by any factor preserves the
    /// executed index sequence exactly, guard or no guard.
    #[test]
    fn split_preserves_trace(extent in 1i64..64, factor in 1i64..17) {
        let i = Var::new("i");
        let a = tensor("A", &[extent]);
        let nest = nest_with_provide(&a, &[(&i, extent)]);
        let original = run(&nest);

        let outer_extent = (extent + factor - 1) / factor;
        let parent = free_iter_var(&i);
        let outer = iter_var("i.outer", 0, outer_extent);
        let inner = iter_var("i.inner", 0, factor);
        let dom = dom_map(&[(&outer, 0, outer_extent), (&inner, 0, factor)]);

        let out = split_loop(&parent, &outer, &inner, &Expr::int(factor), &dom, &nest).unwrap();
        prop_assert_eq!(run(&out), original);
    }

    /// Fusing a 2- or 3-deep nest preserves the executed index sequence.
    #[test]
    fn fuse_preserves_trace(extents in proptest::collection::vec(1i64..6, 2..=3)) {
        let vars: Vec<_> = (0..extents.len()).map(|k| Var::new(format!("x{k}"))).collect();
        let a = tensor("A", &vec![8; extents.len()]);
        let levels: Vec<_> = vars.iter().zip(&extents).map(|(v, e)| (v, *e)).collect();
        let nest = nest_with_provide(&a, &levels);
        let original = run(&nest);

        let product: i64 = extents.iter().product();
        let fused = iter_var("fused", 0, product);
        let outer = free_iter_var(&vars[0]);
        let inner = free_iter_var(vars.last().unwrap());
        let out = fuse_loops(&outer, &inner, &fused, &nest).unwrap();
        prop_assert_eq!(run(&out), original);
    }

    /// Fusing the outer/inner pair produced by a divisible split recovers
    /// a loop equivalent to the original: same indices, same order.
    #[test]
    fn split_then_fuse_recovers_original(factor in 1i64..12, chunks in 1i64..12) {
        let extent = factor * chunks;
        let i = Var::new("i");
        let a = tensor("A", &[extent]);
        let nest = nest_with_provide(&a, &[(&i, extent)]);
        let original = run(&nest);

        let parent = free_iter_var(&i);
        let outer = iter_var("i.outer", 0, chunks);
        let inner = iter_var("i.inner", 0, factor);
        let fused = iter_var("i.fused", 0, extent);
        let dom = dom_map(&[(&outer, 0, chunks), (&inner, 0, factor), (&fused, 0, extent)]);

        let mut stage = Stage::new(vec![fused.clone()]);
        stage.add_relation(Relation::Split {
            parent: parent.clone(),
            outer: outer.clone(),
            inner: inner.clone(),
            factor: Expr::int(factor),
        });
        stage.add_relation(Relation::Fuse { outer, inner, fused });

        let out = apply_schedule(&stage, &dom, &nest).unwrap();
        prop_assert_eq!(run(&out), original);
    }
}
