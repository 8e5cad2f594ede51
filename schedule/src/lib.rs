//! Schedule application for the ravel loop-nest engine.
//!
//! Given a statement tree, a per-unit [`Stage`] (ordered relations, desired
//! leaf loop order, per-variable attributes) and a read-only bound map,
//! this crate rewrites the tree so that its loop nesting, bounds, and
//! per-loop attributes match the requested schedule while preserving the
//! exact set of executed index combinations.
//!
//! # Module Organization
//!
//! - [`stage`] - Schedule state: relations, leaf order, attributes
//! - [`split`] - Rewrites one loop into an outer/inner pair
//! - [`fuse`] - Merges nested loops into one, transitively
//! - [`reorder`] - Permutes a loop nest into a required order
//! - [`annotate`] - Thread binding, for-kind overrides, pragmas
//! - [`apply`] - Pass sequencing and loop-variable gathering
//! - [`provide`] - Tensor identity replacement in reads and provides
//! - [`unit`] - Schedulable-unit accessor layer and buffer rebinding
//! - [`error`] - Error types and result handling
//!
//! # Pass order
//!
//! [`apply_schedule`] runs shapes → order → annotations. The order is
//! load-bearing: reorder needs the loop variables created by splits and
//! fuses to exist, and annotation needs the final nesting to attach
//! attributes to the right physical loop.
//!
//! Every pass is a pure function from tree to tree; the first violated
//! invariant aborts the invocation with an [`Error`] and no partially
//! rewritten tree is ever returned.

pub mod annotate;
pub mod apply;
pub mod error;
pub mod fuse;
pub mod provide;
pub mod reorder;
pub mod split;
pub mod stage;
pub mod unit;

#[cfg(test)]
pub mod test;

pub use annotate::apply_loop_annotations;
pub use apply::{apply_loop_shapes, apply_schedule, gather_loop_vars};
pub use error::{Error, Result};
pub use provide::{replace_provide_tensor, replace_tensor};
pub use reorder::apply_loop_order;
pub use stage::{DomMap, IterVarAttr, Relation, Stage};
pub use unit::ScheduleUnit;
