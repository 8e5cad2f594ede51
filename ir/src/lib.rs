//! Statement-tree IR for the ravel loop-nest scheduling engine.
//!
//! This crate defines the immutable statement tree that the schedule passes
//! rewrite, together with the expression language used for loop bounds,
//! guards, and tensor indexing.
//!
//! # Module Organization
//!
//! - [`types`] - Fundamental type tags (iteration kinds, for kinds, element types)
//! - [`var`] - Symbolic variables with stable identity
//! - [`expr`] - Expression nodes and folding constructors
//! - [`itervar`] - Loop variables with domains and iteration kinds
//! - [`tensor`] - Tensor and buffer handles, access regions
//! - [`stmt`] - The closed statement enum (loops, scoped attributes, provides)
//! - [`substitute`] - Variable substitution over expressions and statements
//! - [`visit`] - Post-order traversal and child-mutation helpers
//! - [`fmt`] - Indented tree printing
//!
//! Trees are built from `Rc`-shared nodes and every rewrite produces a new
//! tree; passes detect untouched subtrees via `Rc::ptr_eq` and reuse them.

pub mod expr;
pub mod fmt;
pub mod itervar;
pub mod stmt;
pub mod substitute;
pub mod tensor;
pub mod types;
pub mod var;
pub mod visit;

#[cfg(test)]
mod test;

pub use expr::{Expr, Indices};
pub use itervar::{IterVar, Range};
pub use stmt::{AttrKey, AttrNode, PRAGMA_SCOPE_PREFIX, Stmt};
pub use substitute::{VarMap, substitute_expr, substitute_stmt};
pub use tensor::{Buffer, Region, Shape, Tensor};
pub use types::{BinOp, DType, ForKind, IterType};
pub use var::Var;
pub use visit::{mutate_children, post_order_visit, try_mutate_children};
