//! Fundamental type tags shared across the IR.

use std::fmt;

/// Iteration kind of a loop variable.
///
/// The kind is declared when the variable is created and drives the default
/// lowering of its loop (see [`IterType::for_kind`]). Scheduling transforms
/// never mutate a kind in place; split/fuse/rebase create fresh variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterType {
    /// Data-parallel iteration with no cross-iteration dependency.
    DataPar,
    /// Bound to a hardware thread index at lowering time.
    ThreadIndex,
    /// Commutative reduction axis.
    CommReduce,
    /// Serial axis whose iteration order must be preserved.
    Ordered,
    /// Opaque to scheduling transforms.
    Opaque,
    /// Marker: the loop is to be fully unrolled.
    Unrolled,
    /// Marker: the loop is to be vectorized.
    Vectorized,
    /// Marker: the loop is to run on parallel worker threads.
    Parallelized,
}

/// Lowered kind of a `For` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
}

impl IterType {
    /// The `For` kind a loop of this iteration kind lowers to.
    pub fn for_kind(self) -> ForKind {
        match self {
            IterType::Unrolled => ForKind::Unrolled,
            IterType::Vectorized => ForKind::Vectorized,
            IterType::Parallelized => ForKind::Parallel,
            _ => ForKind::Serial,
        }
    }
}

impl ForKind {
    /// The iteration kind recovered from an existing loop statement.
    pub fn iter_type(self) -> IterType {
        match self {
            ForKind::Serial => IterType::DataPar,
            ForKind::Parallel => IterType::Parallelized,
            ForKind::Vectorized => IterType::Vectorized,
            ForKind::Unrolled => IterType::Unrolled,
        }
    }
}

impl fmt::Display for ForKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ForKind::Serial => "serial",
            ForKind::Parallel => "parallel",
            ForKind::Vectorized => "vectorized",
            ForKind::Unrolled => "unrolled",
        };
        f.write_str(s)
    }
}

/// Binary operators of the expression language.
///
/// `FloorDiv`/`FloorMod` are the index-arithmetic pair used by split and
/// fuse rewrites; `Lt` appears in split guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    FloorMod,
    Lt,
}

/// Element type of a tensor or buffer.
///
/// Loop-nest rewriting is type-agnostic; the tag only travels with tensor
/// and buffer handles so that downstream consumers keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int32,
    Float16,
    Float32,
    Float64,
    Handle,
}
