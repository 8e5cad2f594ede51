//! Tensor and buffer handles.
//!
//! Tensors are the logical values flowing through the operation graph;
//! buffers are their physical backing declared by the surrounding
//! allocation. Both are cheap id-identified handles: the rebinder maps
//! logical tensors to graph-bound tensors by identity, never by name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::expr::Expr;
use crate::itervar::Range;
use crate::types::DType;
use crate::var::fresh_id;

/// Shape expression list; most tensors are rank four or below.
pub type Shape = SmallVec<[Rc<Expr>; 4]>;

/// Per-dimension sub-range of a buffer that an access may touch.
pub type Region = Vec<Range>;

/// Logical tensor handle.
#[derive(Clone)]
pub struct Tensor {
    node: Rc<TensorNode>,
}

#[derive(Debug)]
struct TensorNode {
    id: u64,
    name: String,
    shape: Shape,
    dtype: DType,
}

impl Tensor {
    pub fn new(name: impl Into<String>, shape: impl IntoIterator<Item = Rc<Expr>>, dtype: DType) -> Self {
        Self {
            node: Rc::new(TensorNode {
                id: fresh_id(),
                name: name.into(),
                shape: shape.into_iter().collect(),
                dtype,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn shape(&self) -> &Shape {
        &self.node.shape
    }

    pub fn ndim(&self) -> usize {
        self.node.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.node.dtype
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for Tensor {}

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({}#{})", self.node.name, self.node.id)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}

/// Physical buffer backing one or more tensors.
#[derive(Clone)]
pub struct Buffer {
    node: Rc<BufferNode>,
}

#[derive(Debug)]
struct BufferNode {
    id: u64,
    name: String,
    shape: Shape,
    dtype: DType,
}

impl Buffer {
    pub fn new(name: impl Into<String>, shape: impl IntoIterator<Item = Rc<Expr>>, dtype: DType) -> Self {
        Self {
            node: Rc::new(BufferNode {
                id: fresh_id(),
                name: name.into(),
                shape: shape.into_iter().collect(),
                dtype,
            }),
        }
    }

    /// Default buffer for a tensor that was given no explicit backing:
    /// same shape, same element type.
    pub fn decl(shape: &Shape, dtype: DType, name: impl Into<String>) -> Self {
        Self::new(name, shape.iter().cloned(), dtype)
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn shape(&self) -> &Shape {
        &self.node.shape
    }

    pub fn dtype(&self) -> DType {
        self.node.dtype
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({}#{})", self.node.name, self.node.id)
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}
