//! The closed statement enum and scoped-attribute keys.

use std::fmt;
use std::rc::Rc;

use crate::expr::{Expr, Indices};
use crate::itervar::IterVar;
use crate::tensor::{Buffer, Region, Tensor};
use crate::types::ForKind;
use crate::var::Var;

/// Rendered prefix of pragma attribute keys.
pub const PRAGMA_SCOPE_PREFIX: &str = "pragma_";

/// Statement node.
///
/// One variant per node kind; every pass is an exhaustive match over this
/// enum returning a new tree (or the original `Rc` when nothing changed).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Loop over `[min, min + extent)`.
    For { loop_var: Var, min: Rc<Expr>, extent: Rc<Expr>, kind: ForKind, body: Rc<Stmt> },
    /// Scoped attribute: a key/value directive scoped over `body`.
    Attr { node: AttrNode, key: AttrKey, value: Rc<Expr>, body: Rc<Stmt> },
    IfThenElse { cond: Rc<Expr>, then_case: Rc<Stmt>, else_case: Option<Rc<Stmt>> },
    /// Write of a computed value into a tensor element.
    Provide { tensor: Tensor, value: Rc<Expr>, indices: Indices },
    /// Declares the extent of a tensor that `body` may produce or consume.
    Realize { tensor: Tensor, bounds: Region, body: Rc<Stmt> },
    Block(Vec<Rc<Stmt>>),
}

/// Target of a scoped attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrNode {
    IterVar(IterVar),
    Var(Var),
    /// Pairing of a physical buffer with the tensor bound to it.
    BufferBind { buffer: Buffer, tensor: Tensor },
    None,
}

/// Key of a scoped attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrKey {
    /// Value is a flattened `(min, extent)` tuple per buffer dimension.
    BufferBindScope,
    /// Value is the extent of the thread-bound loop.
    ThreadExtent,
    /// Marks a body authored outside the compiler's own lowering.
    ExternScope,
    /// User pragma; rendered with the [`PRAGMA_SCOPE_PREFIX`].
    Pragma(String),
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKey::BufferBindScope => f.write_str("buffer_bind_scope"),
            AttrKey::ThreadExtent => f.write_str("thread_extent"),
            AttrKey::ExternScope => f.write_str("extern_scope"),
            AttrKey::Pragma(key) => write!(f, "{PRAGMA_SCOPE_PREFIX}{key}"),
        }
    }
}

impl Stmt {
    pub fn loop_(loop_var: &Var, min: Rc<Expr>, extent: Rc<Expr>, kind: ForKind, body: Rc<Stmt>) -> Rc<Stmt> {
        Rc::new(Stmt::For { loop_var: loop_var.clone(), min, extent, kind, body })
    }

    pub fn attr(node: AttrNode, key: AttrKey, value: Rc<Expr>, body: Rc<Stmt>) -> Rc<Stmt> {
        Rc::new(Stmt::Attr { node, key, value, body })
    }

    pub fn if_then(cond: Rc<Expr>, then_case: Rc<Stmt>) -> Rc<Stmt> {
        Rc::new(Stmt::IfThenElse { cond, then_case, else_case: None })
    }

    pub fn provide(tensor: Tensor, value: Rc<Expr>, indices: impl IntoIterator<Item = Rc<Expr>>) -> Rc<Stmt> {
        Rc::new(Stmt::Provide { tensor, value, indices: indices.into_iter().collect() })
    }

    pub fn realize(tensor: Tensor, bounds: Region, body: Rc<Stmt>) -> Rc<Stmt> {
        Rc::new(Stmt::Realize { tensor, bounds, body })
    }

    pub fn block(stmts: Vec<Rc<Stmt>>) -> Rc<Stmt> {
        Rc::new(Stmt::Block(stmts))
    }
}
