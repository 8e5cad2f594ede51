//! Loop variables with domains and iteration kinds.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::expr::Expr;
use crate::types::IterType;
use crate::var::Var;

/// Half-open value range described as `(min, extent)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub min: Rc<Expr>,
    pub extent: Rc<Expr>,
}

impl Range {
    pub fn by_min_extent(min: Rc<Expr>, extent: Rc<Expr>) -> Self {
        Self { min, extent }
    }

    /// Whether the range provably starts at zero.
    pub fn is_zero_based(&self) -> bool {
        self.min.as_const_int() == Some(0)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.extent)
    }
}

/// Loop variable: a symbolic index with an optional domain and an
/// iteration-kind tag.
///
/// Immutable once created; split/fuse/rebase create fresh variables rather
/// than mutating existing ones. Equality and hashing follow the underlying
/// [`Var`] id, so an `IterVar` can key a bound map.
#[derive(Clone)]
pub struct IterVar {
    node: Rc<IterVarNode>,
}

#[derive(Debug)]
struct IterVarNode {
    var: Var,
    dom: Option<Range>,
    iter_type: IterType,
    thread_tag: Option<String>,
}

impl IterVar {
    pub fn new(dom: Option<Range>, var: Var, iter_type: IterType) -> Self {
        Self { node: Rc::new(IterVarNode { var, dom, iter_type, thread_tag: None }) }
    }

    /// A thread-index variable such as `threadIdx.x`; the tag doubles as the
    /// variable name.
    pub fn thread(dom: Option<Range>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            node: Rc::new(IterVarNode {
                var: Var::new(tag.clone()),
                dom,
                iter_type: IterType::ThreadIndex,
                thread_tag: Some(tag),
            }),
        }
    }

    pub fn var(&self) -> &Var {
        &self.node.var
    }

    pub fn dom(&self) -> Option<&Range> {
        self.node.dom.as_ref()
    }

    pub fn iter_type(&self) -> IterType {
        self.node.iter_type
    }

    pub fn thread_tag(&self) -> Option<&str> {
        self.node.thread_tag.as_deref()
    }
}

impl PartialEq for IterVar {
    fn eq(&self, other: &Self) -> bool {
        self.node.var == other.node.var
    }
}

impl Eq for IterVar {}

impl Hash for IterVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.var.hash(state);
    }
}

impl fmt::Debug for IterVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterVar")
            .field("var", &self.node.var)
            .field("dom", &self.node.dom)
            .field("iter_type", &self.node.iter_type)
            .finish()
    }
}

impl fmt::Display for IterVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node.var)
    }
}
