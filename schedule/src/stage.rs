//! Per-unit schedule state.
//!
//! A [`Stage`] is declared by the user-facing scheduling API (external to
//! this crate) and consumed read-only here: relations in declaration
//! order, the desired leaf loop order, and per-variable attributes.

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{Expr, IterType, IterVar, Range};

/// Resolved `(min, extent)` range for every loop variable referenced by
/// the schedule. Produced by upstream bound inference; read-only here.
pub type DomMap = HashMap<IterVar, Range>;

/// A requested iteration-space transform.
#[derive(Debug, Clone)]
pub enum Relation {
    /// Divide `parent` into `outer × inner` with the given factor. The
    /// fresh variables' zero-based domains must already be in the bound
    /// map.
    Split { parent: IterVar, outer: IterVar, inner: IterVar, factor: Rc<Expr> },
    /// Merge two nested loops into one fresh variable ranging over the
    /// product of their extents.
    Fuse { outer: IterVar, inner: IterVar, fused: IterVar },
    /// Re-anchor `parent` to a fresh (usually zero-based) variable without
    /// changing iteration order.
    Rebase { parent: IterVar, rebased: IterVar },
}

/// Per-loop-variable annotation requests.
#[derive(Debug, Clone, Default)]
pub struct IterVarAttr {
    /// Overrides the variable's own iteration kind when deciding the final
    /// for-kind; `None` inherits.
    pub iter_type: Option<IterType>,
    /// Thread-index variable this loop is bound to.
    pub bind_thread: Option<IterVar>,
    /// Pragma keys and values, parallel vectors in declaration order.
    /// Kept separate so a length mismatch stays detectable at the point
    /// of use.
    pub pragma_keys: Vec<String>,
    pub pragma_values: Vec<Rc<Expr>>,
}

impl IterVarAttr {
    pub fn with_iter_type(iter_type: IterType) -> Self {
        Self { iter_type: Some(iter_type), ..Self::default() }
    }

    pub fn bind(thread: IterVar) -> Self {
        Self { bind_thread: Some(thread), ..Self::default() }
    }

    pub fn add_pragma(&mut self, key: impl Into<String>, value: Rc<Expr>) {
        self.pragma_keys.push(key.into());
        self.pragma_values.push(value);
    }
}

/// Schedule state for one schedulable unit.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    /// Transform requests; application order is declaration order.
    pub relations: Vec<Relation>,
    /// Desired leaf-level loop order, outermost to innermost.
    pub leaf_iter_vars: Vec<IterVar>,
    /// Annotation requests keyed by leaf variable.
    pub iter_var_attrs: HashMap<IterVar, IterVarAttr>,
}

impl Stage {
    pub fn new(leaf_iter_vars: Vec<IterVar>) -> Self {
        Self { leaf_iter_vars, ..Self::default() }
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn set_attr(&mut self, iter_var: &IterVar, attr: IterVarAttr) {
        self.iter_var_attrs.insert(iter_var.clone(), attr);
    }
}
