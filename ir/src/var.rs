//! Symbolic variables with stable identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a fresh stable id for a named IR handle.
pub(crate) fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Named symbolic variable.
///
/// Equality and hashing use a stable id allocated at construction, not the
/// name: distinct variables may legitimately share a display name, and
/// substitution must never conflate them. Cloning shares the underlying
/// node.
#[derive(Clone)]
pub struct Var {
    node: Rc<VarNode>,
}

#[derive(Debug)]
struct VarNode {
    id: u64,
    name: String,
}

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self { node: Rc::new(VarNode { id: fresh_id(), name: name.into() }) }
    }

    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({}#{})", self.node.name, self.node.id)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}
