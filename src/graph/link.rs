//! Links between node attributes.
//!
//! A link joins exactly one input and one output attribute. Storage is
//! undirected (endpoints `a` and `b`); direction is derived from the
//! endpoints' modes at use time.

use crate::graph::id::AttributeId;
use thiserror::Error;

/// An edge between two attributes of different nodes.
#[derive(Debug, Clone)]
pub struct Link {
    pub a: AttributeId,
    pub b: AttributeId,
    /// Links created by the system (e.g. during deserialization of fixed
    /// plumbing) may be flagged non-destroyable so user edits cannot
    /// remove them.
    pub user_destroyable: bool,
    pub deleted: bool,
}

impl Link {
    pub fn new(a: AttributeId, b: AttributeId) -> Self {
        Self {
            a,
            b,
            user_destroyable: true,
            deleted: false,
        }
    }

    /// The endpoint opposite to `me`, if `me` is one of the endpoints.
    pub fn other_end(&self, me: AttributeId) -> Option<AttributeId> {
        if self.a == me {
            Some(self.b)
        } else if self.b == me {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Why a `connect` edit was refused. These are advisory warnings, not
/// failures: the graph is left exactly as it was before the edit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkRejection {
    #[error("attributes of the same mode cannot be linked")]
    SameMode,

    #[error("a node cannot be linked to itself")]
    SameNode,

    #[error("attribute types do not match")]
    TypeMismatch,

    #[error("link would connect the two nodes back into each other")]
    WouldRecurse,

    #[error("no such attribute: {0}")]
    UnknownAttribute(AttributeId),
}
