//! Code-generation error types.
//!
//! Two user-facing kinds, both fatal to the current pass: `Node` errors
//! are generator defects (an unreachable code path was reached), while
//! `Attribute` errors are constraint violations the user can fix by
//! editing the graph. The remaining variants are internal defects that
//! should never surface in correct operation.

use crate::codegen::resolvable::PlaceholderId;
use crate::graph::id::{AttributeId, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// Raised by a node's generator logic; always a defect.
    #[error("node {node}: {message}")]
    Node { node: NodeId, message: String },

    /// Raised by an attribute-level constraint check; fix the graph and
    /// re-run the pass.
    #[error("attribute {attribute}: {message}")]
    Attribute {
        attribute: AttributeId,
        message: String,
    },

    /// The graph has no pipeline-output node to anchor the pass.
    #[error("graph has no pipeline output node")]
    MissingPipelineOutput,

    /// The graph has no input-source node to start the pass from.
    #[error("graph has no input source node")]
    MissingInputSource,

    /// A deferred value was never backed by a generated session. Indicates
    /// a defect in pass ordering, not a user error.
    #[error("placeholder {0:?} was not resolved before rendering")]
    UnresolvedPlaceholder(PlaceholderId),

    /// The renderer received IR it cannot express; a generator defect.
    #[error("renderer defect: {0}")]
    Render(String),
}

impl GenError {
    pub fn node(node: NodeId, message: impl Into<String>) -> Self {
        GenError::Node {
            node,
            message: message.into(),
        }
    }

    pub fn attribute(attribute: AttributeId, message: impl Into<String>) -> Self {
        GenError::Attribute {
            attribute,
            message: message.into(),
        }
    }

    /// The node this error points at, for surfacing in an editor.
    pub fn node_ref(&self) -> Option<NodeId> {
        match self {
            GenError::Node { node, .. } => Some(*node),
            GenError::Attribute { attribute, .. } => Some(attribute.node()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_error_points_at_owner_node() {
        let attr = AttributeId::new(NodeId(7), 2);
        let err = GenError::attribute(attr, "mat is not binary");
        assert_eq!(err.node_ref(), Some(NodeId(7)));
    }

    #[test]
    fn test_error_display() {
        let err = GenError::node(NodeId(3), "no value handler for attribute");
        assert!(err.to_string().contains("NodeId(3)"));
        assert!(err.to_string().contains("no value handler"));
    }
}
