//! The typed attribute/link graph.
//!
//! Nodes own directional typed attributes; links join exactly one input
//! and one output attribute of different nodes. Graph edits enforce the
//! connection rules (mode, ownership, type compatibility, local recursion
//! check, single incoming link per input); the code generator only reads
//! the graph.

pub mod attribute;
pub mod graph;
pub mod id;
pub mod link;
pub mod registry;
pub mod serialize;

pub use attribute::{Attribute, AttributeDescriptor, AttributeMode, ElementKind, ValueKind};
pub use graph::{Graph, NodeSlot};
pub use id::{AttributeId, LinkId, NodeId};
pub use link::{Link, LinkRejection};
pub use registry::{NodeMetadata, NodeRegistry, RegistryLoader};
pub use serialize::{ProjectFile, SavedLink, SavedNode};
