//! Node-type registry.
//!
//! Maps stable type tags to factories producing default-constructed nodes,
//! together with palette metadata. The table is populated once at startup
//! and read-only afterwards; discovery runs on a background thread with an
//! explicit completion signal, and callers join it only at the documented
//! suspension point (opening the palette), never during a generation pass.

use crate::nodes::{Category, VisionNode};
use crossbeam_channel::{bounded, Receiver};
use tracing::debug;

/// Palette metadata for one node type.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub type_tag: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    /// Flow anchors (input source, pipeline output) exist once per graph
    /// and are hidden from the palette.
    pub show_in_palette: bool,
}

struct RegistryEntry {
    metadata: NodeMetadata,
    factory: fn() -> VisionNode,
}

/// Startup-populated table of all known node types.
#[derive(Default)]
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl NodeRegistry {
    /// Build the registry of built-in node types.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (factory, show_in_palette) in VisionNode::builtin_factories() {
            let node = factory();
            registry.entries.push(RegistryEntry {
                metadata: NodeMetadata {
                    type_tag: node.type_tag(),
                    name: node.display_name(),
                    category: node.category(),
                    description: node.description(),
                    show_in_palette,
                },
                factory,
            });
        }
        debug!(types = registry.entries.len(), "node registry populated");
        registry
    }

    /// Produce a default-constructed instance for a type tag.
    pub fn instantiate(&self, type_tag: &str) -> Option<VisionNode> {
        self.entries
            .iter()
            .find(|e| e.metadata.type_tag == type_tag)
            .map(|e| (e.factory)())
    }

    pub fn metadata(&self, type_tag: &str) -> Option<&NodeMetadata> {
        self.entries
            .iter()
            .map(|e| &e.metadata)
            .find(|m| m.type_tag == type_tag)
    }

    /// Node types shown in the palette, in registration order.
    pub fn palette(&self) -> impl Iterator<Item = &NodeMetadata> {
        self.entries
            .iter()
            .map(|e| &e.metadata)
            .filter(|m| m.show_in_palette)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to the background registry scan. `join` blocks until the scan
/// signals completion.
pub struct RegistryLoader {
    rx: Receiver<NodeRegistry>,
}

impl RegistryLoader {
    pub fn spawn() -> Self {
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let registry = NodeRegistry::builtin();
            // Receiver dropped means the caller no longer wants the table.
            let _ = tx.send(registry);
        });
        Self { rx }
    }

    /// Block until the scan completes. The one documented suspension point.
    pub fn join(self) -> NodeRegistry {
        self.rx.recv().unwrap_or_else(|_| NodeRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_instantiates_by_tag() {
        let registry = NodeRegistry::builtin();
        assert!(!registry.is_empty());

        let node = registry.instantiate("cvt_color").expect("cvt_color registered");
        assert_eq!(node.type_tag(), "cvt_color");
    }

    #[test]
    fn test_unknown_tag_yields_none() {
        let registry = NodeRegistry::builtin();
        assert!(registry.instantiate("does_not_exist").is_none());
    }

    #[test]
    fn test_flow_anchors_hidden_from_palette() {
        let registry = NodeRegistry::builtin();
        assert!(registry
            .palette()
            .all(|m| m.type_tag != "input_source" && m.type_tag != "pipeline_output"));
    }

    #[test]
    fn test_loader_joins_with_full_table() {
        let loader = RegistryLoader::spawn();
        let registry = loader.join();
        assert_eq!(registry.len(), NodeRegistry::builtin().len());
    }
}
