//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use visionforge_rs::graph::{AttributeId, Graph, NodeId};
use visionforge_rs::nodes::{InputSourceNode, PipelineOutputNode, VisionNode};

/// Builds graphs that always carry the two flow anchors.
pub struct GraphBuilder {
    pub graph: Graph,
    pub input: NodeId,
    pub output: NodeId,
}

impl GraphBuilder {
    pub fn new() -> Self {
        let mut graph = Graph::new();
        let input = graph.add_node(VisionNode::InputSource(InputSourceNode::default()));
        let output = graph.add_node(VisionNode::PipelineOutput(PipelineOutputNode::default()));
        Self {
            graph,
            input,
            output,
        }
    }

    pub fn add(&mut self, node: VisionNode) -> NodeId {
        self.graph.add_node(node)
    }

    /// Connect or panic; tests use this for links that must succeed.
    pub fn connect(&mut self, from: AttributeId, to: AttributeId) {
        self.graph
            .connect(from, to)
            .unwrap_or_else(|e| panic!("connect({from}, {to}) rejected: {e}"));
    }
}

/// Assert `needle` occurs exactly once in `haystack`.
pub fn assert_once(haystack: &str, needle: &str) {
    let count = haystack.matches(needle).count();
    assert_eq!(
        count, 1,
        "expected exactly one occurrence of {needle:?}, found {count} in:\n{haystack}"
    );
}

/// Byte offset of `needle`, panicking when absent.
pub fn offset_of(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{haystack}"))
}
