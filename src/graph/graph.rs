//! The node graph: arena storage plus all user-edit operations.
//!
//! Nodes and links live in slot vectors; ids are direct indices (see
//! `id.rs`). The graph is mutated only by edit operations — the code
//! generator reads it and never writes. Rejected edits leave the graph
//! exactly as it was and report a typed `LinkRejection`.

use crate::graph::attribute::{Attribute, AttributeMode};
use crate::graph::id::{AttributeId, LinkId, NodeId};
use crate::graph::link::{Link, LinkRejection};
use crate::nodes::VisionNode;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A node instance together with its live attributes and editor position.
#[derive(Debug, Clone)]
pub struct NodeSlot {
    pub node: VisionNode,
    pub position: [f32; 2],
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Option<NodeSlot>>,
    links: Vec<Link>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `node` and its declared attributes, returning its id.
    pub fn add_node(&mut self, node: VisionNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.insert_node_at(id, node, [0.0, 0.0]);
        id
    }

    /// Place a node at a specific id (deserialization). Gaps are kept as
    /// empty slots so ids survive round-trips.
    pub fn insert_node_at(&mut self, id: NodeId, node: VisionNode, position: [f32; 2]) {
        let attributes = node
            .descriptors()
            .iter()
            .map(Attribute::from_descriptor)
            .collect();

        while self.nodes.len() <= id.index() {
            self.nodes.push(None);
        }
        self.nodes[id.index()] = Some(NodeSlot {
            node,
            position,
            attributes,
        });
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.nodes.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeSlot)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (NodeId(i as u32), s)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.node(id.node())
            .and_then(|slot| slot.attributes.get(id.attr_index() as usize))
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Option<&mut Attribute> {
        self.node_mut(id.node())
            .and_then(|slot| slot.attributes.get_mut(id.attr_index() as usize))
    }

    /// Attribute ids of a node, in declaration order.
    pub fn attributes_of(&self, node: NodeId) -> Vec<AttributeId> {
        match self.node(node) {
            Some(slot) => (0..slot.attributes.len())
                .map(|i| AttributeId::new(node, i as u16))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Mark an output attribute for live streaming on instrumented passes.
    pub fn set_streaming(&mut self, attr: AttributeId, enabled: bool) {
        if let Some(a) = self.attribute_mut(attr) {
            a.streaming = enabled;
        }
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index()).filter(|l| !l.deleted)
    }

    pub fn iter_links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.deleted)
            .map(|(i, l)| (LinkId(i as u32), l))
    }

    /// Enabled links incident to an attribute.
    pub fn links_of(&self, attr: AttributeId) -> Vec<LinkId> {
        match self.attribute(attr) {
            Some(a) => a
                .links
                .iter()
                .copied()
                .filter(|id| self.link(*id).is_some())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Attributes on the far end of every enabled link of `attr`. Finite
    /// and restartable — recomputed from storage on each call.
    pub fn linked_attributes(&self, attr: AttributeId) -> Vec<AttributeId> {
        self.links_of(attr)
            .into_iter()
            .filter_map(|id| self.link(id).and_then(|l| l.other_end(attr)))
            .collect()
    }

    /// The upstream output attribute feeding this input, if linked. Input
    /// attributes hold at most one enabled link.
    pub fn linked_output(&self, input: AttributeId) -> Option<AttributeId> {
        self.linked_attributes(input).into_iter().next()
    }

    /// All enabled links whose endpoints join nodes `a` and `b`.
    pub fn links_between(&self, a: NodeId, b: NodeId) -> Vec<LinkId> {
        self.iter_links()
            .filter(|(_, l)| {
                let (na, nb) = (l.a.node(), l.b.node());
                (na == a && nb == b) || (na == b && nb == a)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Connect two attributes, enforcing the link-creation rules. On
    /// success the input endpoint's previous link (if any) is replaced.
    pub fn connect(&mut self, a: AttributeId, b: AttributeId) -> Result<LinkId, LinkRejection> {
        let attr_a = self
            .attribute(a)
            .ok_or(LinkRejection::UnknownAttribute(a))?;
        let attr_b = self
            .attribute(b)
            .ok_or(LinkRejection::UnknownAttribute(b))?;

        if attr_a.mode == attr_b.mode {
            warn!(%a, %b, "link rejected: same mode");
            return Err(LinkRejection::SameMode);
        }
        if a.node() == b.node() {
            warn!(%a, %b, "link rejected: same node");
            return Err(LinkRejection::SameNode);
        }
        if !attr_a.accepts_link(attr_b) || !attr_b.accepts_link(attr_a) {
            warn!(%a, %b, "link rejected: attribute types do not match");
            return Err(LinkRejection::TypeMismatch);
        }

        let (input, output) = if attr_a.mode == AttributeMode::Input {
            (a, b)
        } else {
            (b, a)
        };

        // Simple recursion check: the new link carries output -> input; if
        // any existing link between the two nodes already carries data the
        // opposite way, the pair would feed back into each other. Only
        // links directly between these two nodes are inspected.
        let would_recurse = self
            .links_between(input.node(), output.node())
            .into_iter()
            .filter_map(|id| self.link(id))
            .any(|l| {
                let at_input_node = if l.a.node() == input.node() { l.a } else { l.b };
                self.attribute(at_input_node)
                    .map(|attr| attr.mode == AttributeMode::Output)
                    .unwrap_or(false)
            });
        if would_recurse {
            warn!(%a, %b, "link rejected: would close a cycle between the two nodes");
            return Err(LinkRejection::WouldRecurse);
        }

        // Single-incoming-link invariant: replace any existing link on the
        // input endpoint.
        for stale in self.links_of(input) {
            self.disconnect(stale);
        }

        let id = LinkId(self.links.len() as u32);
        self.links.push(Link::new(a, b));
        if let Some(attr) = self.attribute_mut(a) {
            attr.links.push(id);
        }
        if let Some(attr) = self.attribute_mut(b) {
            attr.links.push(id);
        }

        debug!(%a, %b, link = ?id, "link created");
        Ok(id)
    }

    /// Remove a link, detaching it from both endpoints.
    pub fn disconnect(&mut self, id: LinkId) {
        let Some(link) = self.links.get_mut(id.index()) else {
            return;
        };
        if link.deleted {
            return;
        }
        link.deleted = true;
        let (a, b) = (link.a, link.b);

        for end in [a, b] {
            if let Some(attr) = self.attribute_mut(end) {
                attr.links.retain(|l| *l != id);
            }
        }
        debug!(link = ?id, "link removed");
    }

    /// Delete a node and every link touching it.
    pub fn delete_node(&mut self, id: NodeId) {
        let Some(slot) = self.node(id) else {
            return;
        };
        if !slot.node.user_deletable() {
            warn!(node = %id, "delete rejected: node is not user-deletable");
            return;
        }

        let incident: Vec<LinkId> = self
            .attributes_of(id)
            .into_iter()
            .flat_map(|attr| self.links_of(attr))
            .collect();
        for link in incident {
            self.disconnect(link);
        }
        self.nodes[id.index()] = None;
        debug!(node = %id, "node deleted");
    }

    /// Nodes reachable through this node's output attributes, in first-seen
    /// order without duplicates.
    pub fn downstream_nodes(&self, node: NodeId) -> Vec<NodeId> {
        let mut seen = Vec::new();
        for attr in self.attributes_of(node) {
            let Some(a) = self.attribute(attr) else {
                continue;
            };
            if a.mode != AttributeMode::Output {
                continue;
            }
            for linked in self.linked_attributes(attr) {
                let owner = linked.node();
                if !seen.contains(&owner) {
                    seen.push(owner);
                }
            }
        }
        seen
    }

    /// Whether every forward path from `node` fails to reach the pipeline
    /// output. Dead-end branches are still generated, but only after all
    /// complete-path nodes.
    pub fn has_dead_end(&self, node: NodeId) -> bool {
        let mut visited = HashSet::new();
        self.dead_end_walk(node, &mut visited)
    }

    fn dead_end_walk(&self, node: NodeId, visited: &mut HashSet<NodeId>) -> bool {
        if !visited.insert(node) {
            // Already on the path: this branch loops without reaching the
            // output.
            return true;
        }
        if let Some(slot) = self.node(node) {
            if slot.node.is_pipeline_output() {
                return false;
            }
        }
        for downstream in self.downstream_nodes(node) {
            if let Some(slot) = self.node(downstream) {
                if slot.node.is_pipeline_output() || !self.dead_end_walk(downstream, visited) {
                    return false;
                }
            }
        }
        true
    }

    /// The unique input-source node, if present.
    pub fn input_source(&self) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, slot)| slot.node.is_input_source())
            .map(|(id, _)| id)
    }

    /// The unique pipeline-output node, if present.
    pub fn pipeline_output(&self) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, slot)| slot.node.is_pipeline_output())
            .map(|(id, _)| id)
    }
}
