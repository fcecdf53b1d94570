//! Explicit parent/child adjacency index over a `NodeMap`.
//!
//! # Invariants
//! - Built from scratch for one batch; never patched incrementally.
//! - All lists keep node insertion order.

use crate::model::node::{NodeId, NodeMap};
use std::collections::HashMap;

/// Ordered child lists plus the two reverse indexes derived from them.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    children: HashMap<NodeId, Vec<NodeId>>,
    /// parent id -> nodes whose `parent_id` points at it.
    claimants: HashMap<NodeId, Vec<NodeId>>,
    /// child id -> nodes that list it in `children`.
    listed_in: HashMap<NodeId, Vec<NodeId>>,
}

impl Adjacency {
    pub fn from_nodes(nodes: &NodeMap) -> Self {
        let mut index = Self::default();
        for (id, node) in nodes.iter() {
            if !node.children.is_empty() {
                index.children.insert(id.clone(), node.children.clone());
            }
            for child in &node.children {
                index
                    .listed_in
                    .entry(child.clone())
                    .or_default()
                    .push(id.clone());
            }
            if let Some(parent) = node.parent() {
                index
                    .claimants
                    .entry(parent.clone())
                    .or_default()
                    .push(id.clone());
            }
        }
        index
    }

    /// Child ids as listed by the node itself.
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Nodes whose `parent_id` names `id`, in insertion order.
    pub fn claimants_of(&self, id: &str) -> &[NodeId] {
        self.claimants.get(id).map_or(&[], Vec::as_slice)
    }

    /// Nodes listing `id` among their children.
    pub fn listed_parents_of(&self, id: &str) -> &[NodeId] {
        self.listed_in.get(id).map_or(&[], Vec::as_slice)
    }

    /// Whether any node points at `id` through its `parent_id`.
    pub fn is_claimed_parent(&self, id: &str) -> bool {
        self.claimants.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::Adjacency;
    use crate::model::node::{Node, NodeId, NodeMap};

    #[test]
    fn indexes_both_directions() {
        let mut parent = Node::new(NodeId::new("p"), "P");
        parent.children.push(NodeId::new("a"));
        let mut claimant = Node::new(NodeId::new("b"), "B");
        claimant.parent_id = Some(NodeId::new("p"));
        let nodes: NodeMap = vec![parent, claimant].into_iter().collect();

        let index = Adjacency::from_nodes(&nodes);
        assert_eq!(index.children_of("p"), &[NodeId::new("a")]);
        assert_eq!(index.claimants_of("p"), &[NodeId::new("b")]);
        assert_eq!(index.listed_parents_of("a"), &[NodeId::new("p")]);
        assert!(index.is_claimed_parent("p"));
        assert!(index.children_of("missing").is_empty());
    }
}
