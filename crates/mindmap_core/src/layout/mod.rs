//! Layout engines: turn a tree into positioned nodes and styled edges.
//!
//! # Responsibility
//! - Dispatch a `Tree` to the hierarchical, radial, temporal or quadrant
//!   engine selected by `LayoutConfig`.
//! - Share collapse handling and output types across engines.
//!
//! # Invariants
//! - Engines are pure: the same tree and config yield the same result.
//! - Descendants of collapsed nodes never appear in the output; the collapsed
//!   nodes themselves do.
//! - Every edge endpoint is a positioned node.

pub mod config;
pub mod hierarchical;
pub mod quadrant;
pub mod radial;
pub mod style;
pub mod temporal;

pub use config::{
    LayoutConfig, LayoutError, LayoutKind, MatrixBounds, Orientation, Spacing, TemporalParams,
};
pub use quadrant::Quadrant;
pub use style::{ColorCategory, EdgeStyle, LayoutEdge, RelationKind};

use crate::hierarchy::Tree;
use crate::model::node::{Node, NodeId, NodeMap, NodeStatus, Priority};
use log::info;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Renderable node with its computed position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: NodeId,
    pub position: Position,
    pub depth: usize,
    pub label: String,
    pub status: Option<NodeStatus>,
    pub priority: Option<Priority>,
    pub has_children: bool,
    pub is_collapsed: bool,
    pub is_objective: bool,
    /// Set by the quadrant engine only.
    pub quadrant: Option<Quadrant>,
}

impl PositionedNode {
    pub(crate) fn from_node(
        node: &Node,
        position: Position,
        depth: usize,
        collapsed: &BTreeSet<NodeId>,
    ) -> Self {
        Self {
            id: node.id.clone(),
            position,
            depth,
            label: node.title.clone(),
            status: node.status,
            priority: node.priority,
            has_children: !node.children.is_empty(),
            is_collapsed: collapsed.contains(&node.id),
            is_objective: node.is_objective,
            quadrant: None,
        }
    }
}

/// Non-fatal findings reported alongside a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayoutDiagnostic {
    /// `from` lists `to` in its after ids, closing a cycle; the link was
    /// ignored for ordering.
    TemporalCycle { from: NodeId, to: NodeId },
    /// No collision-free slot was found within the retry bound.
    CollisionUnresolved { id: NodeId },
    /// Node left out of the matrix because impact or effort is absent.
    MissingScores { id: NodeId },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.node(id).map(|node| node.position)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}

/// Validated entry point over the four engines.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `tree`. `related` is the secondary collection the temporal
    /// engine pulls referenced problems from; other engines ignore it.
    pub fn run(&self, tree: &Tree, related: Option<&NodeMap>) -> LayoutResult {
        let result = match self.config.layout {
            LayoutKind::Hierarchical => hierarchical::layout(tree, &self.config),
            LayoutKind::Radial => radial::layout(tree, &self.config),
            LayoutKind::Temporal => temporal::layout(tree, related, &self.config),
            LayoutKind::Quadrant => quadrant::layout(tree, &self.config),
        };
        info!(
            "event=layout module=layout status=ok kind={} nodes={} edges={} diagnostics={}",
            self.config.layout,
            result.nodes.len(),
            result.edges.len(),
            result.diagnostics.len()
        );
        result
    }
}

/// Ids hidden by collapsing: every descendant of a collapsed node, following
/// `children` links. The tree root always stays visible.
pub fn hidden_nodes(tree: &Tree, collapsed: &BTreeSet<NodeId>) -> HashSet<NodeId> {
    let mut hidden = HashSet::new();
    let mut stack: Vec<&NodeId> = collapsed
        .iter()
        .filter_map(|id| tree.get(id.as_str()))
        .flat_map(|node| node.children.iter())
        .collect();

    while let Some(id) = stack.pop() {
        if !hidden.insert(id.clone()) {
            continue;
        }
        if let Some(node) = tree.get(id.as_str()) {
            stack.extend(node.children.iter());
        }
    }

    if let Some(root) = &tree.root {
        hidden.remove(root);
    }
    hidden
}

/// Parent-child edges between visible nodes, one per distinct pair.
pub(crate) fn tree_edges(
    tree: &Tree,
    hidden: &HashSet<NodeId>,
    placed: &HashSet<NodeId>,
) -> Vec<LayoutEdge> {
    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    for node in tree.nodes.values() {
        if hidden.contains(&node.id) || !placed.contains(&node.id) {
            continue;
        }
        for child_id in &node.children {
            if hidden.contains(child_id) || !placed.contains(child_id) {
                continue;
            }
            let Some(child) = tree.get(child_id.as_str()) else {
                continue;
            };
            let id = format!("{}-{}", node.id, child_id);
            if seen.insert(id.clone()) {
                edges.push(LayoutEdge::between(
                    id,
                    &node.id,
                    child,
                    RelationKind::ParentChild,
                ));
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::{hidden_nodes, LayoutConfig, LayoutEngine, LayoutError};
    use crate::hierarchy::{build_tree, resolve_relationships, TreeOptions};
    use crate::model::node::{Node, NodeId, NodeMap};
    use std::collections::BTreeSet;

    fn chain() -> NodeMap {
        let mut nodes: NodeMap = ["r", "a", "b", "c"]
            .iter()
            .map(|id| Node::new(NodeId::new(id), id.to_uppercase()))
            .collect();
        for (child, parent) in [("a", "r"), ("b", "a"), ("c", "b")] {
            if let Some(node) = nodes.get_mut(child) {
                node.parent_id = Some(NodeId::new(parent));
            }
        }
        resolve_relationships(&mut nodes);
        nodes
    }

    #[test]
    fn collapse_hides_descendants_only() {
        let tree = build_tree(&chain(), None, &TreeOptions::default());
        let collapsed: BTreeSet<NodeId> = [NodeId::new("a")].into_iter().collect();
        let hidden = hidden_nodes(&tree, &collapsed);
        assert!(hidden.contains("b"));
        assert!(hidden.contains("c"));
        assert!(!hidden.contains("a"));
    }

    #[test]
    fn collapsing_root_keeps_root_visible() {
        let tree = build_tree(&chain(), None, &TreeOptions::default());
        let collapsed: BTreeSet<NodeId> = [NodeId::new("r")].into_iter().collect();
        let result = LayoutEngine::new(LayoutConfig::default().with_collapsed(["r"]))
            .expect("valid config")
            .run(&tree, None);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.nodes[0].is_collapsed);
        assert!(result.edges.is_empty());
        assert_eq!(hidden_nodes(&tree, &collapsed).len(), 3);
    }

    #[test]
    fn engine_rejects_invalid_spacing() {
        let mut config = LayoutConfig::default();
        config.radial_step = -1.0;
        assert!(matches!(
            LayoutEngine::new(config),
            Err(LayoutError::InvalidSpacing { field: "radialStep", .. })
        ));
    }
}
