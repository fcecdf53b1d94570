//! Tiered left-to-right (or top-down) tree layout.
//!
//! Nodes are grouped by breadth-first depth. Each tier is sorted by the
//! cross-axis position of its members' parents, then centred around zero.

use super::config::{LayoutConfig, Orientation};
use super::{hidden_nodes, tree_edges, LayoutResult, Position, PositionedNode};
use crate::hierarchy::Tree;
use crate::model::node::{Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Sibling spacing multiplier applied to `spacing.secondary`.
const SIBLING_FACTOR: f64 = 1.5;
/// Tier spacing multiplier applied to `spacing.primary`.
const TIER_FACTOR: f64 = 2.2;

pub fn layout(tree: &Tree, config: &LayoutConfig) -> LayoutResult {
    let Some(root) = tree.root() else {
        return LayoutResult::default();
    };
    let hidden = hidden_nodes(tree, &config.collapsed_ids);
    let tiers = tiers(tree, root, &hidden, config);

    let sibling_step = config.spacing.secondary * SIBLING_FACTOR;
    let tier_step = config.spacing.primary * TIER_FACTOR;
    // Cross-axis coordinate per placed node, read back when sorting the next tier.
    let mut cross: HashMap<NodeId, f64> = HashMap::new();
    let mut positions: HashMap<NodeId, Position> = HashMap::new();

    for (depth, tier) in tiers.iter().enumerate() {
        let mut sorted = tier.clone();
        let parent_cross = |node: &Node| {
            node.parent()
                .and_then(|parent| cross.get(parent))
                .copied()
                .unwrap_or(0.0)
        };
        sorted.sort_by(|a, b| parent_cross(a).total_cmp(&parent_cross(b)));

        let total = sorted.len() as f64 * sibling_step;
        let start = -total / 2.0 + sibling_step / 2.0;
        let along = depth as f64 * tier_step;
        for (index, node) in sorted.iter().enumerate() {
            let across = start + index as f64 * sibling_step;
            let position = match config.orientation {
                Orientation::Horizontal => Position::new(along, across),
                Orientation::Vertical => Position::new(across, along),
            };
            cross.insert(node.id.clone(), across);
            positions.insert(node.id.clone(), position);
        }
    }

    let nodes: Vec<PositionedNode> = tree
        .nodes
        .values()
        .filter(|node| positions.contains_key(&node.id))
        .map(|node| {
            let position = positions.get(&node.id).copied().unwrap_or_default();
            PositionedNode::from_node(
                node,
                position,
                tree.depth_of(node.id.as_str()),
                &config.collapsed_ids,
            )
        })
        .collect();

    let placed: HashSet<NodeId> = positions.into_keys().collect();
    LayoutResult {
        nodes,
        edges: tree_edges(tree, &hidden, &placed),
        diagnostics: Vec::new(),
    }
}

/// Breadth-first tiers. A node reached twice keeps its first (shallowest) tier.
fn tiers<'a>(
    tree: &'a Tree,
    root: &'a Node,
    hidden: &HashSet<NodeId>,
    config: &LayoutConfig,
) -> Vec<Vec<&'a Node>> {
    let mut tiers: Vec<Vec<&Node>> = Vec::new();
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((node, depth)) = queue.pop_front() {
        if hidden.contains(&node.id) || !visited.insert(&node.id) {
            continue;
        }
        if tiers.len() <= depth {
            tiers.resize_with(depth + 1, Vec::new);
        }
        tiers[depth].push(node);

        if config.collapsed_ids.contains(&node.id) {
            continue;
        }
        for child_id in &node.children {
            if visited.contains(child_id) || hidden.contains(child_id) {
                continue;
            }
            if let Some(child) = tree.get(child_id.as_str()) {
                queue.push_back((child, depth + 1));
            }
        }
    }
    tiers
}
