//! Concentric radial layout.
//!
//! The root sits at the origin. Each node owns an angular wedge which is
//! split evenly among its visible children; a child is placed in the middle
//! of its sub-wedge on the ring `depth * radial_step`.

use super::config::LayoutConfig;
use super::{hidden_nodes, tree_edges, LayoutResult, Position, PositionedNode};
use crate::hierarchy::Tree;
use crate::model::node::{Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::TAU;

struct Wedge<'a> {
    node: &'a Node,
    depth: usize,
    /// Centre angle in radians.
    angle: f64,
    range: f64,
}

pub fn layout(tree: &Tree, config: &LayoutConfig) -> LayoutResult {
    let Some(root) = tree.root() else {
        return LayoutResult::default();
    };
    let hidden = hidden_nodes(tree, &config.collapsed_ids);

    let mut placed: HashMap<NodeId, (Position, usize)> = HashMap::new();
    let mut queue = VecDeque::from([Wedge {
        node: root,
        depth: 0,
        angle: 0.0,
        range: TAU,
    }]);

    while let Some(wedge) = queue.pop_front() {
        if placed.contains_key(&wedge.node.id) {
            continue;
        }
        let radius = wedge.depth as f64 * config.radial_step;
        let position = if wedge.depth == 0 {
            Position::default()
        } else {
            Position::new(radius * wedge.angle.cos(), radius * wedge.angle.sin())
        };
        placed.insert(wedge.node.id.clone(), (position, wedge.depth));

        if config.collapsed_ids.contains(&wedge.node.id) {
            continue;
        }
        let visible: Vec<&Node> = wedge
            .node
            .children
            .iter()
            .filter(|id| !hidden.contains(*id))
            .filter_map(|id| tree.get(id.as_str()))
            .collect();
        if visible.is_empty() {
            continue;
        }

        let child_range = wedge.range / visible.len() as f64;
        let start = wedge.angle - wedge.range / 2.0;
        for (index, child) in visible.into_iter().enumerate() {
            if placed.contains_key(&child.id) {
                continue;
            }
            queue.push_back(Wedge {
                node: child,
                depth: wedge.depth + 1,
                angle: start + child_range * (index as f64 + 0.5),
                range: child_range,
            });
        }
    }

    let nodes: Vec<PositionedNode> = tree
        .nodes
        .values()
        .filter_map(|node| {
            placed.get(&node.id).map(|(position, depth)| {
                PositionedNode::from_node(node, *position, *depth, &config.collapsed_ids)
            })
        })
        .collect();

    let placed_ids: HashSet<NodeId> = placed.into_keys().collect();
    LayoutResult {
        nodes,
        edges: tree_edges(tree, &hidden, &placed_ids),
        diagnostics: Vec::new(),
    }
}
