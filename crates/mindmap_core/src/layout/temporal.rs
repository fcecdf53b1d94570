//! Roadmap layout ordered by `after` dependencies.
//!
//! # Responsibility
//! - Derive a horizontal order from a depth-first topological sort over
//!   `after_ids`, reporting every link that closes a cycle.
//! - Place children under their parent and push colliding nodes sideways.
//! - Attach referenced secondary-collection nodes beside their referrers.
//!
//! # Invariants
//! - Every primary node appears exactly once in the order, cycles included.
//! - Nodes on the same level end at least `min_distance` apart unless a
//!   `CollisionUnresolved` diagnostic names them.

use super::config::{LayoutConfig, TemporalParams};
use super::style::{LayoutEdge, RelationKind};
use super::{hidden_nodes, LayoutDiagnostic, LayoutResult, Position, PositionedNode};
use crate::hierarchy::builder::depth_in;
use crate::hierarchy::Tree;
use crate::model::node::{Node, NodeId, NodeMap};
use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Topological order plus the `after` links skipped to break cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    pub order: Vec<NodeId>,
    /// `(from, to)`: `from` lists `to` in its after ids.
    pub cycles: Vec<(NodeId, NodeId)>,
}

/// Depth-first topological sort over `after_ids`.
///
/// Nodes nobody lists as an `after` dependency seed the walk, then every
/// remaining node in input order. References to unknown ids are ignored.
pub fn topological_order(nodes: &[Node]) -> TopologicalOrder {
    let index: HashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let referenced: HashSet<&str> = nodes
        .iter()
        .flat_map(|node| node.after_ids.iter().map(NodeId::as_str))
        .collect();

    let mut walk = TopoWalk {
        index: &index,
        visiting: HashSet::new(),
        visited: HashSet::new(),
        result: TopologicalOrder::default(),
    };
    let seeds = nodes
        .iter()
        .filter(|node| !referenced.contains(node.id.as_str()))
        .chain(nodes.iter());
    for node in seeds {
        walk.visit(node, None);
    }
    walk.result
}

struct TopoWalk<'a> {
    index: &'a HashMap<&'a str, &'a Node>,
    visiting: HashSet<&'a str>,
    visited: HashSet<&'a str>,
    result: TopologicalOrder,
}

impl<'a> TopoWalk<'a> {
    fn visit(&mut self, node: &'a Node, from: Option<&'a NodeId>) {
        let id = node.id.as_str();
        if self.visiting.contains(id) {
            if let Some(from) = from {
                self.result.cycles.push((from.clone(), node.id.clone()));
            }
            return;
        }
        if self.visited.contains(id) {
            return;
        }

        self.visiting.insert(id);
        for after in &node.after_ids {
            if let Some(dependency) = self.index.get(after.as_str()).copied() {
                self.visit(dependency, Some(&node.id));
            }
        }
        self.visiting.remove(id);
        self.visited.insert(id);
        self.result.order.push(node.id.clone());
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    position: Position,
    level: usize,
}

/// Insertion-ordered placements.
#[derive(Default)]
struct Placements {
    order: Vec<NodeId>,
    by_id: HashMap<NodeId, Placement>,
}

impl Placements {
    fn insert(&mut self, id: NodeId, placement: Placement) {
        if self.by_id.insert(id.clone(), placement).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: &str) -> Option<Placement> {
        self.by_id.get(id).copied()
    }

    fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn crowds(&self, x: f64, level: usize, min_distance: f64) -> bool {
        self.by_id
            .values()
            .any(|placed| placed.level == level && (placed.position.x - x).abs() < min_distance)
    }
}

pub fn layout(tree: &Tree, related: Option<&NodeMap>, config: &LayoutConfig) -> LayoutResult {
    let params = &config.temporal;
    let hidden = hidden_nodes(tree, &config.collapsed_ids);

    // Children of the virtual root are roadmap roots.
    let primary: Vec<Node> = tree
        .real_nodes()
        .filter(|node| !hidden.contains(&node.id))
        .map(|node| {
            let mut node = node.clone();
            if node.parent_id.as_ref().is_some_and(NodeId::is_virtual_root) {
                node.parent_id = None;
            }
            node
        })
        .collect();
    if primary.is_empty() {
        return LayoutResult::default();
    }

    let secondary = related_nodes(&primary, related);
    let all: NodeMap = primary
        .iter()
        .chain(secondary.iter())
        .cloned()
        .collect();

    let topo = topological_order(&primary);
    let mut diagnostics: Vec<LayoutDiagnostic> = topo
        .cycles
        .iter()
        .map(|(from, to)| LayoutDiagnostic::TemporalCycle {
            from: from.clone(),
            to: to.clone(),
        })
        .collect();
    if !topo.cycles.is_empty() {
        warn!(
            "event=temporal_layout module=layout status=warn reason=after_cycle skipped_links={}",
            topo.cycles.len()
        );
    }

    let slot: HashMap<&NodeId, f64> = topo
        .order
        .iter()
        .enumerate()
        .map(|(index, id)| (id, index as f64 * params.node_spacing))
        .collect();

    let mut by_level: BTreeMap<usize, Vec<&Node>> = BTreeMap::new();
    for id in &topo.order {
        if let Some(node) = all.get(id.as_str()) {
            by_level
                .entry(depth_in(&all, id.as_str()))
                .or_default()
                .push(node);
        }
    }

    let mut placements = Placements::default();
    for (level, level_nodes) in &by_level {
        for siblings in group_by_parent(level_nodes) {
            for (index, node) in siblings.iter().enumerate() {
                let parent = node
                    .parent()
                    .and_then(|parent| placements.get(parent.as_str()));
                let preferred = match parent {
                    Some(parent) if siblings.len() == 1 => parent.position.x,
                    Some(parent) => {
                        let span = (siblings.len() - 1) as f64 * params.child_spacing;
                        parent.position.x - span / 2.0 + index as f64 * params.child_spacing
                    }
                    None => slot.get(&node.id).copied().unwrap_or(0.0),
                };

                let (x, resolved) = avoid_collision(preferred, *level, &placements, params);
                if !resolved {
                    diagnostics.push(LayoutDiagnostic::CollisionUnresolved {
                        id: node.id.clone(),
                    });
                }
                placements.insert(
                    node.id.clone(),
                    Placement {
                        position: Position::new(x, *level as f64 * params.vertical_spacing),
                        level: *level,
                    },
                );
            }
        }
    }

    place_related(&primary, &secondary, &mut placements, params);

    let nodes: Vec<PositionedNode> = placements
        .order
        .iter()
        .filter_map(|id| {
            let node = all.get(id.as_str())?;
            let placement = placements.get(id.as_str())?;
            Some(PositionedNode::from_node(
                node,
                placement.position,
                placement.level,
                &config.collapsed_ids,
            ))
        })
        .collect();

    LayoutResult {
        nodes,
        edges: roadmap_edges(&primary, &all, &placements),
        diagnostics,
    }
}

/// Secondary-collection nodes referenced through `problem_ids`, first
/// reference order, excluding ids already in the primary set.
fn related_nodes(primary: &[Node], related: Option<&NodeMap>) -> Vec<Node> {
    let Some(related) = related else {
        return Vec::new();
    };
    let primary_ids: HashSet<&str> = primary.iter().map(|node| node.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for problem_id in primary.iter().flat_map(|node| node.problem_ids.iter()) {
        if primary_ids.contains(problem_id.as_str()) || !seen.insert(problem_id.as_str()) {
            continue;
        }
        if let Some(node) = related.get(problem_id.as_str()) {
            let mut node = node.clone();
            node.is_objective = false;
            nodes.push(node);
        }
    }
    nodes
}

/// Groups nodes of one level by parent, keeping first-appearance order.
fn group_by_parent<'a>(nodes: &[&'a Node]) -> Vec<Vec<&'a Node>> {
    let mut keys: Vec<Option<&NodeId>> = Vec::new();
    let mut groups: Vec<Vec<&Node>> = Vec::new();
    for &node in nodes {
        let key = node.parent();
        match keys.iter().position(|existing| *existing == key) {
            Some(slot) => groups[slot].push(node),
            None => {
                keys.push(key);
                groups.push(vec![node]);
            }
        }
    }
    groups
}

/// Tries the preferred x, then alternates right and left in growing
/// `min_distance` steps, testing `max_attempts` moves in total. Returns the
/// last tested candidate and `false` when every one of them collides.
fn avoid_collision(
    preferred: f64,
    level: usize,
    placements: &Placements,
    params: &TemporalParams,
) -> (f64, bool) {
    let mut candidate = preferred;
    for attempt in 0..=params.max_attempts {
        if attempt > 0 {
            let step = f64::from((attempt - 1) / 2 + 1) * params.min_distance;
            candidate = if attempt % 2 == 1 {
                preferred + step
            } else {
                preferred - step
            };
        }
        if !placements.crowds(candidate, level, params.min_distance) {
            return (candidate, true);
        }
    }
    (candidate, false)
}

fn place_related(
    primary: &[Node],
    related: &[Node],
    placements: &mut Placements,
    params: &TemporalParams,
) {
    let mut stacked: HashMap<&NodeId, usize> = HashMap::new();
    for node in related {
        if placements.contains(node.id.as_str()) {
            continue;
        }
        let anchor = primary.iter().find_map(|candidate| {
            if !candidate.problem_ids.contains(&node.id) {
                return None;
            }
            placements
                .get(candidate.id.as_str())
                .map(|placement| (&candidate.id, placement))
        });
        let Some((anchor_id, anchor)) = anchor else {
            continue;
        };

        let slot = stacked.entry(anchor_id).or_insert(0);
        let position = Position::new(
            anchor.position.x + params.related_offset_x,
            anchor.position.y + *slot as f64 * params.related_stack_y,
        );
        *slot += 1;
        placements.insert(
            node.id.clone(),
            Placement {
                position,
                level: anchor.level,
            },
        );
    }
}

fn roadmap_edges(primary: &[Node], all: &NodeMap, placements: &Placements) -> Vec<LayoutEdge> {
    let placed = |id: &NodeId| {
        all.get(id.as_str())
            .filter(|_| placements.contains(id.as_str()))
    };

    let mut edges = Vec::new();
    for node in primary {
        if !placements.contains(node.id.as_str()) {
            continue;
        }
        if let Some(parent) = node.parent().and_then(placed) {
            edges.push(LayoutEdge::between(
                format!("parent-{}-{}", parent.id, node.id),
                &parent.id,
                node,
                RelationKind::ParentChild,
            ));
        }
        for after in node.after_ids.iter().filter_map(placed) {
            edges.push(LayoutEdge::between(
                format!("after-{}-{}", after.id, node.id),
                &after.id,
                node,
                RelationKind::After,
            ));
        }
        for before in node.before_ids.iter().filter_map(placed) {
            edges.push(LayoutEdge::between(
                format!("before-{}-{}", node.id, before.id),
                &node.id,
                before,
                RelationKind::Before,
            ));
        }
        for problem in node.problem_ids.iter().filter_map(placed) {
            edges.push(LayoutEdge::between(
                format!("objective-problem-{}-{}", node.id, problem.id),
                &node.id,
                problem,
                RelationKind::CrossReference,
            ));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::{avoid_collision, topological_order, Placement, Placements};
    use crate::layout::{Position, TemporalParams};
    use crate::model::node::{Node, NodeId};

    fn node(id: &str, after: &[&str]) -> Node {
        let mut node = Node::new(NodeId::new(id), id.to_uppercase());
        node.after_ids = after.iter().map(|id| NodeId::new(id)).collect();
        node
    }

    fn ids(order: &[NodeId]) -> Vec<&str> {
        order.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let order = topological_order(&[node("c", &["b"]), node("b", &["a"]), node("a", &[])]);
        assert_eq!(ids(&order.order), vec!["a", "b", "c"]);
        assert!(order.cycles.is_empty());
    }

    #[test]
    fn two_node_cycle_places_both_once_and_reports_link() {
        let order = topological_order(&[node("a", &["b"]), node("b", &["a"])]);
        assert_eq!(ids(&order.order), vec!["b", "a"]);
        assert_eq!(order.cycles, vec![(NodeId::new("b"), NodeId::new("a"))]);
    }

    #[test]
    fn unknown_after_ids_are_ignored() {
        let order = topological_order(&[node("a", &["ghost"])]);
        assert_eq!(ids(&order.order), vec!["a"]);
        assert!(order.cycles.is_empty());
    }

    #[test]
    fn collision_moves_right_then_left() {
        let params = TemporalParams::default();
        let mut placements = Placements::default();
        placements.insert(
            NodeId::new("x"),
            Placement {
                position: Position::new(0.0, 0.0),
                level: 0,
            },
        );
        assert_eq!(avoid_collision(0.0, 0, &placements, &params), (280.0, true));
        // Another level does not collide.
        assert_eq!(avoid_collision(0.0, 1, &placements, &params), (0.0, true));

        placements.insert(
            NodeId::new("y"),
            Placement {
                position: Position::new(280.0, 0.0),
                level: 0,
            },
        );
        assert_eq!(avoid_collision(0.0, 0, &placements, &params), (-280.0, true));
    }

    #[test]
    fn exhausted_attempts_are_reported() {
        let params = TemporalParams {
            max_attempts: 1,
            ..TemporalParams::default()
        };
        let mut placements = Placements::default();
        for (id, x) in [("x", 0.0), ("y", 280.0), ("z", -280.0)] {
            placements.insert(
                NodeId::new(id),
                Placement {
                    position: Position::new(x, 0.0),
                    level: 0,
                },
            );
        }
        let (_, resolved) = avoid_collision(0.0, 0, &placements, &params);
        assert!(!resolved);
    }

    #[test]
    fn unresolved_position_is_one_that_was_tested() {
        let params = TemporalParams {
            max_attempts: 1,
            ..TemporalParams::default()
        };
        let mut placements = Placements::default();
        for (id, x) in [("x", 0.0), ("y", 280.0)] {
            placements.insert(
                NodeId::new(id),
                Placement {
                    position: Position::new(x, 0.0),
                    level: 0,
                },
            );
        }
        // Only 0 and +280 fit in one move; both are taken, -280 is never tried.
        assert_eq!(avoid_collision(0.0, 0, &placements, &params), (280.0, false));

        let params = TemporalParams {
            max_attempts: 2,
            ..params
        };
        assert_eq!(avoid_collision(0.0, 0, &placements, &params), (-280.0, true));
    }
}
