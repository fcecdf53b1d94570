//! Tree builder: selects a root and collects its descendant closure.
//!
//! # Responsibility
//! - Resolve an explicit or collection-default root id tolerant of id format.
//! - Fall back to root candidates, synthesizing a virtual root when several
//!   disconnected roots exist.
//!
//! # Invariants
//! - The input map is never mutated; the tree owns adjusted copies.
//! - `tree.nodes` is exactly the set reachable from `tree.root` via children.
//! - The root of a non-empty tree has no parent.
//! - Zero root candidates is a valid terminal state (`root == None`).

use super::adjacency::Adjacency;
use crate::model::node::{CollectionKind, Node, NodeId, NodeMap};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;

/// Root selection policy for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    pub collection: CollectionKind,
    /// Root used when the caller does not name one explicitly.
    pub default_root_id: Option<String>,
}

impl TreeOptions {
    pub fn for_collection(collection: CollectionKind) -> Self {
        Self {
            collection,
            default_root_id: None,
        }
    }

    pub fn with_default_root(mut self, root_id: impl Into<String>) -> Self {
        self.default_root_id = Some(root_id.into());
        self
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::for_collection(CollectionKind::Problems)
    }
}

/// Read-only hierarchy view derived from a resolved node map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    pub root: Option<NodeId>,
    pub nodes: NodeMap,
}

impl Tree {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref().and_then(|id| self.nodes.get(id.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has_virtual_root(&self) -> bool {
        self.root.as_ref().is_some_and(NodeId::is_virtual_root)
    }

    /// Nodes excluding the synthesized virtual root.
    pub fn real_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().filter(|node| !node.id.is_virtual_root())
    }

    /// Number of `parent_id` hops from `id` to a parentless node in the tree.
    ///
    /// Stops at parents outside the tree and at cycles.
    pub fn depth_of(&self, id: &str) -> usize {
        depth_in(&self.nodes, id)
    }
}

pub(crate) fn depth_in(nodes: &NodeMap, id: &str) -> usize {
    let mut depth = 0;
    let mut seen = HashSet::new();
    let mut cursor = nodes.get(id);
    while let Some(node) = cursor {
        if !seen.insert(node.id.as_str()) {
            break;
        }
        let Some(parent) = node.parent().and_then(|parent| nodes.get(parent.as_str())) else {
            break;
        };
        depth += 1;
        cursor = Some(parent);
    }
    depth
}

/// Builds a tree from a resolved node map.
///
/// `root_id` wins over `options.default_root_id`. When neither resolves to a
/// node, the root is chosen among parentless nodes of the working set.
pub fn build_tree(nodes: &NodeMap, root_id: Option<&str>, options: &TreeOptions) -> Tree {
    let requested = root_id
        .map(str::to_string)
        .or_else(|| options.default_root_id.clone());

    if let Some(requested) = requested {
        match find_root(nodes, &requested) {
            Some(found) => {
                let tree = rooted_tree(nodes.clone(), &found);
                info!(
                    "event=build_tree module=hierarchy status=ok mode=fixed_root collection={} nodes={}",
                    options.collection,
                    tree.len()
                );
                return tree;
            }
            None => warn!(
                "event=build_tree module=hierarchy status=warn reason=root_not_found collection={}",
                options.collection
            ),
        }
    }

    fallback_tree(nodes, options.collection)
}

/// Looks a root up by exact key, canonical key, then separator-stripped scan.
pub fn find_root(nodes: &NodeMap, raw_id: &str) -> Option<NodeId> {
    let trimmed = raw_id.trim();
    if let Some(node) = nodes.get(trimmed) {
        return Some(node.id.clone());
    }
    let canonical = NodeId::new(trimmed);
    if let Some(node) = nodes.get(canonical.as_str()) {
        return Some(node.id.clone());
    }
    let wanted = strip_separators(trimmed);
    nodes
        .ids()
        .iter()
        .find(|id| strip_separators(id.as_str()) == wanted)
        .cloned()
}

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|ch| *ch != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn fallback_tree(nodes: &NodeMap, collection: CollectionKind) -> Tree {
    let adjacency = Adjacency::from_nodes(nodes);
    let has_live_parent =
        |node: &Node| node.parent().is_some_and(|parent| nodes.contains(parent.as_str()));

    let candidates: Vec<NodeId> = nodes
        .values()
        .filter(|node| {
            collection == CollectionKind::Objectives
                || node.parent().is_some()
                || adjacency.is_claimed_parent(node.id.as_str())
                || node.children.iter().any(|child| nodes.contains(child.as_str()))
        })
        .filter(|node| !has_live_parent(node))
        .map(|node| node.id.clone())
        .collect();

    match candidates.as_slice() {
        [] => {
            info!(
                "event=build_tree module=hierarchy status=ok mode=empty collection={} nodes={}",
                collection,
                nodes.len()
            );
            Tree::empty()
        }
        [only] => {
            let tree = rooted_tree(nodes.clone(), only);
            info!(
                "event=build_tree module=hierarchy status=ok mode=single_root collection={} nodes={}",
                collection,
                tree.len()
            );
            tree
        }
        many => {
            let mut scope = nodes.clone();
            let virtual_id = NodeId::virtual_root();
            let mut virtual_root = Node::new(
                virtual_id.clone(),
                format!("{} Hierarchy", collection.display_singular()),
            );
            virtual_root.description =
                Some(format!("{} root {}", many.len(), collection.display_plural()));
            virtual_root.children = many.to_vec();
            virtual_root.is_objective = collection == CollectionKind::Objectives;

            for id in many {
                if let Some(candidate) = scope.get_mut(id.as_str()) {
                    candidate.parent_id = Some(virtual_id.clone());
                }
            }
            scope.insert(virtual_root);

            let tree = rooted_tree(scope, &virtual_id);
            info!(
                "event=build_tree module=hierarchy status=ok mode=virtual_root collection={} roots={} nodes={}",
                collection,
                many.len(),
                tree.len()
            );
            tree
        }
    }
}

fn rooted_tree(mut scope: NodeMap, root_id: &NodeId) -> Tree {
    if let Some(root) = scope.get_mut(root_id.as_str()) {
        root.parent_id = None;
    }

    let adjacency = Adjacency::from_nodes(&scope);
    let mut visited = HashSet::new();
    let mut closure = NodeMap::new();
    collect_descendants(&scope, &adjacency, root_id, &mut visited, &mut closure);

    Tree {
        root: Some(root_id.clone()),
        nodes: closure,
    }
}

fn collect_descendants(
    scope: &NodeMap,
    adjacency: &Adjacency,
    id: &NodeId,
    visited: &mut HashSet<NodeId>,
    closure: &mut NodeMap,
) {
    if !visited.insert(id.clone()) {
        return;
    }
    let Some(node) = scope.get(id.as_str()) else {
        return;
    };
    closure.insert(node.clone());

    for child in &node.children {
        collect_descendants(scope, adjacency, child, visited, closure);
    }

    // Nodes pointing at `id` through `parent_id` without being listed.
    for claimant in adjacency.claimants_of(id.as_str()) {
        if visited.contains(claimant) {
            continue;
        }
        if let Some(current) = closure.get_mut(id.as_str()) {
            current.add_child(claimant);
        }
        collect_descendants(scope, adjacency, claimant, visited, closure);
    }
}

#[cfg(test)]
mod tests {
    use super::{build_tree, find_root, TreeOptions};
    use crate::model::node::{CollectionKind, Node, NodeId, NodeMap};

    fn node(id: &str, parent: Option<&str>, children: &[&str]) -> Node {
        let mut node = Node::new(NodeId::new(id), id.to_uppercase());
        node.parent_id = parent.map(NodeId::new);
        node.children = children.iter().map(|child| NodeId::new(child)).collect();
        node
    }

    #[test]
    fn find_root_tolerates_both_id_formats() {
        let id = "269c2345-ab46-819c-9b6c-e2eda20aba4c";
        let nodes: NodeMap = vec![node(id, None, &[])].into_iter().collect();
        assert!(find_root(&nodes, id).is_some());
        assert!(find_root(&nodes, &id.replace('-', "")).is_some());
        assert!(find_root(&nodes, "missing").is_none());
    }

    #[test]
    fn fixed_root_clears_parent_and_backfills_claimants() {
        let nodes: NodeMap = vec![
            node("r", Some("above"), &["a"]),
            node("a", Some("r"), &[]),
            node("b", Some("r"), &[]),
            node("above", None, &["r"]),
        ]
        .into_iter()
        .collect();

        let tree = build_tree(&nodes, Some("r"), &TreeOptions::default());
        let root = tree.root().expect("root");
        assert_eq!(root.parent_id, None);
        assert_eq!(root.children, vec![NodeId::new("a"), NodeId::new("b")]);
        assert_eq!(tree.len(), 3);
        assert!(tree.get("above").is_none());
        // The input map is untouched.
        assert_eq!(nodes.get("r").and_then(|n| n.parent_id.clone()), Some(NodeId::new("above")));
    }

    #[test]
    fn unknown_explicit_root_falls_back_to_candidates() {
        let nodes: NodeMap = vec![node("a", None, &["b"]), node("b", Some("a"), &[])]
            .into_iter()
            .collect();
        let tree = build_tree(&nodes, Some("nope"), &TreeOptions::default());
        assert_eq!(tree.root, Some(NodeId::new("a")));
    }

    #[test]
    fn isolated_nodes_do_not_form_a_problem_tree() {
        let nodes: NodeMap = vec![node("a", None, &[]), node("b", None, &[])]
            .into_iter()
            .collect();
        let tree = build_tree(&nodes, None, &TreeOptions::default());
        assert!(tree.is_empty());
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn objectives_include_isolated_nodes() {
        let nodes: NodeMap = vec![node("a", None, &[]), node("b", None, &[])]
            .into_iter()
            .collect();
        let tree = build_tree(
            &nodes,
            None,
            &TreeOptions::for_collection(CollectionKind::Objectives),
        );
        assert!(tree.has_virtual_root());
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.real_nodes().count(), 2);
    }

    #[test]
    fn dangling_parent_counts_as_root_candidate() {
        let nodes: NodeMap = vec![node("a", Some("gone"), &["b"]), node("b", Some("a"), &[])]
            .into_iter()
            .collect();
        let tree = build_tree(&nodes, None, &TreeOptions::default());
        assert_eq!(tree.root, Some(NodeId::new("a")));
        assert_eq!(tree.root().and_then(|root| root.parent_id.clone()), None);
        assert_eq!(tree.depth_of("b"), 1);
    }

    #[test]
    fn parent_cycle_without_entry_point_is_excluded() {
        let nodes: NodeMap = vec![
            node("r", None, &["x"]),
            node("x", Some("r"), &[]),
            node("c1", Some("c2"), &["c2"]),
            node("c2", Some("c1"), &["c1"]),
        ]
        .into_iter()
        .collect();
        let tree = build_tree(&nodes, None, &TreeOptions::default());
        assert_eq!(tree.root, Some(NodeId::new("r")));
        assert!(tree.get("c1").is_none());
    }
}
