//! Relationship resolver: makes `children` and `parent_id` agree.
//!
//! # Responsibility
//! - Repair one-sided parent/child links left by partial source data.
//!
//! # Invariants
//! - `children` lists are append-only and deduplicated.
//! - `parent_id` is set-once: a non-null value is never overwritten.
//! - No self links are introduced; links to ids outside the map stay dangling.
//! - Running the resolver on its own output changes nothing.

use super::adjacency::Adjacency;
use crate::model::node::{NodeId, NodeMap};
use log::debug;
use serde::Serialize;

/// Counts of repairs applied by one resolver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub children_appended: usize,
    pub parents_assigned: usize,
}

impl ResolutionReport {
    pub fn is_noop(&self) -> bool {
        self.children_appended == 0 && self.parents_assigned == 0
    }
}

/// Symmetrizes parent/child links in place.
///
/// Forward pass, in insertion order: a node's parent learns about it, and
/// each listed child without a parent adopts the listing node. Backward pass:
/// every node whose `parent_id` names A is appended to A's children.
pub fn resolve_relationships(nodes: &mut NodeMap) -> ResolutionReport {
    let mut report = ResolutionReport::default();
    let ids: Vec<NodeId> = nodes.ids().to_vec();

    for id in &ids {
        let Some(node) = nodes.get(id.as_str()) else {
            continue;
        };
        let parent = node.parent().cloned();
        let children = node.children.clone();

        if let Some(parent_id) = parent {
            if let Some(parent) = nodes.get_mut(parent_id.as_str()) {
                if parent.add_child(id) {
                    report.children_appended += 1;
                }
            }
        }

        for child_id in children.iter().filter(|child_id| *child_id != id) {
            if let Some(child) = nodes.get_mut(child_id.as_str()) {
                if child.parent_id.is_none() {
                    child.parent_id = Some(id.clone());
                    if !child.parent_ids.contains(id) {
                        child.parent_ids.push(id.clone());
                    }
                    report.parents_assigned += 1;
                }
            }
        }
    }

    let adjacency = Adjacency::from_nodes(nodes);
    for id in &ids {
        let claimants = adjacency.claimants_of(id.as_str());
        if claimants.is_empty() {
            continue;
        }
        if let Some(node) = nodes.get_mut(id.as_str()) {
            for claimant in claimants {
                if node.add_child(claimant) {
                    report.children_appended += 1;
                }
            }
        }
    }

    debug!(
        "event=resolve_relationships module=hierarchy status=ok nodes={} children_appended={} parents_assigned={}",
        nodes.len(),
        report.children_appended,
        report.parents_assigned
    );
    report
}
