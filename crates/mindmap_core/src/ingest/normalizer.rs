//! Record normalizer: one raw record in, one `Node` out.
//!
//! # Responsibility
//! - Tolerate schema drift by probing ordered lists of property names.
//! - Degrade malformed or missing fields to `None`/empty, never abort a batch.
//!
//! # Invariants
//! - Pure per-record transform; no I/O.
//! - Relation lists are canonicalized, deduplicated and never self-referential.

use super::keywords::{normalize_priority, normalize_status, score_from_text};
use crate::model::node::{CollectionKind, Node, NodeId, NodeMap, UNTITLED};
use crate::model::record::{RawProperty, RawRecord};
use log::{debug, warn};

const TITLE_PROPERTIES: &[&str] = &["Title", "title", "Name", "name"];
const DESCRIPTION_PROPERTIES: &[&str] = &["Description", "Summary"];
const EXTERNAL_REF_PROPERTIES: &[&str] = &["ID", "ClickUp ID", "ClickUp_ID", "clickup_id"];
const STATUS_PROPERTIES: &[&str] = &["Status", "status"];
const PRIORITY_PROPERTIES: &[&str] = &["Priority", "priority"];
const IMPACT_PROPERTIES: &[&str] = &["Impact", "impact"];
const EFFORT_PROPERTIES: &[&str] = &["Effort", "effort"];
const TAG_PROPERTIES: &[&str] = &["Tags", "tags"];
const TYPE_PROPERTIES: &[&str] = &["Type", "type"];
const PERIOD_PROPERTIES: &[&str] = &["Period", "Quarter", "Timeframe"];

const PARENT_RELATIONS: &[&str] = &["Parent Problem", "Parent Objective", "Parent", "Parent item"];
const CHILD_RELATIONS: &[&str] = &[
    "Child Problem(s)",
    "Child Objective(s)",
    "Children",
    "Sub-item",
];
const BEFORE_RELATIONS: &[&str] = &["Before", "Comes Before"];
const AFTER_RELATIONS: &[&str] = &["After", "Comes After"];
const PROBLEM_RELATIONS: &[&str] = &["Problems", "Problem", "Related Problems"];
const OBJECTIVE_RELATIONS: &[&str] = &["Objectives", "Objective", "Related Objectives"];
const SOLUTION_RELATIONS: &[&str] = &["Solution", "Solutions"];

/// Normalizes one record.
pub fn normalize_record(record: &RawRecord, collection: CollectionKind) -> Node {
    let id = NodeId::new(&record.id);
    let title = first_text(record, TITLE_PROPERTIES).unwrap_or_else(|| UNTITLED.to_string());
    let mut node = Node::new(id, title);

    node.description = first_text(record, DESCRIPTION_PROPERTIES);
    node.external_ref = first_text(record, EXTERNAL_REF_PROPERTIES);

    node.parent_ids = relation(record, &node.id, PARENT_RELATIONS);
    node.parent_id = node.parent_ids.first().cloned();
    node.children = relation(record, &node.id, CHILD_RELATIONS);
    node.before_ids = relation(record, &node.id, BEFORE_RELATIONS);
    node.after_ids = relation(record, &node.id, AFTER_RELATIONS);
    node.problem_ids = relation(record, &node.id, PROBLEM_RELATIONS);
    node.objective_ids = relation(record, &node.id, OBJECTIVE_RELATIONS);
    node.solution_ids = relation(record, &node.id, SOLUTION_RELATIONS);

    let status_text = record
        .first_property(STATUS_PROPERTIES)
        .and_then(|property| property.option_name().map(str::to_string));
    node.status = normalize_status(status_text.as_deref());
    let priority_text = record
        .first_property(PRIORITY_PROPERTIES)
        .and_then(|property| property.text_value());
    node.priority = normalize_priority(priority_text.as_deref());

    node.impact = record.first_property(IMPACT_PROPERTIES).and_then(score);
    node.effort = record.first_property(EFFORT_PROPERTIES).and_then(score);

    node.tags = record
        .first_property(TAG_PROPERTIES)
        .and_then(|property| property.multi_select)
        .map(|options| options.into_iter().map(|option| option.name).collect())
        .unwrap_or_default();
    node.kind = record
        .first_property(TYPE_PROPERTIES)
        .and_then(|property| property.text_value());
    node.period = record
        .first_property(PERIOD_PROPERTIES)
        .and_then(|property| property.text_value());

    node.created_at = record.created_time.clone();
    node.updated_at = record.last_edited_time.clone();
    node.notion_url = record.url.clone();
    node.is_objective = collection == CollectionKind::Objectives;
    node
}

/// Normalizes a whole batch into a `NodeMap`.
///
/// Records with a blank id are skipped. A later record with an id already
/// seen replaces the earlier one.
pub fn normalize_batch(records: &[RawRecord], collection: CollectionKind) -> NodeMap {
    let mut nodes = NodeMap::new();
    let mut skipped = 0usize;
    for record in records {
        let node = normalize_record(record, collection);
        if node.id.is_empty() {
            skipped += 1;
            continue;
        }
        if nodes.insert(node).is_some() {
            warn!(
                "event=normalize_batch module=ingest status=warn reason=duplicate_id collection={}",
                collection
            );
        }
    }
    debug!(
        "event=normalize_batch module=ingest status=ok collection={} records={} nodes={} skipped={}",
        collection,
        records.len(),
        nodes.len(),
        skipped
    );
    nodes
}

fn first_text(record: &RawRecord, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| record.property(name))
        .find_map(|property| property.plain_text())
}

fn relation(record: &RawRecord, own_id: &NodeId, names: &[&str]) -> Vec<NodeId> {
    let Some(property) = names
        .iter()
        .filter_map(|name| record.property(name))
        .find(|property| property.relation.is_some())
    else {
        return Vec::new();
    };

    let mut result: Vec<NodeId> = Vec::new();
    for raw in property.relation_ids().into_iter().flatten() {
        let id = NodeId::new(raw);
        if id.is_empty() || id == *own_id || result.contains(&id) {
            continue;
        }
        result.push(id);
    }
    result
}

fn score(property: RawProperty) -> Option<f64> {
    let value = match property.number {
        Some(number) => Some(number),
        None => property.text_value().and_then(|text| score_from_text(&text)),
    };
    value.filter(|number| number.is_finite())
}
