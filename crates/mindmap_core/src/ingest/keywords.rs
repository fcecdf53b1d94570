//! Keyword classification for free-text status, priority and score fields.
//!
//! # Invariants
//! - Matching is case-insensitive substring matching.
//! - Categories are checked in declaration order; the first match wins.
//! - Present-but-unrecognized status/priority text yields the default
//!   category; absent text yields `None`.

use crate::model::node::{NodeStatus, Priority};
use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*[.):|/\-–—]+\s*").expect("valid ordinal prefix regex"));
static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("valid leading number regex"));

const STATUS_KEYWORDS: &[(NodeStatus, &[&str])] = &[
    (NodeStatus::Blocked, &["block"]),
    (
        NodeStatus::InProgress,
        &["progress", "development", "analysis", "working", "review"],
    ),
    (
        NodeStatus::Done,
        &["done", "closed", "released", "complete"],
    ),
    (
        NodeStatus::Todo,
        &["open", "todo", "to do", "backlog", "not started"],
    ),
];

const PRIORITY_KEYWORDS: &[(Priority, &[&str])] = &[
    (Priority::Low, &["low"]),
    (Priority::Medium, &["medium", "normal"]),
    (Priority::High, &["high"]),
    (Priority::Critical, &["critical", "urgent"]),
];

const SCORE_KEYWORDS: &[(f64, &[&str])] = &[
    (10.0, &["critical", "very high", "highest"]),
    (8.0, &["high"]),
    (5.0, &["medium", "moderate"]),
    (2.0, &["low"]),
    (0.0, &["none"]),
];

/// Removes a leading ordinal such as `2.` or `03 -` from option text.
pub fn strip_ordinal_prefix(text: &str) -> &str {
    match ORDINAL_PREFIX_RE.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

/// Classifies status text.
pub fn normalize_status(raw: Option<&str>) -> Option<NodeStatus> {
    let raw = raw?;
    let normalized = strip_ordinal_prefix(raw).to_lowercase();
    Some(first_match(STATUS_KEYWORDS, &normalized).unwrap_or(NodeStatus::Todo))
}

/// Classifies priority text.
pub fn normalize_priority(raw: Option<&str>) -> Option<Priority> {
    let raw = raw?;
    let normalized = strip_ordinal_prefix(raw).to_lowercase();
    Some(first_match(PRIORITY_KEYWORDS, &normalized).unwrap_or(Priority::Medium))
}

/// Converts score text (`"7"`, `"8 - High"`, `"Low"`) into a number.
///
/// A leading number wins over keywords. Unrecognized text yields `None`
/// because there is no neutral score to fall back to.
pub fn score_from_text(raw: &str) -> Option<f64> {
    if let Some(captures) = LEADING_NUMBER_RE.captures(raw) {
        if let Ok(value) = captures[1].parse::<f64>() {
            return Some(value);
        }
    }
    first_match(SCORE_KEYWORDS, &raw.to_lowercase())
}

fn first_match<T: Copy>(table: &[(T, &[&str])], haystack: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| haystack.contains(keyword)))
        .map(|(value, _)| *value)
}

#[cfg(test)]
mod tests {
    use super::{normalize_priority, normalize_status, score_from_text, strip_ordinal_prefix};
    use crate::model::node::{NodeStatus, Priority};

    #[test]
    fn status_absent_stays_undefined() {
        assert_eq!(normalize_status(None), None);
    }

    #[test]
    fn status_keywords_map_to_categories() {
        assert_eq!(normalize_status(Some("Blocked by vendor")), Some(NodeStatus::Blocked));
        assert_eq!(normalize_status(Some("In Development")), Some(NodeStatus::InProgress));
        assert_eq!(normalize_status(Some("Released")), Some(NodeStatus::Done));
        assert_eq!(normalize_status(Some("Open")), Some(NodeStatus::Todo));
    }

    #[test]
    fn status_unrecognized_text_defaults_to_todo() {
        assert_eq!(normalize_status(Some("Parked")), Some(NodeStatus::Todo));
    }

    #[test]
    fn status_ordinal_prefix_is_stripped_before_matching() {
        assert_eq!(strip_ordinal_prefix("2. In progress"), "In progress");
        assert_eq!(strip_ordinal_prefix("03 - Done"), "Done");
        assert_eq!(strip_ordinal_prefix("Done"), "Done");
        assert_eq!(normalize_status(Some("4) Analysis")), Some(NodeStatus::InProgress));
    }

    #[test]
    fn first_matching_category_wins() {
        // Contains both "block" and "progress"; blocked is checked first.
        assert_eq!(
            normalize_status(Some("Blocked, was in progress")),
            Some(NodeStatus::Blocked)
        );
    }

    #[test]
    fn priority_defaults_to_medium_for_unknown_text() {
        assert_eq!(normalize_priority(None), None);
        assert_eq!(normalize_priority(Some("P0 Urgent")), Some(Priority::Critical));
        assert_eq!(normalize_priority(Some("Low")), Some(Priority::Low));
        assert_eq!(normalize_priority(Some("whenever")), Some(Priority::Medium));
    }

    #[test]
    fn score_text_prefers_leading_number() {
        assert_eq!(score_from_text("7"), Some(7.0));
        assert_eq!(score_from_text("8 - High"), Some(8.0));
        assert_eq!(score_from_text("Very High"), Some(10.0));
        assert_eq!(score_from_text("Low"), Some(2.0));
        assert_eq!(score_from_text("unknown"), None);
    }
}
