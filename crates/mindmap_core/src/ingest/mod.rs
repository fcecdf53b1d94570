//! Ingestion of raw workspace records into normalized nodes.
//!
//! # Responsibility
//! - Decode exported record batches (plain arrays or paginated responses).
//! - Normalize records into the uniform node model.
//!
//! # Invariants
//! - A malformed individual record is skipped with a warning; only malformed
//!   top-level JSON fails the batch.

pub mod keywords;
pub mod normalizer;

use crate::model::record::RawRecord;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use normalizer::{normalize_batch, normalize_record};

/// Errors from decoding a record batch.
#[derive(Debug)]
pub enum IngestError {
    /// Input is not valid JSON.
    InvalidJson(serde_json::Error),
    /// Input is JSON but neither a record list nor a query page.
    UnexpectedShape(&'static str),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "record batch is not valid JSON: {err}"),
            Self::UnexpectedShape(found) => write!(
                f,
                "record batch must be an array of records or query pages, found {found}"
            ),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            Self::UnexpectedShape(_) => None,
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

/// Decodes a batch export into records in fetch order.
///
/// Accepted shapes: an array of records, one query page object
/// (`{"results": [...]}`), or an array of query pages.
pub fn parse_records_json(text: &str) -> Result<Vec<RawRecord>, IngestError> {
    let root: Value = serde_json::from_str(text)?;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    match root {
        Value::Array(items) => {
            for item in items {
                if let Some(results) = page_results(&item) {
                    collect_records(results, &mut records, &mut skipped);
                } else {
                    collect_records(std::slice::from_ref(&item), &mut records, &mut skipped);
                }
            }
        }
        Value::Object(_) => match page_results(&root) {
            Some(results) => collect_records(results, &mut records, &mut skipped),
            None => return Err(IngestError::UnexpectedShape("object without `results`")),
        },
        Value::Null => return Err(IngestError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(IngestError::UnexpectedShape("boolean")),
        Value::Number(_) => return Err(IngestError::UnexpectedShape("number")),
        Value::String(_) => return Err(IngestError::UnexpectedShape("string")),
    }

    if skipped > 0 {
        warn!(
            "event=parse_records module=ingest status=warn reason=malformed_record skipped={} accepted={}",
            skipped,
            records.len()
        );
    }
    Ok(records)
}

fn page_results(value: &Value) -> Option<&[Value]> {
    value
        .as_object()
        .filter(|object| !object.contains_key("properties"))
        .and_then(|object| object.get("results"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn collect_records(items: &[Value], records: &mut Vec<RawRecord>, skipped: &mut usize) {
    for item in items {
        match RawRecord::deserialize(item) {
            Ok(record) => records.push(record),
            Err(_) => *skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_records_json, IngestError};

    #[test]
    fn accepts_plain_record_array() {
        let records = parse_records_json(r#"[{"id":"a"},{"id":"b","properties":{}}]"#)
            .expect("array should parse");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn accepts_single_page_and_page_array() {
        let single = parse_records_json(r#"{"results":[{"id":"a"}],"has_more":false}"#)
            .expect("page should parse");
        assert_eq!(single.len(), 1);

        let pages = parse_records_json(
            r#"[{"results":[{"id":"a"}],"has_more":true,"next_cursor":"x"},{"results":[{"id":"b"}]}]"#,
        )
        .expect("pages should parse");
        let ids: Vec<&str> = pages.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn skips_records_without_id() {
        let records =
            parse_records_json(r#"[{"id":"a"},{"properties":{}}]"#).expect("array should parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn rejects_invalid_top_level_json() {
        assert!(matches!(
            parse_records_json("{not json"),
            Err(IngestError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_records_json("42"),
            Err(IngestError::UnexpectedShape("number"))
        ));
    }
}
