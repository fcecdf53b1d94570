//! Raw workspace record shapes as delivered by the fetch collaborator.
//!
//! Property bags are kept as untyped JSON and decoded per property on demand,
//! so one malformed property never invalidates the surrounding record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One external record (a database page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
            created_time: None,
            last_edited_time: None,
            url: None,
        }
    }

    /// Decodes one named property; missing or malformed values yield `None`.
    pub fn property(&self, name: &str) -> Option<RawProperty> {
        let value = self.properties.get(name)?;
        RawProperty::deserialize(value).ok()
    }

    /// Decodes the first property present among `names`, in order.
    pub fn first_property(&self, names: &[&str]) -> Option<RawProperty> {
        names.iter().find_map(|name| self.property(name))
    }
}

/// Typed view over one property value.
///
/// Only the value shapes the normalizer understands are modelled; unknown
/// keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawProperty {
    #[serde(default)]
    pub title: Option<Vec<RichText>>,
    #[serde(default)]
    pub rich_text: Option<Vec<RichText>>,
    #[serde(default)]
    pub relation: Option<Vec<RelationRef>>,
    #[serde(default)]
    pub select: Option<SelectOption>,
    #[serde(default)]
    pub status: Option<SelectOption>,
    #[serde(default)]
    pub multi_select: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub number: Option<f64>,
}

impl RawProperty {
    /// Concatenated text of a title or rich-text property, trimmed.
    ///
    /// Returns `None` when the property carries no text or only whitespace.
    pub fn plain_text(&self) -> Option<String> {
        let fragments = self.title.as_ref().or(self.rich_text.as_ref())?;
        let text = fragments
            .iter()
            .map(|fragment| fragment.plain_text.as_str())
            .collect::<String>();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Name of a status or select option, preferring `status`.
    pub fn option_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .or(self.select.as_ref())
            .map(|option| option.name.trim())
            .filter(|name| !name.is_empty())
    }

    /// Option name or, failing that, plain text.
    pub fn text_value(&self) -> Option<String> {
        self.option_name()
            .map(str::to_string)
            .or_else(|| self.plain_text())
    }

    pub fn relation_ids(&self) -> Option<impl Iterator<Item = &str> + '_> {
        self.relation
            .as_ref()
            .map(|items| items.iter().map(|item| item.id.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// One paginated query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<RawRecord>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Concatenates page results in fetch order.
pub fn concat_pages(pages: impl IntoIterator<Item = QueryPage>) -> Vec<RawRecord> {
    pages.into_iter().flat_map(|page| page.results).collect()
}
