//! Node domain model.
//!
//! # Responsibility
//! - Define the uniform node shape every source collection is normalized into.
//! - Own node identity through the insertion-ordered `NodeMap`.
//!
//! # Invariants
//! - `NodeId` values are canonical: UUID-shaped ids carry no separators and
//!   are lowercase, so two formatting conventions map to one key.
//! - `Node::children` never contains the node's own id and never repeats an id.
//! - `NodeMap` iteration order is insertion order (source batch order).

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Sentinel id of the synthesized root that groups disconnected roots.
pub const VIRTUAL_ROOT_ID: &str = "virtual-root";

/// Placeholder title for records without any usable title property.
pub const UNTITLED: &str = "Untitled";

/// Canonical external record identifier.
///
/// Deserialization canonicalizes too, so ids read back from caches or
/// configuration files compare equal to freshly ingested ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Canonicalizes one raw id.
    ///
    /// UUIDs in hyphenated, simple or braced form become 32 lowercase hex
    /// digits. Anything else is trimmed and stripped of `-` separators.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(uuid) = Uuid::parse_str(trimmed) {
            return Self(uuid.simple().to_string());
        }
        Self(trimmed.replace('-', ""))
    }

    /// Canonicalizes an id supplied by a caller, where the virtual root
    /// sentinel may appear. Ingested record ids go through [`NodeId::new`].
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == VIRTUAL_ROOT_ID {
            return Self::virtual_root();
        }
        Self::new(raw)
    }

    /// Returns the fixed id of the synthesized virtual root.
    pub fn virtual_root() -> Self {
        Self(VIRTUAL_ROOT_ID.to_string())
    }

    pub fn is_virtual_root(&self) -> bool {
        self.0 == VIRTUAL_ROOT_ID
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Workflow state shared by every collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Source collection a batch of records was fetched from.
///
/// The collection drives property-name lookup defaults, the fallback root
/// policy of the tree builder, and the `is_objective` styling tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Problems,
    Objectives,
    Other,
}

impl CollectionKind {
    /// Stable key used for cache entries and CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Problems => "problems",
            Self::Objectives => "objectives",
            Self::Other => "other",
        }
    }

    /// Singular display noun, e.g. `Problem`.
    pub fn display_singular(self) -> &'static str {
        match self {
            Self::Problems => "Problem",
            Self::Objectives => "Objective",
            Self::Other => "Item",
        }
    }

    pub fn display_plural(self) -> &'static str {
        match self {
            Self::Problems => "problems",
            Self::Objectives => "objectives",
            Self::Other => "items",
        }
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = ParseCollectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "problems" | "problem" => Ok(Self::Problems),
            "objectives" | "objective" => Ok(Self::Objectives),
            "other" => Ok(Self::Other),
            other => Err(ParseCollectionError(other.to_string())),
        }
    }
}

/// Unknown collection key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCollectionError(pub String);

impl Display for ParseCollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported collection `{}`; expected problems|objectives|other",
            self.0
        )
    }
}

impl Error for ParseCollectionError {}

/// Normalized hierarchical item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub description: Option<String>,
    /// Logical parent. First entry of `parent_ids` at ingestion time.
    pub parent_id: Option<NodeId>,
    pub parent_ids: Vec<NodeId>,
    /// Append-only, deduplicated child list.
    pub children: Vec<NodeId>,
    pub status: Option<NodeStatus>,
    pub priority: Option<Priority>,
    /// Raw score; clamped to `[0, 10]` only by consumers.
    pub impact: Option<f64>,
    pub effort: Option<f64>,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub period: Option<String>,
    pub before_ids: Vec<NodeId>,
    pub after_ids: Vec<NodeId>,
    pub problem_ids: Vec<NodeId>,
    pub objective_ids: Vec<NodeId>,
    pub solution_ids: Vec<NodeId>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub notion_url: Option<String>,
    /// Secondary tracker id (for example a ClickUp task id), pass-through.
    pub external_ref: Option<String>,
    pub is_objective: bool,
}

impl Node {
    /// Creates a node with every optional field empty.
    pub fn new(id: NodeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            parent_id: None,
            parent_ids: Vec::new(),
            children: Vec::new(),
            status: None,
            priority: None,
            impact: None,
            effort: None,
            tags: Vec::new(),
            kind: None,
            period: None,
            before_ids: Vec::new(),
            after_ids: Vec::new(),
            problem_ids: Vec::new(),
            objective_ids: Vec::new(),
            solution_ids: Vec::new(),
            created_at: None,
            updated_at: None,
            notion_url: None,
            external_ref: None,
            is_objective: false,
        }
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|child| child.as_str() == id)
    }

    /// Appends one child id.
    ///
    /// Returns `false` without mutation for self references and duplicates.
    pub fn add_child(&mut self, id: &NodeId) -> bool {
        if *id == self.id || self.has_child(id.as_str()) {
            return false;
        }
        self.children.push(id.clone());
        true
    }

    /// Returns the `parent_id` unless it points at the node itself.
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent_id.as_ref().filter(|parent| **parent != self.id)
    }
}

/// Insertion-ordered node storage keyed by canonical id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, Node>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one node.
    ///
    /// An existing node with the same id is replaced in its original slot and
    /// returned.
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        if let Some(existing) = self.nodes.get_mut(node.id.as_str()) {
            return Some(std::mem::replace(existing, node));
        }
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        None
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id.as_str()).map(|node| (id, node)))
    }

    pub fn values(&self) -> impl Iterator<Item = &Node> + '_ {
        self.iter().map(|(_, node)| node)
    }
}

impl FromIterator<Node> for NodeMap {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        let mut map = Self::new();
        for node in iter {
            map.insert(node);
        }
        map
    }
}

impl Serialize for NodeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for node in self.values() {
            seq.serialize_element(node)?;
        }
        seq.end()
    }
}
