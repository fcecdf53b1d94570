//! Edge styling hints handed to renderers.

use crate::model::node::{Node, NodeId, NodeStatus};
use serde::Serialize;

/// Semantic kind of a drawn link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    ParentChild,
    /// Source comes before target on the roadmap.
    Before,
    /// Source must be done before target starts.
    After,
    /// Objective to related problem.
    CrossReference,
}

impl RelationKind {
    /// Dash pattern for the stroke; `None` draws a solid line.
    pub fn dash(self) -> Option<&'static str> {
        match self {
            Self::ParentChild => Some("5,5"),
            Self::CrossReference => Some("8,4"),
            Self::Before | Self::After => None,
        }
    }

    /// Accent colour used by roadmap renderers that colour by relation.
    pub fn accent_hex(self) -> &'static str {
        match self {
            Self::ParentChild => "#6B7280",
            Self::After => "#2563EB",
            Self::Before => "#10B981",
            Self::CrossReference => "#8B5CF6",
        }
    }

    pub fn stroke_width(self) -> u8 {
        match self {
            Self::ParentChild | Self::CrossReference => 2,
            Self::Before | Self::After => 3,
        }
    }
}

/// Colour bucket derived from the target node's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorCategory {
    Done,
    InProgress,
    Blocked,
    Todo,
}

impl ColorCategory {
    /// Missing status renders as `Todo`.
    pub fn from_status(status: Option<NodeStatus>) -> Self {
        match status {
            Some(NodeStatus::Done) => Self::Done,
            Some(NodeStatus::InProgress) => Self::InProgress,
            Some(NodeStatus::Blocked) => Self::Blocked,
            Some(NodeStatus::Todo) | None => Self::Todo,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Self::Done => "#10b981",
            Self::InProgress => "#3b82f6",
            Self::Blocked => "#ef4444",
            Self::Todo => "#6b7280",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub relation: RelationKind,
    pub color: ColorCategory,
    pub dash: Option<&'static str>,
    pub width: u8,
    pub animated: bool,
}

impl EdgeStyle {
    pub fn new(relation: RelationKind, target_status: Option<NodeStatus>) -> Self {
        Self {
            relation,
            color: ColorCategory::from_status(target_status),
            dash: relation.dash(),
            width: relation.stroke_width(),
            animated: false,
        }
    }
}

/// Directed link between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
}

impl LayoutEdge {
    pub(crate) fn between(
        id: String,
        source: &NodeId,
        target: &Node,
        relation: RelationKind,
    ) -> Self {
        Self {
            id,
            source: source.clone(),
            target: target.id.clone(),
            style: EdgeStyle::new(relation, target.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorCategory, EdgeStyle, RelationKind};
    use crate::model::node::NodeStatus;

    #[test]
    fn colour_follows_target_status() {
        let style = EdgeStyle::new(RelationKind::ParentChild, Some(NodeStatus::Blocked));
        assert_eq!(style.color.hex(), "#ef4444");
        assert_eq!(style.dash, Some("5,5"));
        assert_eq!(ColorCategory::from_status(None), ColorCategory::Todo);
    }

    #[test]
    fn ordering_links_are_solid() {
        assert_eq!(RelationKind::After.dash(), None);
        assert_eq!(RelationKind::CrossReference.dash(), Some("8,4"));
        assert_eq!(RelationKind::Before.stroke_width(), 3);
    }
}
