//! Layout configuration and its validation errors.
//!
//! # Responsibility
//! - Describe which engine runs and with which spacing constants.
//! - Reject configurations the engines cannot place nodes with.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - A config that passed `validate` never makes an engine divide by zero.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Layout configuration errors.
#[derive(Debug)]
pub enum LayoutError {
    /// Layout key outside `hierarchical|radial|temporal|quadrant`.
    UnknownLayout(String),
    /// Spacing value that is zero, negative or non-finite.
    InvalidSpacing { field: &'static str, value: f64 },
    /// Configuration document failed to decode.
    InvalidConfig(serde_json::Error),
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLayout(value) => write!(
                f,
                "unsupported layout `{value}`; expected hierarchical|radial|temporal|quadrant"
            ),
            Self::InvalidSpacing { field, value } => {
                write!(f, "layout spacing `{field}` must be positive and finite, got {value}")
            }
            Self::InvalidConfig(err) => write!(f, "invalid layout config: {err}"),
        }
    }
}

impl Error for LayoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfig(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidConfig(value)
    }
}

/// Layout engine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayoutKind {
    #[default]
    Hierarchical,
    Radial,
    /// Objectives roadmap ordered by before/after links.
    Temporal,
    /// Impact/effort matrix.
    Quadrant,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::Radial => "radial",
            Self::Temporal => "temporal",
            Self::Quadrant => "quadrant",
        }
    }
}

impl Display for LayoutKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hierarchical" | "tree" => Ok(Self::Hierarchical),
            "radial" => Ok(Self::Radial),
            "temporal" | "roadmap" => Ok(Self::Temporal),
            "quadrant" | "matrix" => Ok(Self::Quadrant),
            _ => Err(LayoutError::UnknownLayout(value.to_string())),
        }
    }
}

impl TryFrom<String> for LayoutKind {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LayoutKind> for String {
    fn from(value: LayoutKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Depth grows along x.
    #[default]
    Horizontal,
    /// Depth grows along y.
    Vertical,
}

/// Base distances of the hierarchical engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    /// Distance unit between depth tiers.
    pub primary: f64,
    /// Distance unit between siblings of one tier.
    pub secondary: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            primary: 300.0,
            secondary: 120.0,
        }
    }
}

/// Constants of the temporal (roadmap) engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemporalParams {
    pub node_spacing: f64,
    pub vertical_spacing: f64,
    pub child_spacing: f64,
    pub min_distance: f64,
    pub max_attempts: u32,
    pub related_offset_x: f64,
    pub related_stack_y: f64,
}

impl Default for TemporalParams {
    fn default() -> Self {
        Self {
            node_spacing: 350.0,
            vertical_spacing: 200.0,
            child_spacing: 350.0,
            min_distance: 280.0,
            max_attempts: 20,
            related_offset_x: 500.0,
            related_stack_y: 100.0,
        }
    }
}

/// Canvas and card dimensions of the quadrant engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatrixBounds {
    pub width: f64,
    pub height: f64,
    pub card_width: f64,
    pub card_height: f64,
    pub grid_step: f64,
}

impl Default for MatrixBounds {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            card_width: 180.0,
            card_height: 100.0,
            grid_step: 15.0,
        }
    }
}

/// Full layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub layout: LayoutKind,
    pub orientation: Orientation,
    pub spacing: Spacing,
    /// Nodes whose descendants are hidden. The nodes themselves stay visible.
    pub collapsed_ids: BTreeSet<NodeId>,
    /// Ring distance per depth level of the radial engine.
    pub radial_step: f64,
    pub temporal: TemporalParams,
    pub matrix: MatrixBounds,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::default(),
            orientation: Orientation::default(),
            spacing: Spacing::default(),
            collapsed_ids: BTreeSet::new(),
            radial_step: 200.0,
            temporal: TemporalParams::default(),
            matrix: MatrixBounds::default(),
        }
    }
}

impl LayoutConfig {
    pub fn for_kind(layout: LayoutKind) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Decodes and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_collapsed<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.collapsed_ids
            .extend(ids.into_iter().map(|id| NodeId::parse(id.as_ref())));
        self
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let checks = [
            ("spacing.primary", self.spacing.primary),
            ("spacing.secondary", self.spacing.secondary),
            ("radialStep", self.radial_step),
            ("temporal.nodeSpacing", self.temporal.node_spacing),
            ("temporal.verticalSpacing", self.temporal.vertical_spacing),
            ("temporal.childSpacing", self.temporal.child_spacing),
            ("temporal.minDistance", self.temporal.min_distance),
            ("temporal.relatedStackY", self.temporal.related_stack_y),
            ("matrix.width", self.matrix.width),
            ("matrix.height", self.matrix.height),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidSpacing { field, value });
            }
        }

        let non_negative = [
            ("temporal.relatedOffsetX", self.temporal.related_offset_x),
            ("matrix.cardWidth", self.matrix.card_width),
            ("matrix.cardHeight", self.matrix.card_height),
            ("matrix.gridStep", self.matrix.grid_step),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidSpacing { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutConfig, LayoutError, LayoutKind, Orientation};

    #[test]
    fn empty_document_yields_defaults() {
        let config = LayoutConfig::from_json("{}").expect("defaults should validate");
        assert_eq!(config, LayoutConfig::default());
        assert_eq!(config.spacing.primary, 300.0);
        assert_eq!(config.temporal.max_attempts, 20);
    }

    #[test]
    fn unknown_layout_key_is_rejected() {
        assert!(matches!(
            "spiral".parse::<LayoutKind>(),
            Err(LayoutError::UnknownLayout(value)) if value == "spiral"
        ));
        let err = LayoutConfig::from_json(r#"{"layout":"spiral"}"#)
            .expect_err("unknown layout must fail");
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
        assert!(err.to_string().contains("spiral"));
    }

    #[test]
    fn aliases_map_to_engines() {
        assert_eq!("Roadmap".parse::<LayoutKind>().ok(), Some(LayoutKind::Temporal));
        assert_eq!("matrix".parse::<LayoutKind>().ok(), Some(LayoutKind::Quadrant));
    }

    #[test]
    fn camel_case_fields_and_collapsed_ids_decode() {
        let config = LayoutConfig::from_json(
            r#"{"layout":"radial","orientation":"vertical","collapsedIds":["a-b"],"radialStep":150}"#,
        )
        .expect("config should decode");
        assert_eq!(config.layout, LayoutKind::Radial);
        assert_eq!(config.orientation, Orientation::Vertical);
        assert!(config.collapsed_ids.iter().any(|id| id.as_str() == "ab"));
        assert_eq!(config.radial_step, 150.0);
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        let mut config = LayoutConfig::default();
        config.spacing.secondary = 0.0;
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidSpacing { field: "spacing.secondary", .. })
        ));

        config.spacing.secondary = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn collapsed_sentinel_survives_both_entry_points() {
        let built = LayoutConfig::default().with_collapsed(["virtual-root", "a-b"]);
        let decoded = LayoutConfig::from_json(r#"{"collapsedIds": ["virtual-root", "a-b"]}"#)
            .expect("config should decode");
        assert_eq!(built.collapsed_ids, decoded.collapsed_ids);
        assert!(built.collapsed_ids.iter().any(|id| id.is_virtual_root()));
    }
}
