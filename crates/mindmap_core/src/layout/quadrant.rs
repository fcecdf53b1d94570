//! Impact/effort matrix layout.
//!
//! The canvas is split into four quadrant rectangles: high impact on the top
//! row, low effort in the left column. Within a quadrant each score's distance
//! from the midpoint is mapped linearly into the card-safe area, measured
//! outward from the canvas centre, then nudged by a small grid offset so
//! cards with equal scores stay distinguishable.

use super::config::{LayoutConfig, MatrixBounds};
use super::{hidden_nodes, LayoutDiagnostic, LayoutResult, Position, PositionedNode};
use crate::hierarchy::Tree;
use serde::Serialize;
use std::collections::HashMap;

/// Score boundary. Strictly greater counts as high.
pub const MIDPOINT: f64 = 5.0;
pub const MAX_SCORE: f64 = 10.0;
/// Minimum distance between a card and its quadrant's top-left edges.
const INSET: f64 = 10.0;
const GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    HighImpactLowEffort,
    HighImpactHighEffort,
    LowImpactLowEffort,
    LowImpactHighEffort,
}

impl Quadrant {
    /// Classifies clamped scores; a score of exactly 5 is low.
    pub fn classify(impact: f64, effort: f64) -> Self {
        let high_impact = clamp_score(impact) > MIDPOINT;
        let high_effort = clamp_score(effort) > MIDPOINT;
        match (high_impact, high_effort) {
            (true, false) => Self::HighImpactLowEffort,
            (true, true) => Self::HighImpactHighEffort,
            (false, false) => Self::LowImpactLowEffort,
            (false, true) => Self::LowImpactHighEffort,
        }
    }

    pub fn is_high_impact(self) -> bool {
        matches!(self, Self::HighImpactLowEffort | Self::HighImpactHighEffort)
    }

    pub fn is_high_effort(self) -> bool {
        matches!(self, Self::HighImpactHighEffort | Self::LowImpactHighEffort)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighImpactLowEffort => "Quick Wins",
            Self::HighImpactHighEffort => "Major Projects",
            Self::LowImpactLowEffort => "Fill-ins",
            Self::LowImpactHighEffort => "Avoid",
        }
    }
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, MAX_SCORE)
}

pub fn layout(tree: &Tree, config: &LayoutConfig) -> LayoutResult {
    let hidden = hidden_nodes(tree, &config.collapsed_ids);
    let mut per_quadrant: HashMap<Quadrant, usize> = HashMap::new();
    let mut result = LayoutResult::default();

    for node in tree.nodes.values() {
        if hidden.contains(&node.id) || node.parent_id.is_none() {
            continue;
        }
        let scores = node
            .impact
            .filter(|value| value.is_finite())
            .zip(node.effort.filter(|value| value.is_finite()));
        let Some((impact, effort)) = scores else {
            result.diagnostics.push(LayoutDiagnostic::MissingScores {
                id: node.id.clone(),
            });
            continue;
        };

        let quadrant = Quadrant::classify(impact, effort);
        let slot = per_quadrant.entry(quadrant).or_insert(0);
        let position = place(
            quadrant,
            clamp_score(impact),
            clamp_score(effort),
            *slot,
            &config.matrix,
        );
        *slot += 1;

        let mut positioned = PositionedNode::from_node(
            node,
            position,
            tree.depth_of(node.id.as_str()),
            &config.collapsed_ids,
        );
        positioned.quadrant = Some(quadrant);
        result.nodes.push(positioned);
    }
    result
}

/// Canvas position of the `index`-th card of `quadrant`.
pub fn place(
    quadrant: Quadrant,
    impact: f64,
    effort: f64,
    index: usize,
    bounds: &MatrixBounds,
) -> Position {
    let cell_width = bounds.width / 2.0;
    let cell_height = bounds.height / 2.0;
    let usable_width = (cell_width - bounds.card_width).max(0.0);
    let usable_height = (cell_height - bounds.card_height).max(0.0);

    let effort_reach = (effort - MIDPOINT).abs() / MIDPOINT;
    let impact_reach = (impact - MIDPOINT).abs() / MIDPOINT;

    // Left column grows towards the centre, right column away from it.
    let local_x = if quadrant.is_high_effort() {
        effort_reach * usable_width
    } else {
        (1.0 - effort_reach) * usable_width
    };
    let local_y = if quadrant.is_high_impact() {
        (1.0 - impact_reach) * usable_height
    } else {
        impact_reach * usable_height
    };

    let column = (index % GRID_COLUMNS) as f64;
    let row = (index / GRID_COLUMNS) as f64;
    let x = keep_inside(local_x + INSET + column * bounds.grid_step, usable_width);
    let y = keep_inside(local_y + INSET + row * bounds.grid_step, usable_height);

    let origin_x = if quadrant.is_high_effort() { cell_width } else { 0.0 };
    let origin_y = if quadrant.is_high_impact() { 0.0 } else { cell_height };
    Position::new(origin_x + x, origin_y + y)
}

/// Clamps to `[INSET, upper]`, collapsing to `INSET` when the cell is too small.
fn keep_inside(value: f64, upper: f64) -> f64 {
    value.min(upper).max(INSET)
}

#[cfg(test)]
mod tests {
    use super::{layout, place, Quadrant};
    use crate::hierarchy::{build_tree, resolve_relationships, TreeOptions};
    use crate::layout::{LayoutConfig, LayoutDiagnostic, MatrixBounds};
    use crate::model::node::{Node, NodeId, NodeMap};

    #[test]
    fn midpoint_scores_are_low() {
        assert_eq!(Quadrant::classify(5.0, 5.0), Quadrant::LowImpactLowEffort);
        assert_eq!(Quadrant::classify(5.1, 5.0), Quadrant::HighImpactLowEffort);
        assert_eq!(Quadrant::classify(9.0, 9.0), Quadrant::HighImpactHighEffort);
        assert_eq!(Quadrant::classify(0.0, 6.0), Quadrant::LowImpactHighEffort);
        // Out-of-range scores are clamped first.
        assert_eq!(Quadrant::classify(42.0, -3.0), Quadrant::HighImpactLowEffort);
    }

    #[test]
    fn positions_stay_inside_their_quadrant() {
        let bounds = MatrixBounds::default();
        let cases = [
            (Quadrant::HighImpactLowEffort, 10.0, 0.0),
            (Quadrant::HighImpactHighEffort, 10.0, 10.0),
            (Quadrant::LowImpactLowEffort, 0.0, 0.0),
            (Quadrant::LowImpactHighEffort, 0.0, 10.0),
        ];
        for (quadrant, impact, effort) in cases {
            for index in 0..12 {
                let position = place(quadrant, impact, effort, index, &bounds);
                let (min_x, max_x) = if quadrant.is_high_effort() {
                    (600.0, 1200.0 - 180.0)
                } else {
                    (0.0, 600.0 - 180.0)
                };
                let (min_y, max_y) = if quadrant.is_high_impact() {
                    (0.0, 400.0 - 100.0)
                } else {
                    (400.0, 800.0 - 100.0)
                };
                assert!(position.x >= min_x && position.x <= max_x, "{quadrant:?} x={}", position.x);
                assert!(position.y >= min_y && position.y <= max_y, "{quadrant:?} y={}", position.y);
            }
        }
    }

    #[test]
    fn tiny_canvas_does_not_panic() {
        let bounds = MatrixBounds {
            width: 100.0,
            height: 100.0,
            ..MatrixBounds::default()
        };
        let position = place(Quadrant::HighImpactHighEffort, 8.0, 8.0, 4, &bounds);
        assert_eq!((position.x, position.y), (60.0, 10.0));
    }

    #[test]
    fn root_is_excluded_and_missing_scores_reported() {
        let mut root = Node::new(NodeId::new("r"), "R");
        root.impact = Some(9.0);
        root.effort = Some(1.0);
        let mut scored = Node::new(NodeId::new("a"), "A");
        scored.parent_id = Some(NodeId::new("r"));
        scored.impact = Some(5.0);
        scored.effort = Some(5.0);
        let mut unscored = Node::new(NodeId::new("b"), "B");
        unscored.parent_id = Some(NodeId::new("r"));
        unscored.impact = Some(7.0);

        let mut nodes: NodeMap = vec![root, scored, unscored].into_iter().collect();
        resolve_relationships(&mut nodes);
        let tree = build_tree(&nodes, None, &TreeOptions::default());
        let result = layout(&tree, &LayoutConfig::default());

        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].quadrant, Some(Quadrant::LowImpactLowEffort));
        assert!(result.edges.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![LayoutDiagnostic::MissingScores {
                id: NodeId::new("b")
            }]
        );
    }
}
