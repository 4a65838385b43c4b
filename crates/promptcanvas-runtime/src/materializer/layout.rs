//! Placement of nodes created in nested canvases.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::canvas::{BoundingBox, Node, Position};

/// Geometry used to place newly created result nodes.
///
/// New nodes form a column to the right of everything already on the nested
/// canvas, stacked downwards from its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    name = "LayoutConfigBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct LayoutConfig {
    /// Width reserved for one node.
    #[builder(default = "320.0")]
    pub node_width: f32,
    /// Height reserved for one node.
    #[builder(default = "160.0")]
    pub node_height: f32,
    /// Space between neighbouring nodes.
    #[builder(default = "40.0")]
    pub gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 320.0,
            node_height: 160.0,
            gap: 40.0,
        }
    }
}

impl LayoutConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }

    /// Returns positions for `count` new nodes next to `existing`.
    pub fn placements(&self, existing: &[Node], count: usize) -> Vec<Position> {
        let origin = match BoundingBox::of(existing.iter().map(|n| n.position)) {
            Some(bounds) => Position::new(bounds.max.x + self.node_width + self.gap, bounds.min.y),
            None => Position::default(),
        };

        let step = self.node_height + self.gap;
        (0..count)
            .map(|i| Position::new(origin.x, origin.y + step * i as f32))
            .collect()
    }
}

impl LayoutConfigBuilder {
    fn validate_config(&self) -> Result<(), String> {
        for (name, value) in [
            ("node width", self.node_width),
            ("node height", self.node_height),
        ] {
            if let Some(value) = value
                && (!value.is_finite() || value <= 0.0)
            {
                return Err(format!("{name} must be greater than 0"));
            }
        }

        if let Some(gap) = self.gap
            && gap < 0.0
        {
            return Err("gap must not be negative".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NodeRole;

    fn at(id: &str, x: f32, y: f32) -> Node {
        Node::new(id, NodeRole::Default).with_position(Position::new(x, y))
    }

    #[test]
    fn empty_canvas_starts_at_origin() {
        let layout = LayoutConfig::default();
        let positions = layout.placements(&[], 2);
        assert_eq!(positions, [Position::new(0.0, 0.0), Position::new(0.0, 200.0)]);
    }

    #[test]
    fn new_nodes_go_right_of_existing() {
        let layout = LayoutConfig::default();
        let existing = [at("a", 0.0, 50.0), at("b", 400.0, 10.0)];

        let positions = layout.placements(&existing, 3);

        assert_eq!(positions.len(), 3);
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(p.x, 760.0);
            assert_eq!(p.y, 10.0 + 200.0 * i as f32);
        }
        for p in &positions {
            for e in &existing {
                assert!(p.x >= e.position.x + layout.node_width);
            }
        }
    }

    #[test]
    fn builder_rejects_zero_width() {
        assert!(LayoutConfig::builder().with_node_width(0.0).build().is_err());
        let config = LayoutConfig::builder().with_gap(8.0).build().unwrap();
        assert_eq!(config.gap, 8.0);
        assert_eq!(config.node_width, 320.0);
    }
}
