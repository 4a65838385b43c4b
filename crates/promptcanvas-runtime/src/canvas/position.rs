//! Position type for canvas node placement.

use serde::{Deserialize, Serialize};

/// Position of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned extent of a set of node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest coordinates.
    pub min: Position,
    /// Largest coordinates.
    pub max: Position,
}

impl BoundingBox {
    /// Computes the bounding box of the given positions.
    ///
    /// Returns `None` for an empty iterator.
    pub fn of(positions: impl IntoIterator<Item = Position>) -> Option<Self> {
        positions.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self { min: p, max: p },
                Some(b) => Self {
                    min: Position::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Position::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                },
            })
        })
    }
}
