//! Typed addressing of canvases and their collections.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::NodeId;

/// Identifies one canvas: a top-level canvas or the canvas nested in a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum CanvasKey {
    /// A top-level canvas, addressed by its document id.
    Root(String),
    /// The canvas nested inside a node.
    Nested(NodeId),
}

impl CanvasKey {
    /// Creates a key for a top-level canvas.
    pub fn root(id: impl Into<String>) -> Self {
        Self::Root(id.into())
    }

    /// Creates a key for the canvas nested inside `owner`.
    pub fn nested(owner: &NodeId) -> Self {
        Self::Nested(owner.clone())
    }

    /// Returns the key of this canvas's node collection.
    pub fn nodes(&self) -> CollectionKey {
        CollectionKey::new(self.clone(), CollectionKind::Nodes)
    }

    /// Returns the key of this canvas's edge collection.
    pub fn edges(&self) -> CollectionKey {
        CollectionKey::new(self.clone(), CollectionKind::Edges)
    }
}

impl fmt::Display for CanvasKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(id) => write!(f, "{id}"),
            Self::Nested(owner) => write!(f, "{owner}-canvas"),
        }
    }
}

/// Kind of collection a canvas is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    /// The node collection.
    Nodes,
    /// The edge collection.
    Edges,
}

/// Composite key of one collection in the document.
///
/// The string form (`{canvas}-nodes`, `{node}-canvas-edges`) is the name the
/// collection carries in a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    /// The canvas owning the collection.
    pub canvas: CanvasKey,
    /// Which collection of the canvas.
    pub kind: CollectionKind,
}

impl CollectionKey {
    /// Creates a new collection key.
    pub fn new(canvas: CanvasKey, kind: CollectionKind) -> Self {
        Self { canvas, kind }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.canvas, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_collection_names() {
        let owner = NodeId::from("abc");
        let canvas = CanvasKey::nested(&owner);

        assert_eq!(canvas.nodes().to_string(), "abc-canvas-nodes");
        assert_eq!(canvas.edges().to_string(), "abc-canvas-edges");
    }

    #[test]
    fn root_collection_names() {
        let canvas = CanvasKey::root("main");
        assert_eq!(canvas.nodes().to_string(), "main-nodes");
    }

    #[test]
    fn nested_and_root_keys_are_distinct() {
        let owner = NodeId::from("abc");
        assert_ne!(CanvasKey::nested(&owner), CanvasKey::root("abc"));
    }
}
