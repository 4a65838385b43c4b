//! Edge type.

use serde::{Deserialize, Serialize};

use super::{EdgeId, NodeId};

/// A directed edge: `source` is a predecessor of `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Source (upstream) node.
    pub source: NodeId,
    /// Target (downstream) node.
    pub target: NodeId,
}

impl Edge {
    /// Creates an edge with a generated id.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: EdgeId::new(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Sets the edge id.
    pub fn with_id(mut self, id: impl Into<EdgeId>) -> Self {
        self.id = id.into();
        self
    }
}
