//! Document store seam.
//!
//! The canvas lives in an external collaborative document. The runtime only
//! talks to it through [`DocumentStore`]; every read and write is atomic per
//! key. [`InMemoryStore`] is the in-process implementation used by the CLI and
//! by tests.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub use memory::{CanvasSnapshot, DocumentSnapshot, InMemoryStore};

use crate::Result;
use crate::canvas::{CanvasKey, CollectionKey, Edge, EdgeId, Node, NodeId};

/// Kind of change observed on a collection entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// The entry was inserted or overwritten.
    Set,
    /// The entry was removed.
    Deleted,
}

/// A change notification emitted by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Collection the change happened in.
    pub key: CollectionKey,
    /// Id of the changed entry.
    pub id: String,
    /// What happened.
    pub change: Change,
}

/// Keyed node and edge collections for every canvas of one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns whether the canvas collections exist.
    async fn has_canvas(&self, canvas: &CanvasKey) -> Result<bool>;

    /// Returns all nodes of a canvas, in document order.
    ///
    /// A nested canvas that was never written reads as empty.
    async fn nodes(&self, canvas: &CanvasKey) -> Result<Vec<Node>>;

    /// Returns all edges of a canvas, in document order.
    async fn edges(&self, canvas: &CanvasKey) -> Result<Vec<Edge>>;

    /// Returns one node.
    async fn get_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<Option<Node>>;

    /// Inserts or overwrites a node.
    async fn set_node(&self, canvas: &CanvasKey, node: Node) -> Result<()>;

    /// Removes a node.
    async fn delete_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<()>;

    /// Inserts or overwrites an edge.
    async fn set_edge(&self, canvas: &CanvasKey, edge: Edge) -> Result<()>;

    /// Removes an edge.
    async fn delete_edge(&self, canvas: &CanvasKey, id: &EdgeId) -> Result<()>;

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
