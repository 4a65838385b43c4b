//! Document access for one run.

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::canvas::{CanvasKey, Edge, ExecutionState, Node, NodeId};
use crate::store::DocumentStore;

/// Document handle and canvas accessors threaded through a run.
///
/// Cheap to clone; every clone talks to the same store.
#[derive(Clone)]
pub struct GraphContext {
    store: Arc<dyn DocumentStore>,
    canvas: CanvasKey,
}

impl GraphContext {
    /// Creates a context for the given canvas.
    pub fn new(store: Arc<dyn DocumentStore>, canvas: CanvasKey) -> Self {
        Self { store, canvas }
    }

    /// Returns the document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns the canvas the run operates on.
    pub fn canvas(&self) -> &CanvasKey {
        &self.canvas
    }

    /// Returns whether the canvas exists.
    pub async fn exists(&self) -> Result<bool> {
        self.store.has_canvas(&self.canvas).await
    }

    /// Returns the nodes of the canvas.
    pub async fn nodes(&self) -> Result<Vec<Node>> {
        self.store.nodes(&self.canvas).await
    }

    /// Returns the edges of the canvas.
    pub async fn edges(&self) -> Result<Vec<Edge>> {
        self.store.edges(&self.canvas).await
    }

    /// Returns the live version of a canvas node.
    pub async fn node(&self, id: &NodeId) -> Result<Option<Node>> {
        self.store.get_node(&self.canvas, id).await
    }

    /// Writes a canvas node.
    pub async fn set_node(&self, node: Node) -> Result<()> {
        self.store.set_node(&self.canvas, node).await
    }

    /// Returns the nodes of the canvas nested inside `owner`.
    pub async fn nested_nodes(&self, owner: &NodeId) -> Result<Vec<Node>> {
        self.store.nodes(&CanvasKey::nested(owner)).await
    }

    /// Writes a node into the canvas nested inside `owner`.
    pub async fn set_nested_node(&self, owner: &NodeId, node: Node) -> Result<()> {
        self.store.set_node(&CanvasKey::nested(owner), node).await
    }

    /// Removes a node from the canvas nested inside `owner`.
    pub async fn delete_nested_node(&self, owner: &NodeId, id: &NodeId) -> Result<()> {
        self.store.delete_node(&CanvasKey::nested(owner), id).await
    }

    /// Sets the execution state of a canvas node.
    ///
    /// Nodes deleted from the canvas since the run started are skipped.
    pub async fn set_execution_state(&self, id: &NodeId, state: ExecutionState) -> Result<()> {
        self.update_node(id, |node| node.execution_state = state).await
    }

    /// Sets the fan-out progress of a canvas node.
    pub async fn set_progress(&self, id: &NodeId, progress: Option<f32>) -> Result<()> {
        self.update_node(id, |node| node.data.progress = progress).await
    }

    /// Applies `update` to the live version of a node and writes it back.
    async fn update_node(&self, id: &NodeId, update: impl FnOnce(&mut Node) + Send) -> Result<()> {
        let Some(mut node) = self.node(id).await? else {
            return Ok(());
        };
        update(&mut node);
        self.set_node(node).await
    }
}

impl fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphContext")
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}
