//! Runtime error types.

use thiserror::Error;

use crate::canvas::{CanvasKey, NodeId, NodeRole};

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while compiling or executing a canvas.
#[derive(Debug, Error)]
pub enum Error {
    /// No assistant persona was selected for the run.
    #[error("no assistant persona selected")]
    MissingPersona,

    /// The run was started without a document store handle.
    #[error("no document store attached to the run")]
    MissingDocument,

    /// The canvas collections do not exist in the document store.
    #[error("canvas {0} does not exist")]
    MissingCanvas(CanvasKey),

    /// The canvas graph contains a cycle.
    #[error("cycle detected in canvas graph at node {0}")]
    Cycle(NodeId),

    /// A search node is wired to an output that cannot hold search results.
    #[error("search node {node_id} must write into a multiple-response node, found {found}")]
    SearchOutput {
        /// ID of the search node.
        node_id: NodeId,
        /// Role of the rejected output candidate.
        found: NodeRole,
    },

    /// A task reached execution without an output node.
    #[error("prompt node {0} has no output node")]
    MissingOutput(NodeId),

    /// The output node role cannot receive results.
    #[error("node {node_id} cannot receive results as {role}")]
    UnsupportedOutput {
        /// ID of the output node.
        node_id: NodeId,
        /// Role of the output node.
        role: NodeRole,
    },

    /// A node was removed from the canvas while the run was using it.
    #[error("node {0} no longer exists")]
    MissingNode(NodeId),

    /// The completion API call failed.
    #[error("completion failed: {0}")]
    Completion(String),

    /// The search API call failed.
    #[error("search failed: {0}")]
    Search(String),

    /// The completion response does not match the requested schema.
    #[error("malformed response for node {node_id}: {message}")]
    MalformedResponse {
        /// ID of the output node the response was meant for.
        node_id: NodeId,
        /// Error message.
        message: String,
    },

    /// A table output node has no column definitions in its nested canvas.
    #[error("table node {0} has no column definitions")]
    MissingColumns(NodeId),

    /// Document store operation failed.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a malformed response error.
    pub fn malformed(node_id: &NodeId, message: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            node_id: node_id.clone(),
            message: message.to_string(),
        }
    }

    /// Creates a store error.
    pub fn store(message: impl std::fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Returns true if the error aborts a run before any task executes.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::MissingPersona | Self::MissingDocument | Self::MissingCanvas(_) | Self::Config(_)
        )
    }

    /// Returns true if the error was raised while compiling the graph.
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Cycle(_) | Self::SearchOutput { .. })
    }
}
