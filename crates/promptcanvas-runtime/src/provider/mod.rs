//! External API seams.
//!
//! The runtime never talks HTTP itself. It calls a [`CompletionApi`] for
//! prompt tasks and a [`SearchApi`] for paper search tasks; adapters live in
//! the hosting layer.

mod completion;
mod search;

use async_trait::async_trait;

pub use completion::{
    ChatMessage, CompletionOutput, CompletionRequest, MessageRole, ResponseItem, ResponseItems,
    ResponseSchema,
};
pub use search::Paper;

use crate::Result;

/// Structured completion API.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Requests a completion constrained to `request.schema`.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutput>;
}

/// Paper search API.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Searches papers matching a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<Paper>>;
}
