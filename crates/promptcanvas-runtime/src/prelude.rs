//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use promptcanvas_runtime::prelude::*;
//! ```

pub use crate::assembler::{AssembledPrompt, PromptAssembler};
pub use crate::canvas::{CanvasKey, Edge, ExecutionState, Node, NodeId, NodeRole, Position};
pub use crate::compiler::{ExecutionContext, Task, TaskCompiler};
pub use crate::engine::{
    ExecutionPlan, ExecutorConfig, GraphContext, Persona, RunReport, RunRequest, RunTrigger,
    TaskExecutor,
};
pub use crate::error::{Error, Result};
pub use crate::graph::{DependencyGraph, GraphBuilder};
pub use crate::materializer::ResultMaterializer;
pub use crate::provider::{CompletionApi, SearchApi};
pub use crate::store::{DocumentStore, InMemoryStore};
