//! Canvas data model.
//!
//! This module provides the types that make up one canvas in the shared
//! document:
//! - [`Node`]: A node with its role, position, execution state and content
//! - [`Edge`]: A directed connection between two nodes
//! - [`NodeId`] / [`EdgeId`]: Identifiers assigned by the document
//! - [`CanvasKey`] / [`CollectionKey`]: Typed addressing of root and nested canvases

mod edge;
mod id;
mod key;
mod node;
mod position;

pub use edge::Edge;
pub use id::{EdgeId, NodeId};
pub use key::{CanvasKey, CollectionKey, CollectionKind};
pub use node::{ExecutionState, Node, NodeData, NodeRole};
pub use position::{BoundingBox, Position};
