//! Dependency graph construction.
//!
//! - [`GraphBuilder`]: Builds a [`DependencyGraph`] from a flat node/edge list
//! - [`DependencyGraph`]: Immutable snapshot with predecessor lists and a
//!   topological order

mod builder;

pub use builder::{DependencyGraph, GraphBuilder};
