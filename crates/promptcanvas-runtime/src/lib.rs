#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod assembler;
pub mod canvas;
pub mod compiler;
pub mod engine;
mod error;
pub mod graph;
pub mod materializer;
pub mod provider;
pub mod store;
pub mod text;

#[doc(hidden)]
pub mod prelude;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "promptcanvas_runtime";
