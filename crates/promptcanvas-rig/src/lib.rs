#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
pub mod provider;
pub mod search;

pub use config::RigConfig;
pub use error::{Error, Result};
pub use provider::{CompletionProvider, ProviderKind};
pub use search::{SemanticScholar, SemanticScholarConfig};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "promptcanvas_rig";
