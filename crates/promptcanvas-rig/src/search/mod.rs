//! Paper search through the Semantic Scholar Graph API.

mod client;
mod config;

pub use client::SemanticScholar;
pub use config::{DEFAULT_BASE_URL, DEFAULT_LIMIT, SemanticScholarConfig};
