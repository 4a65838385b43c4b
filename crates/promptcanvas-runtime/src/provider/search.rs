//! Search result types.

use serde::{Deserialize, Serialize};

/// A paper returned by the search API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Paper title.
    pub title: String,
    /// Publication year.
    #[serde(default)]
    pub year: Option<u32>,
    /// Number of citing papers.
    #[serde(default)]
    pub citation_count: Option<u64>,
    /// Number of referenced papers.
    #[serde(default)]
    pub reference_count: Option<u64>,
    /// Whether a free full text exists.
    #[serde(default)]
    pub is_open_access: bool,
    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Landing page.
    #[serde(default)]
    pub url: Option<String>,
    /// Abstract text.
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
}
