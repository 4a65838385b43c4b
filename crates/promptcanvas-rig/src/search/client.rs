//! Semantic Scholar client implementation using reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use promptcanvas_runtime::provider::{Paper, SearchApi};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::config::{SemanticScholarConfig, as_directory};
use crate::{Error, Result};

/// Tracing target for search operations.
const TRACING_TARGET: &str = "promptcanvas_rig::search";

/// Fields requested for every paper.
const PAPER_FIELDS: &str =
    "title,year,citationCount,referenceCount,isOpenAccess,authors,url,abstract";

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

struct SemanticScholarInner {
    http: Client,
    config: SemanticScholarConfig,
}

/// Paper search client for the Semantic Scholar Graph API.
///
/// Implements [`SearchApi`] by calling `/graph/v1/paper/search`.
#[derive(Clone)]
pub struct SemanticScholar {
    inner: Arc<SemanticScholarInner>,
}

impl SemanticScholar {
    /// Creates a new client with the given configuration.
    pub fn new(config: SemanticScholarConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            limit = config.limit,
            authenticated = config.api_key.is_some(),
            "Search client created"
        );

        Ok(Self {
            inner: Arc::new(SemanticScholarInner { http, config }),
        })
    }

    /// Creates a new client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(SemanticScholarConfig::default())
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &SemanticScholarConfig {
        &self.inner.config
    }

    /// Builds the search URL for a query.
    fn search_url(&self, query: &str) -> Result<Url> {
        let config = &self.inner.config;
        let mut url = as_directory(config.base_url.clone())
            .join("graph/v1/paper/search")
            .map_err(|e| Error::config(format!("invalid search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &config.limit.to_string())
            .append_pair("fields", PAPER_FIELDS);
        Ok(url)
    }

    /// Searches papers matching a free-text query.
    #[tracing::instrument(skip(self), target = TRACING_TARGET)]
    pub async fn search_papers(&self, query: &str) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.search_url(query)?;
        let mut request = self.inner.http.get(url);
        if let Some(api_key) = &self.inner.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            tracing::warn!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                "Search request rejected"
            );
            return Err(Error::Search(format!("HTTP {status}: {body}")));
        }

        let page: SearchPage = response.json().await?;
        let papers: Vec<Paper> = page.data.into_iter().map(Paper::from).collect();

        tracing::debug!(
            target: TRACING_TARGET,
            total = page.total,
            returned = papers.len(),
            "Search completed"
        );
        Ok(papers)
    }
}

#[async_trait]
impl SearchApi for SemanticScholar {
    async fn search(&self, query: &str) -> promptcanvas_runtime::Result<Vec<Paper>> {
        Ok(self.search_papers(query).await?)
    }
}

impl std::fmt::Debug for SemanticScholar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScholar")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("limit", &self.inner.config.limit)
            .finish_non_exhaustive()
    }
}

/// One page of search results.
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    data: Vec<PaperRecord>,
}

/// A paper as returned by the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(default)]
    reference_count: Option<u64>,
    #[serde(default)]
    is_open_access: Option<bool>,
    #[serde(default)]
    authors: Vec<AuthorRecord>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    #[serde(default)]
    name: Option<String>,
}

impl From<PaperRecord> for Paper {
    fn from(record: PaperRecord) -> Self {
        Self {
            title: record.title.unwrap_or_default(),
            year: record.year,
            citation_count: record.citation_count,
            reference_count: record.reference_count,
            is_open_access: record.is_open_access.unwrap_or(false),
            authors: record.authors.into_iter().filter_map(|a| a.name).collect(),
            url: record.url,
            abstract_text: record.abstract_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn search_url_carries_query_and_fields() {
        let client = SemanticScholar::new(SemanticScholarConfig::default().with_limit(5)).unwrap();
        let url = client.search_url("graph neural networks").unwrap();

        assert_eq!(url.path(), "/graph/v1/paper/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("query".into(), "graph neural networks".into())));
        assert!(pairs.contains(&("limit".into(), "5".into())));
        assert!(pairs.contains(&("fields".into(), PAPER_FIELDS.into())));
    }

    #[test]
    fn search_url_keeps_base_path_prefix() {
        let config = SemanticScholarConfig::default()
            .with_base_url("https://proxy.example.com/s2")
            .unwrap();
        let client = SemanticScholar::new(config).unwrap();
        let url = client.search_url("folding").unwrap();
        assert_eq!(url.path(), "/s2/graph/v1/paper/search");

        let mut config = SemanticScholarConfig::default();
        config.base_url = Url::parse("https://proxy.example.com/s2").unwrap();
        let client = SemanticScholar::new(config).unwrap();
        assert_eq!(
            client.search_url("folding").unwrap().path(),
            "/s2/graph/v1/paper/search"
        );
    }

    #[test]
    fn records_map_to_papers() {
        let page: SearchPage = serde_json::from_value(json!({
            "total": 1,
            "offset": 0,
            "data": [{
                "paperId": "abc",
                "title": "Deep Sets",
                "year": 2017,
                "citationCount": 2000,
                "referenceCount": null,
                "isOpenAccess": true,
                "authors": [{ "authorId": "1", "name": "M. Zaheer" }, { "authorId": "2" }],
                "url": "https://www.semanticscholar.org/paper/abc",
                "abstract": null
            }]
        }))
        .unwrap();

        let paper = Paper::from(page.data.into_iter().next().unwrap());
        assert_eq!(paper.title, "Deep Sets");
        assert_eq!(paper.year, Some(2017));
        assert_eq!(paper.reference_count, None);
        assert!(paper.is_open_access);
        assert_eq!(paper.authors, ["M. Zaheer"]);
        assert_eq!(paper.abstract_text, None);
    }

    #[tokio::test]
    async fn blank_query_skips_the_request() {
        let client = SemanticScholar::with_defaults().unwrap();
        assert!(client.search_papers("  ").await.unwrap().is_empty());
    }
}
