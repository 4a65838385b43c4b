//! Search client configuration.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Public Semantic Scholar API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org";

/// Default number of papers requested per search.
pub const DEFAULT_LIMIT: u32 = 10;

/// Default timeout for search requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page size the API accepts.
const MAX_LIMIT: u32 = 100;

/// Configuration for the Semantic Scholar client.
#[derive(Debug, Clone)]
pub struct SemanticScholarConfig {
    /// API base URL.
    pub base_url: Url,
    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,
    /// Papers requested per search.
    pub limit: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header to send with requests.
    pub user_agent: String,
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            limit: DEFAULT_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl SemanticScholarConfig {
    fn default_base_url() -> Url {
        Url::parse(DEFAULT_BASE_URL).expect("Valid default URL")
    }

    fn default_user_agent() -> String {
        format!("promptcanvas/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the base URL.
    ///
    /// A base URL with a path prefix (`https://proxy/s2`) keeps that prefix.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::config(format!("invalid search URL '{url}': {e}")))?;
        self.base_url = as_directory(parsed);
        Ok(self)
    }

    /// Sets the API key; empty keys are ignored.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// Sets the number of papers requested per search.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that the configuration can be used.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(Error::config(format!(
                "search limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("search timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// Appends a trailing slash so that joined paths extend the URL path
/// instead of replacing its last segment.
pub(super) fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
