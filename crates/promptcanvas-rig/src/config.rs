//! Configuration for the external API adapters.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::provider::{CompletionProvider, ProviderKind};
use crate::search::{DEFAULT_BASE_URL, DEFAULT_LIMIT, SemanticScholar, SemanticScholarConfig};
use crate::{Error, Result};

/// Model used when none is configured.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the completion provider and the paper search client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RigConfig {
    /// Completion backend.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "provider",
            env = "PROMPTCANVAS_PROVIDER",
            value_enum,
            default_value_t = ProviderKind::OpenAi
        )
    )]
    #[serde(default)]
    pub provider: ProviderKind,

    /// Completion model used when the persona names none.
    #[cfg_attr(
        feature = "config",
        arg(long = "model", env = "PROMPTCANVAS_MODEL", default_value = DEFAULT_MODEL)
    )]
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Anthropic API key.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "anthropic-api-key",
            env = "ANTHROPIC_API_KEY",
            hide_env_values = true
        )
    )]
    #[serde(default, skip_serializing)]
    pub anthropic_api_key: Option<String>,

    /// Semantic Scholar base URL.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "search-url",
            env = "SEMANTIC_SCHOLAR_URL",
            default_value = DEFAULT_BASE_URL
        )
    )]
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Semantic Scholar API key.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "search-api-key",
            env = "SEMANTIC_SCHOLAR_API_KEY",
            hide_env_values = true
        )
    )]
    #[serde(default, skip_serializing)]
    pub search_api_key: Option<String>,

    /// Papers requested per search.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "search-limit",
            env = "SEMANTIC_SCHOLAR_LIMIT",
            default_value_t = DEFAULT_LIMIT
        )
    )]
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            openai_api_key: None,
            anthropic_api_key: None,
            search_url: default_search_url(),
            search_api_key: None,
            search_limit: DEFAULT_LIMIT,
        }
    }
}

impl RigConfig {
    /// Returns the API key of the selected provider.
    fn api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        }
        .filter(|key| !key.is_empty())
    }

    /// Creates the completion provider from this configuration.
    pub fn completion_provider(&self) -> Result<CompletionProvider> {
        let api_key = self
            .api_key()
            .ok_or_else(|| Error::config(format!("no API key configured for {}", self.provider)))?;
        CompletionProvider::new(self.provider, api_key, &self.model)
    }

    /// Creates the paper search client from this configuration.
    pub fn search_client(&self) -> Result<SemanticScholar> {
        let mut config = SemanticScholarConfig::default()
            .with_base_url(&self.search_url)?
            .with_limit(self.search_limit);
        if let Some(api_key) = &self.search_api_key {
            config = config.with_api_key(api_key.as_str());
        }
        SemanticScholar::new(config)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

fn default_search_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_search_limit() -> u32 {
    DEFAULT_LIMIT
}
