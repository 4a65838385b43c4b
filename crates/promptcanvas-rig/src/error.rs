//! Error types for promptcanvas-rig.

use std::fmt;

/// Result type alias for adapter operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while talking to external APIs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Completion provider error (API call failed, rate limited, etc.)
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The model reply could not be read as JSON.
    #[error("unreadable model reply: {0}")]
    Reply(String),

    /// The search API answered with an error status.
    #[error("search error: {0}")]
    Search(String),

    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }
}

impl From<Error> for promptcanvas_runtime::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Provider { .. } | Error::Reply(_) => Self::Completion(err.to_string()),
            Error::Search(message) => Self::Search(message),
            Error::Http(e) if e.is_timeout() => Self::Search(format!("request timed out: {e}")),
            Error::Http(e) if e.is_connect() => Self::Search(format!("connection failed: {e}")),
            Error::Http(e) => Self::Search(e.to_string()),
            Error::Config(message) => Self::Config(message),
            Error::Serialization(e) => Self::Serialization(e),
        }
    }
}
