//! Completion providers backed by rig.

mod completion;
mod reply;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub use completion::CompletionProvider;

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    #[default]
    #[cfg_attr(feature = "config", value(name = "openai"))]
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    /// Anthropic messages.
    Anthropic,
}
