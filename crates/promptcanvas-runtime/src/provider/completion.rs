//! Completion request and response types.

use std::fmt;

use futures::StreamExt;
use futures::stream::BoxStream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

use crate::{Error, Result};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    /// Persona instructions.
    System,
    /// Canvas content and the prompt itself.
    User,
}

/// One message sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: MessageRole,
    /// Participant name derived from the source node title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            name: None,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: content.into(),
        }
    }

    /// Sets the participant name; empty names are dropped.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }
}

/// JSON schema the completion must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name.
    pub name: String,
    /// JSON schema document.
    pub schema: Value,
}

impl ResponseSchema {
    /// Creates a schema from a raw JSON schema document.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Derives the schema of a type.
    pub fn of<T: JsonSchema>(name: impl Into<String>) -> Result<Self> {
        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        Ok(Self::new(name, schema))
    }
}

/// One `{title, body}` result item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseItem {
    /// Short title of the item.
    pub title: String,
    /// Item body in Markdown.
    pub body: String,
}

/// A list of result items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseItems {
    /// The items.
    pub items: Vec<ResponseItem>,
}

/// A request to the completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Messages, system message first.
    pub messages: Vec<ChatMessage>,
    /// Schema of the expected response.
    pub schema: ResponseSchema,
}

/// What a completion API returns.
pub enum CompletionOutput {
    /// The final structured object.
    Object(Value),
    /// A stream of partial objects; the last one is the final value.
    Stream(BoxStream<'static, Result<Value>>),
}

impl CompletionOutput {
    /// Resolves the final accumulated value.
    pub async fn into_value(self) -> Result<Value> {
        match self {
            Self::Object(value) => Ok(value),
            Self::Stream(mut stream) => {
                let mut last = None;
                while let Some(partial) = stream.next().await {
                    last = Some(partial?);
                }
                last.ok_or_else(|| Error::Completion("stream ended without a value".into()))
            }
        }
    }
}

impl From<Value> for CompletionOutput {
    fn from(value: Value) -> Self {
        Self::Object(value)
    }
}

impl fmt::Debug for CompletionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(value) => f.debug_tuple("Object").field(value).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").finish_non_exhaustive(),
        }
    }
}
