//! Completion provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use promptcanvas_runtime::provider::{CompletionApi, CompletionOutput, CompletionRequest};
use rig::completion::{AssistantContent, CompletionError, CompletionModel as RigCompletionModel};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};

use super::ProviderKind;
use super::reply::{Conversation, parse_reply};
use crate::Error;

/// Tracing target for completion calls.
const TRACING_TARGET: &str = "promptcanvas_rig::provider";

/// Completion provider that wraps the supported rig completion models.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
/// Requests naming a different model than the bound one are sent through a
/// client built for that model.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
        api_key: String,
    },
    Anthropic {
        model: anthropic::completion::CompletionModel,
        model_name: String,
        api_key: String,
    },
}

impl CompletionService {
    fn connect(kind: ProviderKind, api_key: &str, model_name: &str) -> crate::Result<Self> {
        let service = match kind {
            ProviderKind::OpenAi => {
                let client = openai::Client::new(api_key)
                    .map_err(|e| Error::provider(kind, e))?
                    .completions_api();
                Self::OpenAi {
                    model: client.completion_model(model_name),
                    model_name: model_name.to_owned(),
                    api_key: api_key.to_owned(),
                }
            }
            ProviderKind::Anthropic => {
                let client =
                    anthropic::Client::new(api_key).map_err(|e| Error::provider(kind, e))?;
                Self::Anthropic {
                    model: client.completion_model(model_name),
                    model_name: model_name.to_owned(),
                    api_key: api_key.to_owned(),
                }
            }
        };
        Ok(service)
    }

    fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi { .. } => ProviderKind::OpenAi,
            Self::Anthropic { .. } => ProviderKind::Anthropic,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Self::OpenAi { model_name, .. } | Self::Anthropic { model_name, .. } => model_name,
        }
    }

    fn api_key(&self) -> &str {
        match self {
            Self::OpenAi { api_key, .. } | Self::Anthropic { api_key, .. } => api_key,
        }
    }
}

impl CompletionProvider {
    /// Creates a provider bound to `model`.
    pub fn new(kind: ProviderKind, api_key: &str, model: &str) -> crate::Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config(format!("missing API key for {kind}")));
        }
        Ok(Self(Arc::new(CompletionService::connect(kind, api_key, model)?)))
    }

    /// Creates an OpenAI completion provider.
    pub fn openai(api_key: &str, model: &str) -> crate::Result<Self> {
        Self::new(ProviderKind::OpenAi, api_key, model)
    }

    /// Creates an Anthropic completion provider.
    pub fn anthropic(api_key: &str, model: &str) -> crate::Result<Self> {
        Self::new(ProviderKind::Anthropic, api_key, model)
    }

    /// Returns the provider kind.
    pub fn kind(&self) -> ProviderKind {
        self.0.kind()
    }

    /// Returns the bound model name.
    pub fn model_name(&self) -> &str {
        self.0.model_name()
    }

    /// Returns the service for `model`, connecting a new one if needed.
    fn service_for(&self, model: &str) -> crate::Result<Arc<CompletionService>> {
        if model.is_empty() || model == self.model_name() {
            return Ok(Arc::clone(&self.0));
        }
        let service = CompletionService::connect(self.kind(), self.0.api_key(), model)?;
        Ok(Arc::new(service))
    }

    /// Sends a structured completion request and returns the raw reply text.
    #[tracing::instrument(
        target = TRACING_TARGET,
        skip_all,
        fields(provider = %self.kind(), model = %request.model, messages = request.messages.len())
    )]
    pub async fn complete_text(&self, request: &CompletionRequest) -> crate::Result<String> {
        let service = self.service_for(&request.model)?;
        let conversation = Conversation::new(&request.messages, &request.schema)?;
        let model_name = service.model_name().to_owned();
        let map_err = |e: CompletionError| Error::provider(&model_name, e);

        let text = match service.as_ref() {
            CompletionService::OpenAi { model, .. } => send(model, conversation).await,
            CompletionService::Anthropic { model, .. } => send(model, conversation).await,
        }
        .map_err(map_err)?;

        tracing::debug!(
            target: TRACING_TARGET,
            reply_len = text.len(),
            "Completion received"
        );
        Ok(text)
    }
}

#[async_trait]
impl CompletionApi for CompletionProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> promptcanvas_runtime::Result<CompletionOutput> {
        let text = self.complete_text(&request).await?;
        let value = parse_reply(&text)?;
        Ok(CompletionOutput::Object(value))
    }
}

async fn send<M: RigCompletionModel>(
    model: &M,
    conversation: Conversation,
) -> Result<String, CompletionError> {
    model
        .completion_request(conversation.prompt.as_str())
        .preamble(conversation.preamble)
        .messages(conversation.history)
        .send()
        .await
        .map(|r| extract_text_content(&r.choice))
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("provider", &self.kind())
            .field("model", &self.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let result = CompletionProvider::openai("", "gpt-4o");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn provider_kind_round_trips_through_strings() {
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
        assert_eq!(
            "anthropic".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );
    }
}
