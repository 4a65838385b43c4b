//! Prompt shaping and reply parsing.

use promptcanvas_runtime::provider::{ChatMessage, MessageRole, ResponseSchema};
use rig::message::Message;
use serde_json::Value;

use crate::{Error, Result};

/// A chat transcript rearranged for rig: preamble, history and final prompt.
#[derive(Debug)]
pub(super) struct Conversation {
    pub preamble: String,
    pub history: Vec<Message>,
    pub prompt: String,
}

impl Conversation {
    /// Splits `messages` and appends the schema instruction to the prompt.
    ///
    /// System messages form the preamble; the last user message is the
    /// prompt and every earlier one becomes history.
    pub fn new(messages: &[ChatMessage], schema: &ResponseSchema) -> Result<Self> {
        let mut preamble = Vec::new();
        let mut users = Vec::new();
        for message in messages {
            match message.role {
                MessageRole::System => preamble.push(message.content.as_str()),
                MessageRole::User => users.push(labelled(message)),
            }
        }

        let prompt = users.pop().unwrap_or_default();
        let schema = serde_json::to_string(&schema.schema)?;

        Ok(Self {
            preamble: preamble.join("\n\n"),
            history: users.into_iter().map(Message::user).collect(),
            prompt: format!(
                "{prompt}\n\nRespond with a single JSON object that conforms to this JSON \
                 schema and nothing else:\n{schema}"
            ),
        })
    }
}

fn labelled(message: &ChatMessage) -> String {
    match &message.name {
        Some(name) => format!("[{name}]\n{}", message.content),
        None => message.content.clone(),
    }
}

/// Reads the JSON object in a model reply.
///
/// Markdown code fences and text around the object are tolerated.
pub(super) fn parse_reply(text: &str) -> Result<Value> {
    let trimmed = strip_fences(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(Error::Reply("no JSON object in reply".into()));
    };
    if end < start {
        return Err(Error::Reply("no JSON object in reply".into()));
    }

    serde_json::from_str(&trimmed[start..=end]).map_err(|e| Error::Reply(e.to_string()))
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_plain_json() {
        assert_eq!(parse_reply(r#"{"title":"a"}"#).unwrap(), json!({ "title": "a" }));
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"title\": \"a\", \"body\": \"b\"}\n```";
        assert_eq!(
            parse_reply(reply).unwrap(),
            json!({ "title": "a", "body": "b" })
        );
    }

    #[test]
    fn parses_json_inside_prose() {
        let reply = "Here you go: {\"items\": []} Hope this helps.";
        assert_eq!(parse_reply(reply).unwrap(), json!({ "items": [] }));
    }

    #[test]
    fn rejects_replies_without_json() {
        assert!(matches!(parse_reply("I cannot help."), Err(Error::Reply(_))));
        assert!(matches!(parse_reply("} {"), Err(Error::Reply(_))));
    }

    #[test]
    fn conversation_splits_roles() {
        let messages = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Notes\nfacts").with_name("notes"),
            ChatMessage::user("Summarize").with_name("summarize"),
        ];
        let schema = ResponseSchema::new("item", json!({ "type": "object" }));

        let conversation = Conversation::new(&messages, &schema).unwrap();

        assert_eq!(conversation.preamble, "Be brief.");
        assert_eq!(conversation.history.len(), 1);
        assert!(conversation.prompt.starts_with("[summarize]\nSummarize\n\n"));
        assert!(conversation.prompt.ends_with(r#"{"type":"object"}"#));
    }
}
