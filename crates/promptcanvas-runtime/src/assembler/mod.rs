//! Prompt assembly.
//!
//! Turns the inputs of a [`Task`] into what the external API consumes: a
//! message list for completion tasks, a free-text query for search tasks.
//! Response inputs are expanded into the items of their nested canvas.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::canvas::{Node, NodeRole};
use crate::compiler::{Task, TaskKind};
use crate::engine::{GraphContext, Persona};
use crate::provider::ChatMessage;
use crate::text;

/// Tracing target for prompt assembly.
const TRACING_TARGET: &str = "promptcanvas_runtime::assembler";

/// The request payload assembled for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssembledPrompt {
    /// Chat messages for the completion API.
    Messages(Vec<ChatMessage>),
    /// Query string for the search API.
    Query(String),
}

impl AssembledPrompt {
    /// Returns the messages, if this is a completion prompt.
    pub fn messages(&self) -> Option<&[ChatMessage]> {
        match self {
            Self::Messages(messages) => Some(messages),
            Self::Query(_) => None,
        }
    }

    /// Returns the query, if this is a search prompt.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Messages(_) => None,
            Self::Query(query) => Some(query),
        }
    }
}

/// Builds message lists and search queries from task inputs.
#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler<'a> {
    graph: &'a GraphContext,
}

impl<'a> PromptAssembler<'a> {
    /// Creates an assembler reading nested canvases through `graph`.
    pub fn new(graph: &'a GraphContext) -> Self {
        Self { graph }
    }

    /// Assembles the payload matching the task kind.
    pub async fn assemble(&self, task: &Task, persona: &Persona) -> Result<AssembledPrompt> {
        match task.kind() {
            TaskKind::Prompt => self.messages(task, persona).await.map(AssembledPrompt::Messages),
            TaskKind::Search => self.query(task).await.map(AssembledPrompt::Query),
        }
    }

    /// Builds the message list of a completion task.
    ///
    /// The persona instructions come first, then one message per resolved
    /// input item, then the prompt title as the final user message.
    pub async fn messages(&self, task: &Task, persona: &Persona) -> Result<Vec<ChatMessage>> {
        let mut messages = vec![ChatMessage::system(&persona.instructions)];

        for input in &task.input_nodes {
            for item in self.resolve(input).await? {
                messages.push(input_message(&item));
            }
        }

        let prompt = &task.prompt_node;
        messages.push(ChatMessage::user(prompt.title()).with_name(text::slugify(prompt.title())));

        tracing::debug!(
            target: TRACING_TARGET,
            prompt_id = %prompt.id,
            message_count = messages.len(),
            "assembled messages"
        );

        Ok(messages)
    }

    /// Builds the query string of a search task from its input titles.
    pub async fn query(&self, task: &Task) -> Result<String> {
        let mut terms = Vec::new();
        for input in &task.input_nodes {
            for item in self.resolve(input).await? {
                let title = item.title().trim();
                if !title.is_empty() {
                    terms.push(title.to_owned());
                }
            }
        }

        let query = terms.join(" ");
        tracing::debug!(
            target: TRACING_TARGET,
            prompt_id = %task.prompt_node.id,
            query = %query,
            "assembled search query"
        );

        Ok(query)
    }

    /// Returns the items an input contributes.
    ///
    /// Response inputs (other than tables) contribute the nodes of their
    /// nested canvas, falling back to the input itself while that canvas is
    /// empty.
    async fn resolve(&self, input: &Node) -> Result<Vec<Node>> {
        match input.role {
            NodeRole::ResponseSingle | NodeRole::ResponseMultiple | NodeRole::ResponseCombined => {
                let nested = self.graph.nested_nodes(&input.id).await?;
                if nested.is_empty() {
                    Ok(vec![input.clone()])
                } else {
                    Ok(nested)
                }
            }
            _ => Ok(vec![input.clone()]),
        }
    }
}

/// Formats one input item as a user message.
fn input_message(node: &Node) -> ChatMessage {
    let body = text::strip_tags(node.content());
    let body = body.trim();
    let content = if body.is_empty() {
        node.title().to_owned()
    } else {
        format!("{}\n{}", node.title(), body)
    };

    ChatMessage::user(content).with_name(text::slugify(node.title()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasKey;
    use crate::provider::MessageRole;
    use crate::testing;

    fn persona() -> Persona {
        Persona::new("Analyst", "Answer in English.")
    }

    #[tokio::test]
    async fn messages_follow_input_order() {
        let graph = testing::graph_context(testing::store()).await;
        let mut task = Task::new(Node::new("p", NodeRole::Prompt).with_title("Summarize"));
        task.input_nodes = vec![
            Node::new("a", NodeRole::Default)
                .with_title("Market Notes")
                .with_content("<p>Prices rose.</p>"),
            Node::new("b", NodeRole::Default).with_title("Goals"),
        ];

        let messages = PromptAssembler::new(&graph)
            .messages(&task, &persona())
            .await
            .unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "Answer in English.");
        assert_eq!(messages[1].content, "Market Notes\nPrices rose.");
        assert_eq!(messages[1].name.as_deref(), Some("market_notes"));
        assert_eq!(messages[2].content, "Goals");
        assert_eq!(messages[3].content, "Summarize");
        assert_eq!(messages[3].role, MessageRole::User);
    }

    #[tokio::test]
    async fn response_inputs_expand_into_nested_items() {
        let store = testing::store();
        let owner = Node::new("r", NodeRole::ResponseMultiple).with_title("Ideas");
        testing::put_nested(
            &store,
            &owner.id,
            vec![
                Node::new("i1", NodeRole::Default).with_title("Solar").with_content("cheap"),
                Node::new("i2", NodeRole::Default).with_title("Wind"),
            ],
        )
        .await;
        let graph = testing::graph_context(store).await;

        let mut task = Task::new(Node::new("p", NodeRole::Prompt).with_title("Rank"));
        task.input_nodes = vec![owner];

        let messages = PromptAssembler::new(&graph)
            .messages(&task, &persona())
            .await
            .unwrap();

        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["Answer in English.", "Solar\ncheap", "Wind", "Rank"]);
    }

    #[tokio::test]
    async fn empty_response_input_falls_back_to_itself() {
        let graph = testing::graph_context(testing::store()).await;
        let mut task = Task::new(Node::new("p", NodeRole::Prompt).with_title("Rank"));
        task.input_nodes = vec![
            Node::new("r", NodeRole::ResponseSingle)
                .with_title("Draft")
                .with_content("text"),
        ];

        let messages = PromptAssembler::new(&graph)
            .messages(&task, &persona())
            .await
            .unwrap();
        assert_eq!(messages[1].content, "Draft\ntext");
    }

    #[tokio::test]
    async fn search_query_joins_titles() {
        let store = testing::store();
        let topics = Node::new("r", NodeRole::ResponseMultiple).with_title("Topics");
        testing::put_nested(
            &store,
            &topics.id,
            vec![
                Node::new("t1", NodeRole::Default).with_title("graph neural networks"),
                Node::new("t2", NodeRole::Default).with_title(" "),
            ],
        )
        .await;
        let graph = testing::graph_context(store).await;

        let mut task = Task::new(Node::new("s", NodeRole::PaperFinder).with_title("Find"));
        task.input_nodes = vec![Node::new("k", NodeRole::Default).with_title("survey"), topics];

        let prompt = PromptAssembler::new(&graph)
            .assemble(&task, &persona())
            .await
            .unwrap();
        assert_eq!(prompt.query(), Some("survey graph neural networks"));
        assert!(prompt.messages().is_none());
    }

    #[tokio::test]
    async fn nested_reads_use_owner_canvas() {
        let store = testing::store();
        let graph = testing::graph_context(store.clone()).await;
        let owner = Node::new("r", NodeRole::ResponseCombined).with_title("Merged");
        testing::put_nested(&store, &owner.id, vec![Node::new("x", NodeRole::Default).with_title("X")])
            .await;

        assert_eq!(graph.nested_nodes(&owner.id).await.unwrap().len(), 1);
        assert_eq!(*graph.canvas(), CanvasKey::root(testing::CANVAS));
    }
}
