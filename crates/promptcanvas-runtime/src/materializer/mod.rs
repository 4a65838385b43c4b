//! Result materialization.
//!
//! A response is validated in full before anything is written, so a rejected
//! response leaves the canvas untouched. What gets written depends on the
//! output node role:
//!
//! | role | schema | write |
//! |---|---|---|
//! | `response-single`, `response-combined` | `{ title, body }` | overwrite the output node |
//! | `response-multiple` | `{ items: [{ title, body }] }` | one new nested node per item |
//! | `response-table` | `{ rows: [{ <column>: string }] }` | append an HTML table |
//! | `response-multiple` (search) | none | one new nested node per paper |

mod layout;
mod papers;
mod table;

use serde_json::Value;

pub use layout::{LayoutConfig, LayoutConfigBuilder, LayoutConfigBuilderError};
pub use table::{TableColumn, columns};

use crate::canvas::{Node, NodeId, NodeRole};
use crate::compiler::{ExecutionContext, Task};
use crate::engine::GraphContext;
use crate::provider::{Paper, ResponseItem, ResponseItems, ResponseSchema};
use crate::text;
use crate::{Error, Result};

/// Tracing target for materialization.
const TRACING_TARGET: &str = "promptcanvas_runtime::materializer";

/// Raw result of one external API call.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// Final structured completion value.
    Completion(Value),
    /// Papers returned by a search.
    Papers(Vec<Paper>),
}

/// What a materialization wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// The output node the result belongs to.
    pub output_id: NodeId,
    /// Nodes created in the output node's nested canvas.
    pub created: Vec<NodeId>,
}

/// A validated write, ready to apply.
enum Write {
    Replace { title: String, body: String },
    Append(String),
    Create(Vec<(String, String)>),
}

/// Interprets responses according to the output node role and writes them
/// into the canvas.
#[derive(Debug, Clone)]
pub struct ResultMaterializer<'a> {
    graph: &'a GraphContext,
    layout: LayoutConfig,
}

impl<'a> ResultMaterializer<'a> {
    /// Creates a materializer writing through `graph`.
    pub fn new(graph: &'a GraphContext) -> Self {
        Self {
            graph,
            layout: LayoutConfig::default(),
        }
    }

    /// Sets the placement geometry for created nodes.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the response schema to request for a task.
    pub async fn schema_for(&self, task: &Task) -> Result<ResponseSchema> {
        let output = output_node(task)?;
        match output.role {
            NodeRole::ResponseSingle | NodeRole::ResponseCombined => {
                ResponseSchema::of::<ResponseItem>("item")
            }
            NodeRole::ResponseMultiple => ResponseSchema::of::<ResponseItems>("items"),
            NodeRole::ResponseTable => {
                let columns = self.table_columns(output).await?;
                Ok(table::row_schema(&columns))
            }
            role => Err(Error::UnsupportedOutput {
                node_id: output.id.clone(),
                role,
            }),
        }
    }

    /// Validates `result` against the task output and writes it.
    ///
    /// The raw result is recorded in `ctx` once written.
    pub async fn materialize(
        &self,
        task: &Task,
        result: TaskOutput,
        ctx: &mut ExecutionContext,
    ) -> Result<Materialized> {
        let output = output_node(task)?;
        let write = self.validate(task, output, &result).await?;
        let created = self.apply(output, write).await?;

        let raw = match &result {
            TaskOutput::Completion(value) => value.to_string(),
            TaskOutput::Papers(papers) => serde_json::to_string(papers)?,
        };
        ctx.record_response(output.id.clone(), raw);

        tracing::debug!(
            target: TRACING_TARGET,
            prompt_id = %task.prompt_node.id,
            output_id = %output.id,
            role = %output.role,
            created = created.len(),
            "materialized result"
        );

        Ok(Materialized {
            output_id: output.id.clone(),
            created,
        })
    }

    async fn validate(&self, task: &Task, output: &Node, result: &TaskOutput) -> Result<Write> {
        let value = match (output.role, result) {
            (NodeRole::ResponseMultiple, TaskOutput::Papers(papers)) => {
                let items = papers
                    .iter()
                    .map(|p| (text::strip_markup(&p.title), papers::paper_markdown(p)))
                    .collect();
                return Ok(Write::Create(items));
            }
            (role, TaskOutput::Papers(_)) => {
                return Err(Error::SearchOutput {
                    node_id: task.prompt_node.id.clone(),
                    found: role,
                });
            }
            (_, TaskOutput::Completion(value)) => value,
        };

        match output.role {
            NodeRole::ResponseSingle | NodeRole::ResponseCombined => {
                let item: ResponseItem = serde_json::from_value(value.clone())
                    .map_err(|e| Error::malformed(&output.id, e))?;
                Ok(Write::Replace {
                    title: text::strip_markup(&item.title),
                    body: text::strip_markup(&item.body),
                })
            }
            NodeRole::ResponseMultiple => {
                let items: ResponseItems = serde_json::from_value(value.clone())
                    .map_err(|e| Error::malformed(&output.id, e))?;
                let items = items
                    .items
                    .into_iter()
                    .map(|i| (text::strip_markup(&i.title), text::strip_markup(&i.body)))
                    .collect();
                Ok(Write::Create(items))
            }
            NodeRole::ResponseTable => {
                let columns = self.table_columns(output).await?;
                let rows = table::parse_rows(&output.id, &columns, value)?;
                Ok(Write::Append(table::render_html(&columns, &rows)))
            }
            role => Err(Error::UnsupportedOutput {
                node_id: output.id.clone(),
                role,
            }),
        }
    }

    async fn apply(&self, output: &Node, write: Write) -> Result<Vec<NodeId>> {
        match write {
            Write::Replace { title, body } => {
                let mut node = self.live(&output.id).await?;
                node.data.title = title;
                node.data.content = body;
                self.graph.set_node(node).await?;
                Ok(Vec::new())
            }
            Write::Append(html) => {
                let mut node = self.live(&output.id).await?;
                if !node.data.content.is_empty() {
                    node.data.content.push('\n');
                }
                node.data.content.push_str(&html);
                self.graph.set_node(node).await?;
                Ok(Vec::new())
            }
            Write::Create(items) => {
                let existing = self.graph.nested_nodes(&output.id).await?;
                let positions = self.layout.placements(&existing, items.len());

                let nodes: Vec<Node> = items
                    .into_iter()
                    .zip(positions)
                    .map(|((title, body), position)| {
                        Node::new(NodeId::new(), NodeRole::Default)
                            .with_title(title)
                            .with_content(body)
                            .with_position(position)
                    })
                    .collect();

                let mut created = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let id = node.id.clone();
                    if let Err(error) = self.graph.set_nested_node(&output.id, node).await {
                        self.roll_back(&output.id, &created).await;
                        return Err(error);
                    }
                    created.push(id);
                }
                Ok(created)
            }
        }
    }

    /// Removes nodes created before a write failed.
    ///
    /// The store has no transactions, so a failing delete leaves that node
    /// behind; it is logged and skipped.
    async fn roll_back(&self, owner: &NodeId, created: &[NodeId]) {
        for id in created {
            if let Err(error) = self.graph.delete_nested_node(owner, id).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    owner_id = %owner,
                    node_id = %id,
                    error = %error,
                    "failed to roll back created node"
                );
            }
        }
    }

    async fn table_columns(&self, output: &Node) -> Result<Vec<TableColumn>> {
        let definitions = self.graph.nested_nodes(&output.id).await?;
        let columns = table::columns(&definitions);
        if columns.is_empty() {
            return Err(Error::MissingColumns(output.id.clone()));
        }
        Ok(columns)
    }

    async fn live(&self, id: &NodeId) -> Result<Node> {
        self.graph
            .node(id)
            .await?
            .ok_or_else(|| Error::MissingNode(id.clone()))
    }
}

fn output_node(task: &Task) -> Result<&Node> {
    task.output_node
        .as_ref()
        .ok_or_else(|| Error::MissingOutput(task.prompt_node.id.clone()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::canvas::CanvasKey;
    use crate::testing;

    fn task_writing_to(output: Node) -> Task {
        let mut task = Task::new(Node::new("p", NodeRole::Prompt).with_title("Write"));
        task.input_nodes = vec![Node::new("in", NodeRole::Default).with_title("Notes")];
        task.output_node = Some(output);
        task
    }

    #[tokio::test]
    async fn single_overwrites_in_place() {
        let output = Node::new("out", NodeRole::ResponseSingle).with_title("Old");
        let store = testing::store_with(vec![output.clone()], vec![]);
        let graph = testing::graph_context(store).await;
        let task = task_writing_to(output);
        let mut ctx = ExecutionContext::new();

        let written = ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "title": "New <b>title</b>", "body": "Body" })),
                &mut ctx,
            )
            .await
            .unwrap();

        assert!(written.created.is_empty());
        let node = graph.node(&NodeId::from("out")).await.unwrap().unwrap();
        assert_eq!(node.id, NodeId::from("out"));
        assert_eq!(node.title(), "New title");
        assert_eq!(node.content(), "Body");
        assert!(ctx.response(&NodeId::from("out")).is_some());
    }

    #[tokio::test]
    async fn multiple_creates_distinct_nested_nodes() {
        let output = Node::new("out", NodeRole::ResponseMultiple).with_title("Ideas");
        let store = testing::store_with(vec![output.clone()], vec![]);
        testing::put_nested(
            &store,
            &output.id,
            vec![Node::new("old", NodeRole::Default).with_title("Existing")],
        )
        .await;
        let graph = testing::graph_context(store).await;
        let task = task_writing_to(output.clone());
        let mut ctx = ExecutionContext::new();

        let written = ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "items": [
                    { "title": "A", "body": "a" },
                    { "title": "B", "body": "b" },
                    { "title": "C", "body": "c" },
                ]})),
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(written.created.len(), 3);
        let nested = graph.nested_nodes(&output.id).await.unwrap();
        assert_eq!(nested.len(), 4);
        for id in &written.created {
            assert_eq!(nested.iter().filter(|n| &n.id == id).count(), 1);
            assert_ne!(id, &NodeId::from("old"));
        }
        assert!(nested.iter().skip(1).all(|n| n.role == NodeRole::Default));

        let untouched = graph.node(&output.id).await.unwrap().unwrap();
        assert_eq!(untouched, output);
    }

    #[tokio::test]
    async fn nested_markup_is_neutralized() {
        let output = Node::new("out", NodeRole::ResponseSingle);
        let store = testing::store_with(vec![output.clone()], vec![]);
        let graph = testing::graph_context(store).await;
        let task = task_writing_to(output.clone());

        ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({
                    "title": "<<b>b>Title",
                    "body": "<<b>script>alert(1)<</b>/script> <img src=x onerror=alert(2)",
                })),
                &mut ExecutionContext::new(),
            )
            .await
            .unwrap();

        let node = graph.node(&output.id).await.unwrap().unwrap();
        assert_eq!(node.title(), "Title");
        assert!(!node.content().contains("<script>"));
        assert!(!node.content().contains('<'));
        assert_eq!(node.content(), "alert(1) &lt;img src=x onerror=alert(2)");
    }

    #[tokio::test]
    async fn failed_create_leaves_no_nodes_behind() {
        let output = Node::new("out", NodeRole::ResponseMultiple);
        let inner = testing::store_with(vec![output.clone()], vec![]);
        testing::put_nested(
            &inner,
            &output.id,
            vec![Node::new("old", NodeRole::Default).with_title("Existing")],
        )
        .await;
        let store = Arc::new(testing::SpyStore::new(inner).failing_nested_after(2));
        let graph = GraphContext::new(store, CanvasKey::root(testing::CANVAS));
        let task = task_writing_to(output.clone());
        let mut ctx = ExecutionContext::new();

        let result = ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "items": [
                    { "title": "A", "body": "a" },
                    { "title": "B", "body": "b" },
                    { "title": "C", "body": "c" },
                ]})),
                &mut ctx,
            )
            .await;

        assert!(matches!(result, Err(Error::Store(_))));
        let nested = graph.nested_nodes(&output.id).await.unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].id, NodeId::from("old"));
        assert!(ctx.responses().is_empty());
    }

    #[tokio::test]
    async fn malformed_response_writes_nothing() {
        let output = Node::new("out", NodeRole::ResponseMultiple);
        let store = testing::store_with(vec![output.clone()], vec![]);
        let graph = testing::graph_context(store).await;
        let task = task_writing_to(output.clone());
        let mut ctx = ExecutionContext::new();

        let result = ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "items": [{ "title": "A" }] })),
                &mut ctx,
            )
            .await;

        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
        assert!(graph.nested_nodes(&output.id).await.unwrap().is_empty());
        assert!(ctx.responses().is_empty());
    }

    #[tokio::test]
    async fn table_appends_html() {
        let output = Node::new("out", NodeRole::ResponseTable).with_content("<p>Intro</p>");
        let store = testing::store_with(vec![output.clone()], vec![]);
        testing::put_nested(
            &store,
            &output.id,
            vec![Node::new("c", NodeRole::Default).with_title("Name")],
        )
        .await;
        let graph = testing::graph_context(store).await;
        let task = task_writing_to(output.clone());
        let materializer = ResultMaterializer::new(&graph);

        let schema = materializer.schema_for(&task).await.unwrap();
        assert_eq!(schema.name, "table");

        materializer
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "rows": [{ "name": "Ada" }] })),
                &mut ExecutionContext::new(),
            )
            .await
            .unwrap();

        let node = graph.node(&output.id).await.unwrap().unwrap();
        assert_eq!(
            node.content(),
            "<p>Intro</p>\n<table><thead><tr><th>Name</th></tr></thead>\
             <tbody><tr><td>Ada</td></tr></tbody></table>"
        );
    }

    #[tokio::test]
    async fn table_without_columns_fails() {
        let output = Node::new("out", NodeRole::ResponseTable);
        let store = testing::store_with(vec![output.clone()], vec![]);
        let graph = testing::graph_context(store).await;

        let result = ResultMaterializer::new(&graph)
            .schema_for(&task_writing_to(output))
            .await;
        assert!(matches!(result, Err(Error::MissingColumns(_))));
    }

    #[tokio::test]
    async fn papers_become_nested_nodes() {
        let output = Node::new("out", NodeRole::ResponseMultiple);
        let store = testing::store_with(vec![output.clone()], vec![]);
        let graph = testing::graph_context(store).await;
        let mut task = task_writing_to(output.clone());
        task.prompt_node.role = NodeRole::PaperFinder;

        let papers = vec![Paper {
            title: "Deep Sets".into(),
            year: Some(2017),
            ..Paper::default()
        }];
        let written = ResultMaterializer::new(&graph)
            .materialize(&task, TaskOutput::Papers(papers), &mut ExecutionContext::new())
            .await
            .unwrap();

        let nested = graph.nested_nodes(&output.id).await.unwrap();
        assert_eq!(written.created.len(), 1);
        assert_eq!(nested[0].title(), "Deep Sets");
        assert!(nested[0].content().contains("**Year:** 2017"));
    }

    #[tokio::test]
    async fn deleted_output_is_reported() {
        let graph = testing::graph_context(testing::store()).await;
        let task = task_writing_to(Node::new("gone", NodeRole::ResponseSingle));

        let result = ResultMaterializer::new(&graph)
            .materialize(
                &task,
                TaskOutput::Completion(json!({ "title": "t", "body": "b" })),
                &mut ExecutionContext::new(),
            )
            .await;
        assert!(matches!(result, Err(Error::MissingNode(_))));
    }
}
