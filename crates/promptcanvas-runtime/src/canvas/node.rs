//! Node types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::{NodeId, Position};

/// Role of a node on the canvas.
///
/// Roles the runtime does not know deserialize as [`NodeRole::Other`] and are
/// ignored by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NodeRole {
    /// A plain content node.
    #[default]
    Default,
    /// An instruction sent to the language model.
    Prompt,
    /// A fan-out point: its predecessors are interchangeable alternatives.
    Loop,
    /// An external injection point, spliced out of the dependency graph.
    Input,
    /// Legacy output marker; not a response destination.
    Output,
    /// Response destination holding one `{title, body}` result.
    ResponseSingle,
    /// Response destination holding one node per result item.
    ResponseMultiple,
    /// Response destination combining all inputs into one result.
    ResponseCombined,
    /// Response destination rendered as a table.
    ResponseTable,
    /// A paper search instruction.
    PaperFinder,
    /// Any role this runtime does not interpret.
    #[serde(other)]
    Other,
}

impl NodeRole {
    /// Returns whether this role is a response destination.
    pub const fn is_response(&self) -> bool {
        matches!(
            self,
            Self::ResponseSingle
                | Self::ResponseMultiple
                | Self::ResponseCombined
                | Self::ResponseTable
        )
    }

    /// Returns whether this role produces tasks.
    pub const fn is_task_source(&self) -> bool {
        matches!(self, Self::Prompt | Self::PaperFinder)
    }

    /// Returns whether a node of this role can feed a prompt as input.
    pub const fn is_input_eligible(&self) -> bool {
        self.is_response() || matches!(self, Self::Default)
    }
}

/// Execution state of a node, shown on the canvas while a run is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionState {
    /// Not part of a running task.
    #[default]
    Inactive,
    /// Scheduled in the current run.
    Active,
    /// Its task is calling the external API.
    Executing,
}

/// Content and presentation attributes of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Title shown on the node; the instruction text for prompt nodes.
    #[serde(default)]
    pub title: String,
    /// Page content.
    #[serde(default)]
    pub content: String,
    /// Fan-out progress in `[0, 1]` while a loop task runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Selected assistant persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

/// A node on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Role of the node.
    #[serde(default, rename = "type")]
    pub role: NodeRole,
    /// Position on the canvas.
    #[serde(default)]
    pub position: Position,
    /// Current execution state.
    #[serde(default)]
    pub execution_state: ExecutionState,
    /// Content and presentation attributes.
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Creates a node with the given id and role.
    pub fn new(id: impl Into<NodeId>, role: NodeRole) -> Self {
        Self {
            id: id.into(),
            role,
            position: Position::default(),
            execution_state: ExecutionState::default(),
            data: NodeData::default(),
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.data.title = title.into();
        self
    }

    /// Sets the page content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.data.content = content.into();
        self
    }

    /// Sets the position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.data.title
    }

    /// Returns the page content.
    pub fn content(&self) -> &str {
        &self.data.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_canvas_node() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "type": "response-multiple",
            "position": { "x": 10.0, "y": 20.0 },
            "data": { "title": "Ideas" }
        }))
        .unwrap();

        assert_eq!(node.id, NodeId::from("n1"));
        assert_eq!(node.role, NodeRole::ResponseMultiple);
        assert_eq!(node.execution_state, ExecutionState::Inactive);
        assert_eq!(node.title(), "Ideas");
    }

    #[test]
    fn untyped_node_is_default() {
        let node: Node = serde_json::from_value(serde_json::json!({ "id": "n1" })).unwrap();
        assert_eq!(node.role, NodeRole::Default);
        assert!(node.role.is_input_eligible());
    }

    #[test]
    fn unknown_role_is_other() {
        let node: Node =
            serde_json::from_value(serde_json::json!({ "id": "n1", "type": "sticky-note" }))
                .unwrap();
        assert_eq!(node.role, NodeRole::Other);
        assert!(!node.role.is_input_eligible());
    }

    #[test]
    fn role_classification() {
        assert!(NodeRole::ResponseTable.is_response());
        assert!(!NodeRole::Output.is_response());
        assert!(NodeRole::PaperFinder.is_task_source());
        assert!(!NodeRole::Loop.is_input_eligible());
    }
}
