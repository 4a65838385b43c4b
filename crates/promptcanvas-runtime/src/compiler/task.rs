//! Task and execution context types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::canvas::{Node, NodeId, NodeRole};

/// Which external API a task calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskKind {
    /// Structured completion.
    Prompt,
    /// Paper search.
    Search,
}

/// One invocation of a prompt node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The prompt (or search) node.
    pub prompt_node: Node,
    /// Inputs: fixed inputs first, then one item per loop group.
    pub input_nodes: Vec<Node>,
    /// Where the result is written.
    pub output_node: Option<Node>,
    /// Fan out over the live contents of loop-chosen response inputs at run time.
    pub loop_expansion: bool,
    /// Number of leading inputs wired directly to the prompt.
    pub fixed_inputs: usize,
}

impl Task {
    /// Creates a task for a prompt node with no inputs or output.
    pub fn new(prompt_node: Node) -> Self {
        Self {
            prompt_node,
            input_nodes: Vec::new(),
            output_node: None,
            loop_expansion: false,
            fixed_inputs: 0,
        }
    }

    /// Returns which API this task calls.
    pub fn kind(&self) -> TaskKind {
        match self.prompt_node.role {
            NodeRole::PaperFinder => TaskKind::Search,
            _ => TaskKind::Prompt,
        }
    }

    /// Returns whether the task can run: it has inputs and an output.
    pub fn is_runnable(&self) -> bool {
        !self.input_nodes.is_empty() && self.output_node.is_some()
    }

    /// Returns the inputs chosen from loop groups.
    pub fn loop_inputs(&self) -> &[Node] {
        let fixed = self.fixed_inputs.min(self.input_nodes.len());
        &self.input_nodes[fixed..]
    }

    /// Returns the ids of the nodes taking part in the task: prompt and inputs.
    pub fn involved_ids(&self) -> impl Iterator<Item = &NodeId> {
        std::iter::once(&self.prompt_node.id).chain(self.input_nodes.iter().map(|n| &n.id))
    }
}

/// Mutable accumulator passed through compilation and execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    task_list: Vec<Task>,
    responses: HashMap<NodeId, String>,
}

impl ExecutionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task.
    pub fn push_task(&mut self, task: Task) {
        self.task_list.push(task);
    }

    /// Returns the task list.
    pub fn tasks(&self) -> &[Task] {
        &self.task_list
    }

    /// Removes and returns the task list.
    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.task_list)
    }

    /// Drops tasks without inputs, then tasks without an output.
    ///
    /// Returns the number of tasks removed.
    pub fn retain_runnable(&mut self) -> usize {
        let before = self.task_list.len();
        self.task_list.retain(|t| !t.input_nodes.is_empty());
        self.task_list.retain(|t| t.output_node.is_some());
        before - self.task_list.len()
    }

    /// Records the response materialized into an output node.
    pub fn record_response(&mut self, node_id: NodeId, response: String) {
        self.responses.insert(node_id, response);
    }

    /// Returns the response recorded for an output node.
    pub fn response(&self, node_id: &NodeId) -> Option<&str> {
        self.responses.get(node_id).map(String::as_str)
    }

    /// Returns all recorded responses.
    pub fn responses(&self) -> &HashMap<NodeId, String> {
        &self.responses
    }
}
