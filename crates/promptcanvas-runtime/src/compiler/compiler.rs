//! Task compiler.
//!
//! The compiler visits prompt and search nodes in topological order and
//! turns each into one or more [`Task`]s:
//!
//! 1. **Inputs**: response and plain predecessors become fixed inputs; loop
//!    predecessors contribute one item group each
//! 2. **Output**: the first response node downstream of the prompt
//! 3. **Expansion**: one task per combination of loop items
//! 4. **Filtering**: tasks without inputs or output are dropped

use super::diagnostic::Diagnostic;
use super::expand::combinations;
use super::task::{ExecutionContext, Task};
use crate::canvas::{Node, NodeRole};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;

/// Tracing target for compilation.
const TRACING_TARGET: &str = "promptcanvas_runtime::compiler";

/// Compiles a dependency graph into an ordered task list.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskCompiler;

impl TaskCompiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self
    }

    /// Appends the tasks of every prompt node to `ctx` and filters the list.
    ///
    /// A node that fails to compile produces no tasks; its error is returned
    /// as a diagnostic and the remaining nodes still compile.
    pub fn compile(&self, graph: &DependencyGraph, ctx: &mut ExecutionContext) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for id in graph.topo_order() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            if !node.role.is_task_source() {
                continue;
            }

            if let Err(error) = self.compile_node(graph, node, ctx, &mut diagnostics) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    node_id = %node.id,
                    error = %error,
                    "node failed to compile"
                );
                diagnostics.push(Diagnostic::error(&node.id, &error));
            }
        }

        let compiled = ctx.tasks().len();
        let dropped = ctx.retain_runnable();

        tracing::debug!(
            target: TRACING_TARGET,
            compiled,
            dropped,
            runnable = ctx.tasks().len(),
            diagnostics = diagnostics.len(),
            "task list compiled"
        );

        diagnostics
    }

    /// Compiles the tasks of one prompt or search node.
    fn compile_node(
        &self,
        graph: &DependencyGraph,
        node: &Node,
        ctx: &mut ExecutionContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        let mut base = Task::new(node.clone());
        let mut groups: Vec<Vec<Node>> = Vec::new();

        for pred in graph.predecessor_nodes(&node.id) {
            match pred.role {
                NodeRole::Default
                | NodeRole::ResponseSingle
                | NodeRole::ResponseMultiple
                | NodeRole::ResponseCombined
                | NodeRole::ResponseTable => base.input_nodes.push(pred.clone()),
                NodeRole::Loop => groups.push(
                    graph
                        .predecessor_nodes(&pred.id)
                        .filter(|item| item.role.is_input_eligible())
                        .cloned()
                        .collect(),
                ),
                NodeRole::Prompt
                | NodeRole::PaperFinder
                | NodeRole::Input
                | NodeRole::Output
                | NodeRole::Other => {}
            }
        }
        base.fixed_inputs = base.input_nodes.len();
        base.output_node = self.resolve_output(graph, node, diagnostics)?;

        if groups.is_empty() {
            ctx.push_task(base);
            return Ok(());
        }

        let combos = combinations(&groups);
        tracing::trace!(
            target: TRACING_TARGET,
            node_id = %node.id,
            groups = groups.len(),
            combinations = combos.len(),
            "expanding loop groups"
        );

        for combo in combos {
            let mut task = base.clone();
            task.loop_expansion = combo.iter().any(|item| item.role.is_response());
            task.input_nodes.extend(combo);
            ctx.push_task(task);
        }

        Ok(())
    }

    /// Finds the response node a prompt writes into.
    ///
    /// The first candidate in document order wins.
    fn resolve_output(
        &self,
        graph: &DependencyGraph,
        node: &Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<Node>> {
        let mut candidates = graph
            .successor_nodes(&node.id)
            .filter(|candidate| candidate.role.is_response());

        let Some(output) = candidates.next() else {
            diagnostics.push(Diagnostic::warning(
                &node.id,
                "prompt has no response node to write into",
            ));
            return Ok(None);
        };

        let extra = candidates.count();
        if extra > 0 {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id,
                output_id = %output.id,
                ignored = extra,
                "multiple response nodes, using the first"
            );
            diagnostics.push(Diagnostic::warning(
                &node.id,
                format!(
                    "prompt feeds {} response nodes, writing into {}",
                    extra + 1,
                    output.id
                ),
            ));
        }

        if node.role == NodeRole::PaperFinder && output.role != NodeRole::ResponseMultiple {
            return Err(Error::SearchOutput {
                node_id: node.id.clone(),
                found: output.role,
            });
        }

        Ok(Some(output.clone()))
    }
}
