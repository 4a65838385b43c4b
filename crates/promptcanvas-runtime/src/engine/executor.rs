//! Task execution engine.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::{
    ExecutionPlan, ExecutorConfig, GraphContext, Notice, Persona, PlanEntry, RunReport, RunRequest,
};
use crate::assembler::{AssembledPrompt, PromptAssembler};
use crate::canvas::{ExecutionState, Node, NodeId, NodeRole};
use crate::compiler::{ExecutionContext, Task, TaskCompiler, combinations};
use crate::graph::GraphBuilder;
use crate::materializer::{Materialized, ResultMaterializer, TaskOutput};
use crate::provider::{CompletionApi, CompletionRequest, SearchApi};
use crate::store::DocumentStore;
use crate::{Error, Result};

/// Tracing target for execution.
const TRACING_TARGET: &str = "promptcanvas_runtime::engine";

/// Compiles a canvas and drives its task list to completion.
///
/// Tasks run strictly one after another. Cancellation is checked before
/// every task and every loop sub-task; calls already in flight finish.
pub struct TaskExecutor {
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
    store: Option<Arc<dyn DocumentStore>>,
    completion: Option<Arc<dyn CompletionApi>>,
    search: Option<Arc<dyn SearchApi>>,
}

impl TaskExecutor {
    /// Creates an executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs));

        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_runs = config.max_concurrent_runs,
            splice_inputs = config.splice_inputs,
            "Task executor initialized"
        );

        Self {
            config,
            semaphore,
            store: None,
            completion: None,
            search: None,
        }
    }

    /// Creates an executor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExecutorConfig::default())
    }

    /// Attaches the document store.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attaches the completion API.
    pub fn with_completion(mut self, completion: Arc<dyn CompletionApi>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Attaches the paper search API.
    pub fn with_search(mut self, search: Arc<dyn SearchApi>) -> Self {
        self.search = Some(search);
        self
    }

    /// Returns the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Returns the number of runs that could start right now.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Compiles the requested canvas and runs (or plans) its tasks.
    ///
    /// Setup problems and graph cycles are returned as errors before any
    /// task starts. Failures of individual tasks are reported as notices and
    /// do not stop the run.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::Config(format!("executor closed: {e}")))?;

        let persona = request.persona.as_ref().ok_or(Error::MissingPersona)?;
        let store = self.store.clone().ok_or(Error::MissingDocument)?;
        let graph = GraphContext::new(store, request.canvas.clone());
        if !graph.exists().await? {
            return Err(Error::MissingCanvas(request.canvas.clone()));
        }

        let dependency = GraphBuilder::new()
            .with_input_splicing(self.config.splice_inputs)
            .build(graph.nodes().await?, graph.edges().await?)?;

        let mut ctx = ExecutionContext::new();
        let diagnostics = TaskCompiler::new().compile(&dependency, &mut ctx);
        let tasks = ctx.take_tasks();

        let mut report = RunReport::new(request.trigger);
        report.tasks_compiled = tasks.len();
        report.notices.extend(diagnostics.into_iter().map(Notice::from));

        tracing::info!(
            target: TRACING_TARGET,
            canvas = %request.canvas,
            trigger = %request.trigger,
            dry_run = request.dry_run,
            tasks = tasks.len(),
            "Starting run"
        );

        if request.dry_run {
            let plan = self
                .plan(&graph, persona, &tasks, &request.cancellation, &mut report)
                .await;
            report.plan = Some(plan);
        } else {
            let cancel = &request.cancellation;
            self.execute(&graph, persona, &tasks, &mut ctx, cancel, &mut report)
                .await;
        }

        tracing::info!(
            target: TRACING_TARGET,
            canvas = %request.canvas,
            executed = report.tasks_executed,
            failed = report.tasks_failed,
            cancelled = report.cancelled,
            "Run finished"
        );

        Ok(report)
    }

    /// Assembles every task without calling any API or writing.
    ///
    /// A task that fails to assemble is reported like a failed task and left
    /// out of the plan.
    async fn plan(
        &self,
        graph: &GraphContext,
        persona: &Persona,
        tasks: &[Task],
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) -> ExecutionPlan {
        let assembler = PromptAssembler::new(graph);
        let mut plan = ExecutionPlan::default();

        for task in tasks {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match assembler.assemble(task, persona).await {
                Ok(prompt) => plan.entries.push(PlanEntry {
                    task: task.clone(),
                    prompt,
                    kind: task.kind(),
                }),
                Err(error) => record_failure(report, task, error),
            }
        }

        plan
    }

    /// Runs the task list, resetting node states as tasks finish.
    async fn execute(
        &self,
        graph: &GraphContext,
        persona: &Persona,
        tasks: &[Task],
        ctx: &mut ExecutionContext,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) {
        let mut pending = Participation::of(tasks);
        set_states(graph, pending.ids(), ExecutionState::Active).await;

        for task in tasks {
            if cancel.is_cancelled() {
                tracing::info!(target: TRACING_TARGET, "Run cancelled");
                report.cancelled = true;
                break;
            }

            let ids: Vec<NodeId> = task.involved_ids().cloned().collect();
            set_states(graph, &ids, ExecutionState::Executing).await;

            if task.loop_expansion {
                self.execute_fan_out(graph, persona, task, ctx, cancel, report)
                    .await;
            } else {
                let result = self.execute_one(graph, persona, task, ctx).await;
                record(report, task, result);
            }

            let finished = pending.finish(task);
            set_states(graph, &finished, ExecutionState::Inactive).await;

            if report.cancelled {
                break;
            }
        }

        set_states(graph, &pending.remaining(), ExecutionState::Inactive).await;
    }

    /// Runs one sub-task per combination of the live nested items of the
    /// task's loop-chosen response inputs.
    async fn execute_fan_out(
        &self,
        graph: &GraphContext,
        persona: &Persona,
        task: &Task,
        ctx: &mut ExecutionContext,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) {
        let subtasks = match expand_loop_inputs(graph, task).await {
            Ok(subtasks) => subtasks,
            Err(error) => {
                record(report, task, Err(error));
                return;
            }
        };

        let prompt_id = &task.prompt_node.id;
        let total = subtasks.len();
        tracing::debug!(
            target: TRACING_TARGET,
            prompt_id = %prompt_id,
            subtasks = total,
            "Fanning out loop task"
        );

        for (done, subtask) in subtasks.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    target: TRACING_TARGET,
                    prompt_id = %prompt_id,
                    "Fan-out cancelled"
                );
                report.cancelled = true;
                break;
            }

            let result = self.execute_one(graph, persona, subtask, ctx).await;
            record(report, subtask, result);

            let progress = (done + 1) as f32 / total as f32;
            set_progress(graph, prompt_id, Some(progress)).await;
        }

        set_progress(graph, prompt_id, None).await;
    }

    /// Assembles, calls the external API and materializes one task.
    async fn execute_one(
        &self,
        graph: &GraphContext,
        persona: &Persona,
        task: &Task,
        ctx: &mut ExecutionContext,
    ) -> Result<Materialized> {
        let materializer = ResultMaterializer::new(graph).with_layout(self.config.layout);

        let output = match PromptAssembler::new(graph).assemble(task, persona).await? {
            AssembledPrompt::Messages(messages) => {
                let completion = self
                    .completion
                    .as_ref()
                    .ok_or_else(|| Error::Completion("no completion API attached".into()))?;
                let request = CompletionRequest {
                    model: persona.model.clone(),
                    messages,
                    schema: materializer.schema_for(task).await?,
                };
                let value = completion.complete(request).await?.into_value().await?;
                TaskOutput::Completion(value)
            }
            AssembledPrompt::Query(query) => {
                let search = self
                    .search
                    .as_ref()
                    .ok_or_else(|| Error::Search("no search API attached".into()))?;
                TaskOutput::Papers(search.search(&query).await?)
            }
        };

        materializer.materialize(task, output, ctx).await
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("config", &self.config)
            .field("available_slots", &self.available_slots())
            .field("store", &self.store.is_some())
            .field("completion", &self.completion.is_some())
            .field("search", &self.search.is_some())
            .finish()
    }
}

/// Counts how many pending tasks each canvas node still takes part in.
struct Participation {
    order: Vec<NodeId>,
    counts: HashMap<NodeId, usize>,
}

impl Participation {
    fn of(tasks: &[Task]) -> Self {
        let mut order = Vec::new();
        let mut counts = HashMap::new();
        for task in tasks {
            for id in task.involved_ids() {
                let count = counts.entry(id.clone()).or_insert(0);
                if *count == 0 {
                    order.push(id.clone());
                }
                *count += 1;
            }
        }
        Self { order, counts }
    }

    fn ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Marks a task as done and returns the nodes no other pending task uses.
    fn finish(&mut self, task: &Task) -> Vec<NodeId> {
        let mut finished = Vec::new();
        for id in task.involved_ids() {
            if let Some(count) = self.counts.get_mut(id)
                && *count > 0
            {
                *count -= 1;
                if *count == 0 {
                    finished.push(id.clone());
                }
            }
        }
        finished
    }

    /// Returns the nodes still used by pending tasks.
    fn remaining(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .filter(|id| self.counts.get(*id).is_some_and(|c| *c > 0))
            .cloned()
            .collect()
    }
}

/// Replaces each loop-chosen response input by the items of its nested
/// canvas and returns one sub-task per combination.
async fn expand_loop_inputs(graph: &GraphContext, task: &Task) -> Result<Vec<Task>> {
    let mut groups = Vec::with_capacity(task.loop_inputs().len());
    for input in task.loop_inputs() {
        groups.push(loop_items(graph, input).await?);
    }

    let fixed = &task.input_nodes[..task.input_nodes.len() - task.loop_inputs().len()];
    Ok(combinations(&groups)
        .into_iter()
        .map(|combo| {
            let mut subtask = task.clone();
            subtask.loop_expansion = false;
            subtask.input_nodes = fixed.iter().cloned().chain(combo).collect();
            subtask
        })
        .collect())
}

async fn loop_items(graph: &GraphContext, input: &Node) -> Result<Vec<Node>> {
    match input.role {
        NodeRole::ResponseSingle | NodeRole::ResponseMultiple | NodeRole::ResponseCombined => {
            let nested = graph.nested_nodes(&input.id).await?;
            if nested.is_empty() {
                Ok(vec![input.clone()])
            } else {
                Ok(nested)
            }
        }
        _ => Ok(vec![input.clone()]),
    }
}

/// Counts a (sub-)task outcome and turns failures into notices.
fn record(report: &mut RunReport, task: &Task, result: Result<Materialized>) {
    match result {
        Ok(written) => {
            report.tasks_executed += 1;
            tracing::debug!(
                target: TRACING_TARGET,
                prompt_id = %task.prompt_node.id,
                output_id = %written.output_id,
                created = written.created.len(),
                "Task completed"
            );
        }
        Err(error) => record_failure(report, task, error),
    }
}

/// Counts a failed (sub-)task and adds its notice.
fn record_failure(report: &mut RunReport, task: &Task, error: Error) {
    report.tasks_failed += 1;
    tracing::error!(
        target: TRACING_TARGET,
        prompt_id = %task.prompt_node.id,
        error = %error,
        "Task failed"
    );
    report
        .notices
        .push(Notice::task_failed(&task.prompt_node.id, &error));
}

/// Sets the fan-out progress of a prompt node, logging store failures.
async fn set_progress(graph: &GraphContext, prompt_id: &NodeId, progress: Option<f32>) {
    if let Err(error) = graph.set_progress(prompt_id, progress).await {
        tracing::warn!(
            target: TRACING_TARGET,
            prompt_id = %prompt_id,
            error = %error,
            "Failed to update progress"
        );
    }
}

/// Sets the execution state of canvas nodes, logging store failures.
async fn set_states(graph: &GraphContext, ids: &[NodeId], state: ExecutionState) {
    for id in ids {
        if let Err(error) = graph.set_execution_state(id, state).await {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %id,
                state = %state,
                error = %error,
                "Failed to update execution state"
            );
        }
    }
}
