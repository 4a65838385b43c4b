//! Run outcome reporting.

use serde::{Deserialize, Serialize};

use super::{ExecutionPlan, RunTrigger};
use crate::Error;
use crate::canvas::NodeId;
use crate::compiler::{Diagnostic, Severity};

/// A human-readable message surfaced to the user after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub severity: Severity,
    /// Node the notice is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Creates an error notice for a failed task.
    pub fn task_failed(node_id: &NodeId, error: &Error) -> Self {
        Self {
            severity: Severity::Error,
            node_id: Some(node_id.clone()),
            message: error.to_string(),
        }
    }
}

impl From<Diagnostic> for Notice {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            severity: diagnostic.severity,
            node_id: Some(diagnostic.node_id),
            message: diagnostic.message,
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// What started the run.
    pub trigger: RunTrigger,
    /// Runnable tasks produced by compilation.
    pub tasks_compiled: usize,
    /// Tasks (and loop sub-tasks) whose results were written.
    pub tasks_executed: usize,
    /// Tasks (and loop sub-tasks) that failed.
    pub tasks_failed: usize,
    /// Whether the run stopped on cancellation.
    pub cancelled: bool,
    /// Compile diagnostics and task failures.
    pub notices: Vec<Notice>,
    /// The plan, for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
}

impl RunReport {
    /// Creates an empty report.
    pub fn new(trigger: RunTrigger) -> Self {
        Self {
            trigger,
            ..Self::default()
        }
    }

    /// Returns true if any task failed or any node failed to compile.
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.severity == Severity::Error)
    }
}
