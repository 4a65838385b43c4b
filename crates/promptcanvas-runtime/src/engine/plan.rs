//! Dry-run execution plans.

use serde::{Deserialize, Serialize};

use crate::assembler::AssembledPrompt;
use crate::compiler::{Task, TaskKind};

/// One task as it would run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// The compiled task.
    pub task: Task,
    /// Payload that would be sent.
    pub prompt: AssembledPrompt,
    /// API that would be called.
    pub kind: TaskKind,
}

/// What a run would do, produced instead of executing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Entries in execution order.
    pub entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing would run.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
