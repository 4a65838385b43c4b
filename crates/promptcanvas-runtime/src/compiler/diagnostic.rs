//! Compilation diagnostics.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::Error;
use crate::canvas::NodeId;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// Advisory; the node still compiled.
    Warning,
    /// The node produced no tasks.
    Error,
}

/// A finding about one node reported during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Node the finding is about.
    pub node_id: NodeId,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a warning.
    pub fn warning(node_id: &NodeId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            node_id: node_id.clone(),
            message: message.into(),
        }
    }

    /// Creates an error diagnostic from a compilation error.
    pub fn error(node_id: &NodeId, error: &Error) -> Self {
        Self {
            severity: Severity::Error,
            node_id: node_id.clone(),
            message: error.to_string(),
        }
    }

    /// Returns whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
