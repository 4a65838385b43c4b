//! Run requests.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio_util::sync::CancellationToken;

use super::Persona;
use crate::canvas::CanvasKey;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunTrigger {
    /// The user pressed run.
    #[default]
    Interactive,
    /// The user asked for a preview of what would run.
    DryRunPreview,
    /// The document was opened with run-on-load enabled.
    OnLoad,
}

/// Parameters of one run.
#[derive(Debug, Clone, Builder)]
#[builder(
    name = "RunRequestBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_request")
)]
pub struct RunRequest {
    /// Canvas to compile and run.
    pub canvas: CanvasKey,
    /// Persona the run speaks as.
    #[builder(default)]
    pub persona: Option<Persona>,
    /// Plan only: assemble prompts without calling any API or writing.
    #[builder(default)]
    pub dry_run: bool,
    /// What started the run.
    #[builder(default)]
    pub trigger: RunTrigger,
    /// Token the caller cancels to stop the run between tasks.
    #[builder(default)]
    pub cancellation: CancellationToken,
}

impl RunRequest {
    /// Creates a new request builder.
    pub fn builder() -> RunRequestBuilder {
        RunRequestBuilder::default()
    }
}

impl RunRequestBuilder {
    fn validate_request(&self) -> Result<(), String> {
        if self.trigger == Some(RunTrigger::DryRunPreview) && self.dry_run == Some(false) {
            return Err("a dry-run preview cannot execute tasks".into());
        }
        Ok(())
    }

    /// Marks the request as a dry-run preview.
    pub fn preview(self) -> Self {
        self.with_dry_run(true).with_trigger(RunTrigger::DryRunPreview)
    }
}
