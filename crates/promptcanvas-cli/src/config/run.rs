//! Arguments of the `run` subcommand.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use promptcanvas_rig::RigConfig;
use promptcanvas_runtime::canvas::CanvasKey;
use promptcanvas_runtime::engine::{ExecutorConfig, Persona, RunTrigger};

use crate::TRACING_TARGET_CONFIG;

/// Arguments of `promptcanvas run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Document snapshot (JSON) to load.
    pub snapshot: PathBuf,

    /// Id of the top-level canvas to run.
    #[arg(long, env = "PROMPTCANVAS_CANVAS")]
    pub canvas: String,

    /// Assemble prompts and print the plan without calling any API.
    #[arg(long)]
    pub dry_run: bool,

    /// Mark the run as triggered by opening the document.
    #[arg(long, conflicts_with = "dry_run")]
    pub on_load: bool,

    /// Persona definition (JSON with `name`, `instructions`, `model`).
    #[arg(long, env = "PROMPTCANVAS_PERSONA_FILE", conflicts_with = "persona_name")]
    pub persona_file: Option<PathBuf>,

    /// Persona name, when no persona file is given.
    #[arg(long, env = "PROMPTCANVAS_PERSONA")]
    pub persona_name: Option<String>,

    /// Persona instructions, used with `--persona-name`.
    #[arg(long, env = "PROMPTCANVAS_INSTRUCTIONS", default_value = "")]
    pub instructions: String,

    /// Where to write the updated snapshot; defaults to the input file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Executor configuration.
    #[command(flatten)]
    pub executor: ExecutorConfig,

    /// Completion and search configuration.
    #[command(flatten)]
    pub rig: RigConfig,
}

impl RunArgs {
    /// Returns the canvas to run.
    pub fn canvas_key(&self) -> CanvasKey {
        CanvasKey::root(self.canvas.as_str())
    }

    /// Returns what started the run.
    pub fn trigger(&self) -> RunTrigger {
        if self.dry_run {
            RunTrigger::DryRunPreview
        } else if self.on_load {
            RunTrigger::OnLoad
        } else {
            RunTrigger::Interactive
        }
    }

    /// Returns the path the updated snapshot is written to.
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.snapshot)
    }

    /// Loads the persona from the persona file or the persona flags.
    ///
    /// Returns `None` when neither is given.
    pub async fn persona(&self) -> anyhow::Result<Option<Persona>> {
        if let Some(path) = &self.persona_file {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read persona file {}", path.display()))?;
            let persona: Persona = serde_json::from_str(&raw)
                .with_context(|| format!("invalid persona file {}", path.display()))?;
            return Ok(Some(persona));
        }

        Ok(self.persona_name.as_ref().map(|name| {
            Persona::new(name.as_str(), self.instructions.as_str()).with_model(&self.rig.model)
        }))
    }

    /// Logs the run configuration (no sensitive information).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            snapshot = %self.snapshot.display(),
            canvas = %self.canvas,
            dry_run = self.dry_run,
            trigger = %self.trigger(),
            provider = %self.rig.provider,
            model = %self.rig.model,
            max_concurrent_runs = self.executor.max_concurrent_runs,
            splice_inputs = self.executor.splice_inputs,
            "Run configuration"
        );
    }
}
