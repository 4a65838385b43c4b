#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod signal;
mod snapshot;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use promptcanvas_runtime::engine::{RunRequest, TaskExecutor};
use promptcanvas_runtime::store::InMemoryStore;
use tokio_util::sync::CancellationToken;

use crate::config::{Cli, Command, RunArgs};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "promptcanvas_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "promptcanvas_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "promptcanvas_cli::config";
pub const TRACING_TARGET_SNAPSHOT: &str = "promptcanvas_cli::snapshot";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    Cli::log_build_info();

    match cli.command {
        Command::Run(args) => run_canvas(args).await,
    }
}

/// Loads a snapshot, runs one canvas and writes the report and the result.
async fn run_canvas(args: RunArgs) -> anyhow::Result<()> {
    args.log();

    let document = snapshot::load(&args.snapshot).await?;
    let store = Arc::new(InMemoryStore::from_snapshot(document));

    let mut executor = TaskExecutor::new(args.executor.clone()).with_store(store.clone());
    if !args.dry_run {
        executor = attach_services(executor, &args);
    }

    let cancellation = CancellationToken::new();
    signal::cancel_on_ctrl_c(cancellation.clone());

    let mut request = RunRequest::builder()
        .with_canvas(args.canvas_key())
        .with_dry_run(args.dry_run)
        .with_trigger(args.trigger())
        .with_cancellation(cancellation.clone());
    if let Some(persona) = args.persona().await? {
        request = request.with_persona(persona);
    }
    let request = request.build().context("invalid run request")?;

    let report = executor
        .run(request)
        .await
        .with_context(|| format!("failed to run canvas '{}'", args.canvas))?;
    // Stops the signal task.
    cancellation.cancel();

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("{json}");

    if !args.dry_run {
        let output = args.output_path();
        snapshot::save(output, &store.snapshot().await).await?;
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            path = %output.display(),
            executed = report.tasks_executed,
            failed = report.tasks_failed,
            "Document saved"
        );
    }

    Ok(())
}

/// Attaches the completion provider and the paper search client.
///
/// A service that fails to build is left out; tasks needing it fail on their own.
fn attach_services(mut executor: TaskExecutor, args: &RunArgs) -> TaskExecutor {
    match args.rig.completion_provider() {
        Ok(provider) => executor = executor.with_completion(Arc::new(provider)),
        Err(e) => tracing::warn!(
            target: TRACING_TARGET_CONFIG,
            error = %e,
            "Completion provider unavailable"
        ),
    }

    match args.rig.search_client() {
        Ok(client) => executor = executor.with_search(Arc::new(client)),
        Err(e) => tracing::warn!(
            target: TRACING_TARGET_CONFIG,
            error = %e,
            "Paper search unavailable"
        ),
    }

    executor
}
