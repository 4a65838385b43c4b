//! Executor configuration.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::materializer::LayoutConfig;

/// Default number of runs an executor drives at once.
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;

/// Configuration for the task executor.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    name = "ExecutorConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct ExecutorConfig {
    /// Maximum number of runs executing at the same time.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-concurrent-runs",
            env = "PROMPTCANVAS_MAX_CONCURRENT_RUNS",
            default_value_t = DEFAULT_MAX_CONCURRENT_RUNS
        )
    )]
    #[builder(default = "DEFAULT_MAX_CONCURRENT_RUNS")]
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// Replace input nodes by their own predecessors when building the graph.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "splice-inputs",
            env = "PROMPTCANVAS_SPLICE_INPUTS",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[builder(default = "true")]
    #[serde(default = "default_splice_inputs")]
    pub splice_inputs: bool,

    /// Placement of nodes created in nested canvases.
    #[cfg_attr(feature = "config", arg(skip))]
    #[builder(default)]
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            splice_inputs: true,
            layout: LayoutConfig::default(),
        }
    }
}

impl ExecutorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

impl ExecutorConfigBuilder {
    fn validate_config(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_runs
            && max == 0
        {
            return Err("max_concurrent_runs must be at least 1".into());
        }
        Ok(())
    }
}

fn default_max_concurrent_runs() -> usize {
    DEFAULT_MAX_CONCURRENT_RUNS
}

fn default_splice_inputs() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(
            ExecutorConfig::builder()
                .with_max_concurrent_runs(0usize)
                .build()
                .is_err()
        );
    }

    #[test]
    fn builder_defaults_match_default() {
        let config = ExecutorConfig::builder().build().unwrap();
        assert_eq!(config.max_concurrent_runs, DEFAULT_MAX_CONCURRENT_RUNS);
        assert!(config.splice_inputs);
        assert_eq!(config.layout, LayoutConfig::default());
    }
}
