//! Run orchestration.
//!
//! [`TaskExecutor`] owns the lifecycle of a run:
//!
//! 1. **Setup**: persona, document store and canvas must be present
//! 2. **Compilation**: graph build and task compilation; diagnostics become notices
//! 3. **Execution**: tasks run one by one, or are only assembled into an
//!    [`ExecutionPlan`] for dry runs
//!
//! Node states move `inactive → active → executing → inactive` as tasks are
//! scheduled, started and finished.

mod config;
mod context;
mod executor;
mod persona;
mod plan;
mod report;
mod request;

pub use config::{
    DEFAULT_MAX_CONCURRENT_RUNS, ExecutorConfig, ExecutorConfigBuilder, ExecutorConfigBuilderError,
};
pub use context::GraphContext;
pub use executor::TaskExecutor;
pub use persona::{DEFAULT_MODEL, Persona};
pub use plan::{ExecutionPlan, PlanEntry};
pub use report::{Notice, RunReport};
pub use request::{RunRequest, RunRequestBuilder, RunRequestBuilderError, RunTrigger};
