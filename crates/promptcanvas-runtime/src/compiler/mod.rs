//! Graph-to-task compilation.
//!
//! - [`TaskCompiler`]: Walks a [`DependencyGraph`](crate::graph::DependencyGraph)
//!   and produces the ordered task list
//! - [`Task`]: One prompt invocation with its inputs and output destination
//! - [`ExecutionContext`]: Mutable accumulator shared by compilation and execution
//! - [`Diagnostic`]: Non-fatal findings reported while compiling

mod compiler;
mod diagnostic;
mod expand;
mod task;

pub use compiler::TaskCompiler;
pub use diagnostic::{Diagnostic, Severity};
pub use task::{ExecutionContext, Task, TaskKind};

pub(crate) use expand::combinations;
