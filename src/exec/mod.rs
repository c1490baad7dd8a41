// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually building and running the target,
//! using `tokio::process::Command`, and reporting a [`TaskOutcome`] back to
//! the supervisor.
//!
//! - [`context`] provides the cancel handle / execution context pair bound to
//!   one in-flight task.
//! - [`toolchain`] resolves the build plan (`go build` vs `go install`).
//! - [`task_runner`] handles the build and run subprocesses.
//! - [`process_group`] gives every step its own process group and lends the
//!   terminal to the run step.
//! - [`backend`] provides the `TaskBackend` trait and the concrete
//!   `ProcessBackend` used in production, which tests can replace with a
//!   fake implementation.
//!
//! [`TaskOutcome`]: crate::types::TaskOutcome

pub mod backend;
pub mod context;
pub mod process_group;
pub mod task_runner;
pub mod toolchain;

pub use backend::{ProcessBackend, TaskBackend, TaskFuture};
pub use context::{execution_context, CancelHandle, ExecutionContext};
pub use toolchain::{BuildMode, BuildPlan, CommandSpec, GoToolchain};
