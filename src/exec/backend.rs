// src/exec/backend.rs

//! Pluggable task backend abstraction.
//!
//! The supervisor talks to a `TaskBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`task_runner`].
//!
//! - `ProcessBackend` is the default implementation used by `gorun`. It runs
//!   the resolved [`BuildPlan`] through [`build_and_run`].
//! - Tests can provide their own `TaskBackend` that, for example, records
//!   which tasks were started and finishes them on command.
//!
//! [`task_runner`]: crate::exec::task_runner

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::exec::context::ExecutionContext;
use crate::exec::task_runner::build_and_run;
use crate::exec::toolchain::BuildPlan;
use crate::types::TaskOutcome;

/// Future returned by [`TaskBackend::run`]; owned, so it can be spawned.
pub type TaskFuture = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'static>>;

/// Trait abstracting how one build+run cycle is executed.
///
/// Production code uses [`ProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait TaskBackend: Send + Sync {
    /// Start one cycle bound to `ctx`.
    ///
    /// The returned future must resolve to [`TaskOutcome::Cancelled`] soon
    /// after `ctx` is cancelled, and only once its subprocess is gone.
    fn run(&self, ctx: ExecutionContext) -> TaskFuture;
}

/// Real backend: builds with the toolchain, then runs the artifact.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    plan: Arc<BuildPlan>,
    args: Arc<Vec<String>>,
}

impl ProcessBackend {
    pub fn new(plan: BuildPlan, args: Vec<String>) -> Self {
        Self {
            plan: Arc::new(plan),
            args: Arc::new(args),
        }
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }
}

impl TaskBackend for ProcessBackend {
    fn run(&self, ctx: ExecutionContext) -> TaskFuture {
        // Clone the shared state so the future doesn't borrow `self`.
        let plan = Arc::clone(&self.plan);
        let args = Arc::clone(&self.args);

        Box::pin(async move { build_and_run(&plan, &args, ctx).await })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::exec::context::execution_context;
    use crate::exec::toolchain::{BuildMode, CommandSpec};

    #[tokio::test]
    async fn process_backend_runs_plan() {
        let backend = ProcessBackend::new(
            BuildPlan {
                mode: BuildMode::Build,
                build: CommandSpec::new("true"),
                artifact: "true".into(),
            },
            vec!["ignored".to_string()],
        );
        let (_handle, ctx) = execution_context(7);

        let outcome = tokio::spawn(backend.run(ctx)).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Success);
    }
}
