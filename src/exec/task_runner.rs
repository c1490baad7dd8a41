// src/exec/task_runner.rs

//! One build+run cycle: spawn the build step, then the program, both bound to
//! the same execution context.

use std::fmt;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::exec::context::ExecutionContext;
use crate::exec::process_group::{self, TerminalForeground};
use crate::exec::toolchain::{BuildPlan, CommandSpec};
use crate::types::{FailureCause, TaskOutcome};

/// The two subprocesses of a build+run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Run,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Build => "build",
            Step::Run => "run",
        })
    }
}

/// How a single subprocess step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Completed,
    Failed(FailureCause),
    Cancelled,
}

/// Build the target, then run the artifact with `args`.
///
/// - A cancellation during either step kills that step's process group, reaps
///   the child and returns [`TaskOutcome::Cancelled`].
/// - A cancellation that arrives between the two steps prevents the run step
///   from ever being spawned.
pub async fn build_and_run(
    plan: &BuildPlan,
    args: &[String],
    mut ctx: ExecutionContext,
) -> TaskOutcome {
    let task_id = ctx.id();

    if ctx.is_cancelled() {
        debug!(task_id, "cancelled before build");
        return TaskOutcome::Cancelled;
    }

    let started = Instant::now();
    info!(task_id, cmd = %plan.build, "building");
    match run_step(&mut ctx, Step::Build, &plan.build).await {
        StepResult::Completed => {}
        StepResult::Failed(cause) => return TaskOutcome::BuildFailed(cause),
        StepResult::Cancelled => return TaskOutcome::Cancelled,
    }

    if ctx.is_cancelled() {
        debug!(task_id, "cancelled between build and run");
        return TaskOutcome::Cancelled;
    }

    let mut run = CommandSpec::new(plan.artifact.clone());
    run.args.extend(args.iter().map(Into::into));

    info!(
        task_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "built, running"
    );
    match run_step(&mut ctx, Step::Run, &run).await {
        StepResult::Completed => TaskOutcome::Success,
        StepResult::Failed(cause) => TaskOutcome::RunFailed(cause),
        StepResult::Cancelled => TaskOutcome::Cancelled,
    }
}

/// Spawn `command` with the supervisor's stdio and wait for it, or kill its
/// process group if the context is cancelled first.
///
/// The run step holds the terminal foreground while it runs.
pub async fn run_step(ctx: &mut ExecutionContext, step: Step, command: &CommandSpec) -> StepResult {
    let task_id = ctx.id();

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    process_group::isolate(&mut cmd);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return StepResult::Failed(FailureCause::Io(format!(
                "spawning {}: {err}",
                command.program.to_string_lossy()
            )));
        }
    };

    let foreground = match step {
        Step::Run => TerminalForeground::hand_to(&child),
        Step::Build => TerminalForeground::none(),
    };
    debug!(task_id, %step, pid = child.id(), terminal = foreground.is_held(), "spawned");

    // Either the process exits on its own, or the supervisor tears the task
    // down. An exit that is already available wins.
    tokio::select! {
        biased;

        status_res = child.wait() => {
            process_group::release_terminal(foreground, &status_res);
            match status_res {
                Ok(status) if status.success() => {
                    debug!(task_id, %step, "step exited successfully");
                    StepResult::Completed
                }
                Ok(status) => {
                    debug!(task_id, %step, exit_code = ?status.code(), "step failed");
                    StepResult::Failed(FailureCause::Exited(status.code()))
                }
                Err(err) => StepResult::Failed(FailureCause::Io(format!(
                    "waiting for {}: {err}",
                    command.program.to_string_lossy()
                ))),
            }
        }

        _ = ctx.cancelled() => {
            info!(task_id, %step, "cancellation requested; killing process group");
            if let Err(e) = process_group::kill_group(&mut child).await {
                warn!(task_id, %step, error = %e, "failed to kill child process on cancellation");
            }
            drop(foreground);
            StepResult::Cancelled
        }
    }
}
