// src/engine/event_handlers.rs

//! Event handling logic for the supervisor core.

use tracing::{debug, trace, warn};

use crate::engine::{SupervisorOptions, SupervisorState};
use crate::signals::ShutdownSignal;
use crate::types::{ChangeEvent, TaskOutcome};
use crate::watch::RelevanceFilter;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a new build+run task.
    SpawnTask,
    /// Cancel the in-flight task and wait for it; the shell feeds the outcome
    /// back as `TaskFinished`.
    CancelTask,
    /// Tell the user how a task ended.
    Report(TaskOutcome),
    /// Settle, drain buffered changes, then feed `Start`.
    Restart,
    /// Leave the loop with this process exit code.
    Exit(i32),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn new(state: SupervisorState, commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: state != SupervisorState::Terminated,
        }
    }
}

/// Handle a `Start` event. Only meaningful while `Starting`.
pub fn handle_start(state: &mut SupervisorState) -> CoreStep {
    if *state != SupervisorState::Starting {
        trace!(%state, "ignoring start");
        return CoreStep::new(*state, Vec::new());
    }

    *state = SupervisorState::Running;
    CoreStep::new(*state, vec![CoreCommand::SpawnTask])
}

/// Handle the in-flight task's outcome.
///
/// - While `Running` the task ended on its own: report it, then either exit
///   (single-run mode) or wait for the next relevant change.
/// - While `Restarting` the task was torn down on our request: report the
///   outcome unless it is `Cancelled`, then restart.
pub fn handle_task_finished(
    state: &mut SupervisorState,
    options: &SupervisorOptions,
    outcome: TaskOutcome,
) -> CoreStep {
    match *state {
        SupervisorState::Running => {
            let mut commands = Vec::new();
            if !outcome.is_cancelled() {
                commands.push(CoreCommand::Report(outcome.clone()));
            }

            if options.watch {
                *state = SupervisorState::Idle;
            } else {
                *state = SupervisorState::Terminated;
                commands.push(CoreCommand::Exit(outcome.exit_code()));
            }
            CoreStep::new(*state, commands)
        }
        SupervisorState::Restarting => {
            let mut commands = Vec::new();
            // A task that finished in the same instant as the triggering
            // change still gets its real outcome reported.
            if !outcome.is_cancelled() {
                commands.push(CoreCommand::Report(outcome));
            }
            commands.push(CoreCommand::Restart);

            *state = SupervisorState::Starting;
            CoreStep::new(*state, commands)
        }
        SupervisorState::Terminated => CoreStep::new(*state, Vec::new()),
        SupervisorState::Starting | SupervisorState::Idle => {
            warn!(%state, ?outcome, "task outcome without a live task; ignoring");
            CoreStep::new(*state, Vec::new())
        }
    }
}

/// Handle a change event.
///
/// Irrelevant paths never change state. While a restart is already queued
/// (`Starting` / `Restarting`) further changes are absorbed by it.
pub fn handle_change(
    state: &mut SupervisorState,
    options: &SupervisorOptions,
    relevance: &RelevanceFilter,
    event: ChangeEvent,
) -> CoreStep {
    if !options.watch {
        return CoreStep::new(*state, Vec::new());
    }

    if !relevance.is_relevant(&event.path) {
        debug!(%event, "ignoring");
        return CoreStep::new(*state, Vec::new());
    }

    match *state {
        SupervisorState::Running => {
            debug!(%event, "stopping due to change");
            *state = SupervisorState::Restarting;
            CoreStep::new(*state, vec![CoreCommand::CancelTask])
        }
        SupervisorState::Idle => {
            debug!(%event, "restarting due to change");
            *state = SupervisorState::Starting;
            CoreStep::new(*state, vec![CoreCommand::Restart])
        }
        SupervisorState::Starting | SupervisorState::Restarting => {
            trace!(%event, %state, "change absorbed by pending restart");
            CoreStep::new(*state, Vec::new())
        }
        SupervisorState::Terminated => CoreStep::new(*state, Vec::new()),
    }
}

/// Handle a termination request: tear down any live task, then exit 1.
pub fn handle_shutdown(state: &mut SupervisorState, signal: ShutdownSignal) -> CoreStep {
    if *state == SupervisorState::Terminated {
        return CoreStep::new(*state, Vec::new());
    }

    debug!(%signal, %state, "shutdown requested");

    let mut commands = Vec::new();
    if state.task_live() {
        commands.push(CoreCommand::CancelTask);
    }
    commands.push(CoreCommand::Exit(1));

    *state = SupervisorState::Terminated;
    CoreStep::new(*state, commands)
}
