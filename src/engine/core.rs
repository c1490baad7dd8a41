// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! This module contains a synchronous, deterministic "core" that consumes
//! [`SupervisorEvent`]s and produces:
//! - an updated [`SupervisorState`]
//! - a list of commands describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::supervisor::Supervisor`) is responsible
//! for:
//! - reading change events and signals from channels
//! - spawning, cancelling and awaiting tasks through a `TaskBackend`
//! - the settle window before a restart
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use crate::engine::event_handlers::{
    handle_change, handle_shutdown, handle_start, handle_task_finished, CoreStep,
};
use crate::engine::{SupervisorEvent, SupervisorOptions, SupervisorState};
use crate::watch::RelevanceFilter;

/// Pure core supervisor state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug, Clone)]
pub struct SupervisorCore {
    state: SupervisorState,
    options: SupervisorOptions,
    relevance: RelevanceFilter,
}

impl SupervisorCore {
    pub fn new(options: SupervisorOptions, relevance: RelevanceFilter) -> Self {
        Self {
            state: SupervisorState::Starting,
            options,
            relevance,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Start => handle_start(&mut self.state),
            SupervisorEvent::TaskFinished(outcome) => {
                handle_task_finished(&mut self.state, &self.options, outcome)
            }
            SupervisorEvent::Changed(change) => {
                handle_change(&mut self.state, &self.options, &self.relevance, change)
            }
            SupervisorEvent::ShutdownRequested(signal) => handle_shutdown(&mut self.state, signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CoreCommand;
    use crate::signals::ShutdownSignal;
    use crate::types::{ChangeEvent, ChangeKind, FailureCause, TaskOutcome};

    fn watch_core() -> SupervisorCore {
        SupervisorCore::new(
            SupervisorOptions {
                watch: true,
                debounce: None,
            },
            RelevanceFilter::default(),
        )
    }

    fn once_core() -> SupervisorCore {
        SupervisorCore::new(SupervisorOptions::default(), RelevanceFilter::default())
    }

    fn changed(path: &str) -> SupervisorEvent {
        SupervisorEvent::Changed(ChangeEvent::new(path, ChangeKind::Modify))
    }

    fn run_failed(code: i32) -> TaskOutcome {
        TaskOutcome::RunFailed(FailureCause::Exited(Some(code)))
    }

    #[test]
    fn start_spawns_exactly_one_task() {
        let mut core = watch_core();

        let step = core.step(SupervisorEvent::Start);
        assert_eq!(step.commands, vec![CoreCommand::SpawnTask]);
        assert_eq!(core.state(), SupervisorState::Running);

        // A second Start while running is ignored.
        let step = core.step(SupervisorEvent::Start);
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
    }

    #[test]
    fn single_run_success_exits_zero() {
        let mut core = once_core();
        core.step(SupervisorEvent::Start);

        let step = core.step(SupervisorEvent::TaskFinished(TaskOutcome::Success));

        assert_eq!(
            step.commands,
            vec![CoreCommand::Report(TaskOutcome::Success), CoreCommand::Exit(0)]
        );
        assert!(!step.keep_running);
        assert_eq!(core.state(), SupervisorState::Terminated);
    }

    #[test]
    fn single_run_failure_exits_one() {
        for outcome in [
            TaskOutcome::BuildFailed(FailureCause::Exited(Some(2))),
            run_failed(7),
        ] {
            let mut core = once_core();
            core.step(SupervisorEvent::Start);

            let step = core.step(SupervisorEvent::TaskFinished(outcome.clone()));
            assert_eq!(
                step.commands,
                vec![CoreCommand::Report(outcome), CoreCommand::Exit(1)]
            );
        }
    }

    #[test]
    fn single_run_ignores_changes() {
        let mut core = once_core();
        core.step(SupervisorEvent::Start);

        let step = core.step(changed("/app/main.go"));
        assert!(step.commands.is_empty());
        assert_eq!(core.state(), SupervisorState::Running);
    }

    #[test]
    fn watch_mode_waits_after_completion() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);

        let step = core.step(SupervisorEvent::TaskFinished(run_failed(1)));
        assert_eq!(step.commands, vec![CoreCommand::Report(run_failed(1))]);
        assert!(step.keep_running);
        assert_eq!(core.state(), SupervisorState::Idle);

        let step = core.step(changed("/app/main.go"));
        assert_eq!(step.commands, vec![CoreCommand::Restart]);
        assert_eq!(core.state(), SupervisorState::Starting);
    }

    #[test]
    fn irrelevant_change_never_changes_state() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);

        for path in ["/app/README.md", "/app/main.go.swp", "/app/go.mod"] {
            let step = core.step(changed(path));
            assert!(step.commands.is_empty(), "{path}");
            assert_eq!(core.state(), SupervisorState::Running);
        }
    }

    #[test]
    fn relevant_change_cancels_then_restarts() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);

        let step = core.step(changed("/app/main.go"));
        assert_eq!(step.commands, vec![CoreCommand::CancelTask]);
        assert_eq!(core.state(), SupervisorState::Restarting);

        // Further changes are absorbed while the cancel is pending.
        assert!(core.step(changed("/app/other.go")).commands.is_empty());

        let step = core.step(SupervisorEvent::TaskFinished(TaskOutcome::Cancelled));
        assert_eq!(step.commands, vec![CoreCommand::Restart]);
        assert_eq!(core.state(), SupervisorState::Starting);

        // Drained changes during the restart are absorbed too.
        assert!(core.step(changed("/app/third.go")).commands.is_empty());

        let step = core.step(SupervisorEvent::Start);
        assert_eq!(step.commands, vec![CoreCommand::SpawnTask]);
    }

    #[test]
    fn task_finishing_during_cancel_is_reported() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);
        core.step(changed("/app/main.go"));

        let step = core.step(SupervisorEvent::TaskFinished(TaskOutcome::Success));
        assert_eq!(
            step.commands,
            vec![CoreCommand::Report(TaskOutcome::Success), CoreCommand::Restart]
        );
    }

    #[test]
    fn shutdown_with_live_task_cancels_then_exits() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);

        let step = core.step(SupervisorEvent::ShutdownRequested(ShutdownSignal::Interrupt));
        assert_eq!(step.commands, vec![CoreCommand::CancelTask, CoreCommand::Exit(1)]);
        assert!(!step.keep_running);

        // Teardown outcome is swallowed after termination.
        let step = core.step(SupervisorEvent::TaskFinished(TaskOutcome::Cancelled));
        assert!(step.commands.is_empty());
        assert!(!step.keep_running);
    }

    #[test]
    fn shutdown_while_idle_just_exits() {
        let mut core = watch_core();
        core.step(SupervisorEvent::Start);
        core.step(SupervisorEvent::TaskFinished(TaskOutcome::Success));

        let step = core.step(SupervisorEvent::ShutdownRequested(ShutdownSignal::Terminate));
        assert_eq!(step.commands, vec![CoreCommand::Exit(1)]);
        assert_eq!(core.state(), SupervisorState::Terminated);
    }

    #[test]
    fn custom_extensions_drive_relevance() {
        let mut core = SupervisorCore::new(
            SupervisorOptions {
                watch: true,
                debounce: None,
            },
            RelevanceFilter::new(vec!["tmpl".to_string()]),
        );
        core.step(SupervisorEvent::Start);

        assert!(core.step(changed("/app/main.go")).commands.is_empty());
        assert_eq!(
            core.step(changed("/app/index.tmpl")).commands,
            vec![CoreCommand::CancelTask]
        );
    }
}
