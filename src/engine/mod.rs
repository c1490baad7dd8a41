// src/engine/mod.rs

//! Supervisor engine for gorun.
//!
//! This module ties together:
//! - the build+run task (at most one in flight)
//! - the change stream, filtered by the relevance policy
//! - the main supervisor loop that reacts to:
//!   - task completion
//!   - relevant file changes (cancel and restart)
//!   - termination signals
//!
//! The pure core state machine lives in [`core`] and [`event_handlers`]; the
//! async/IO shell is implemented in [`supervisor`].

use std::fmt;
use std::time::Duration;

use crate::signals::ShutdownSignal;
use crate::types::{ChangeEvent, TaskOutcome};

/// Lifecycle of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No task; the next `Start` spawns one.
    Starting,
    /// A task is building or running.
    Running,
    /// The last task finished; waiting for a relevant change.
    Idle,
    /// A cancel was issued; waiting for the task to tear down.
    Restarting,
    Terminated,
}

impl SupervisorState {
    /// True while a task may still own a child process.
    pub fn task_live(self) -> bool {
        matches!(self, SupervisorState::Running | SupervisorState::Restarting)
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Idle => "idle",
            SupervisorState::Restarting => "restarting",
            SupervisorState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorOptions {
    /// Loop on changes instead of exiting after the first task.
    pub watch: bool,
    /// Settle window applied before each restart.
    pub debounce: Option<Duration>,
}

/// Events flowing into the core.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// Begin the next build+run cycle.
    Start,
    /// The in-flight task reached a terminal outcome.
    TaskFinished(TaskOutcome),
    /// The notifier reported a change.
    Changed(ChangeEvent),
    /// The process was asked to terminate.
    ShutdownRequested(ShutdownSignal),
}

pub mod core;
pub mod event_handlers;
pub mod supervisor;

pub use core::SupervisorCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use supervisor::Supervisor;
