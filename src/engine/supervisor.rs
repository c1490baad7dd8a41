// src/engine/supervisor.rs

use std::collections::VecDeque;
use std::fmt;
use std::future::pending;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::exec::{execution_context, CancelHandle, TaskBackend};
use crate::signals::ShutdownSignal;
use crate::types::{ChangeEvent, FailureCause, TaskOutcome};
use crate::watch::ChangeStream;

use super::core::SupervisorCore;
use super::{CoreCommand, SupervisorEvent};

/// The one in-flight build+run task.
struct ActiveTask {
    id: u64,
    handle: CancelHandle,
    join: JoinHandle<TaskOutcome>,
}

/// Drives the supervisor core in response to task completion, change events
/// and shutdown signals, and delegates actual execution to a `TaskBackend`.
///
/// This is a pure IO shell around `SupervisorCore`, which contains all the
/// supervision semantics. This struct handles async IO: waiting on several
/// sources at once and spawning, cancelling and awaiting tasks.
pub struct Supervisor<B: TaskBackend> {
    core: SupervisorCore,
    backend: B,
    changes: Option<ChangeStream>,
    shutdown: Option<mpsc::Receiver<ShutdownSignal>>,
    active: Option<ActiveTask>,
    next_task_id: u64,
    exit_code: Option<i32>,
}

impl<B: TaskBackend> fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("active", &self.active.as_ref().map(|t| t.id))
            .finish_non_exhaustive()
    }
}

impl<B: TaskBackend> Supervisor<B> {
    /// `changes` is `None` in single-run mode.
    pub fn new(
        core: SupervisorCore,
        backend: B,
        changes: Option<ChangeStream>,
        shutdown: mpsc::Receiver<ShutdownSignal>,
    ) -> Self {
        Self {
            core,
            backend,
            changes,
            shutdown: Some(shutdown),
            active: None,
            next_task_id: 0,
            exit_code: None,
        }
    }

    /// Main loop. Returns the process exit code.
    ///
    /// Sources are polled in priority order: shutdown, then changes, then
    /// task completion. A change that is ready together with the task's exit
    /// therefore cancels an already finished task; its real outcome is still
    /// collected and reported before the restart.
    pub async fn run(mut self) -> i32 {
        info!(watch = self.core.options().watch, "supervisor started");

        let mut keep_running = self.execute(SupervisorEvent::Start).await;

        while keep_running {
            let event = tokio::select! {
                biased;

                signal = next_shutdown(&mut self.shutdown) => {
                    SupervisorEvent::ShutdownRequested(signal)
                }
                change = next_change(&mut self.changes) => SupervisorEvent::Changed(change),
                outcome = join_active(&mut self.active) => SupervisorEvent::TaskFinished(outcome),
            };

            keep_running = self.execute(event).await;
        }

        // Never leave a child behind, whatever the core decided.
        if let Some(task) = self.active.take() {
            cancel_and_join(task).await;
        }

        let code = self.exit_code.unwrap_or(1);
        info!(exit_code = code, "supervisor exiting");
        code
    }

    /// Feed `event` into the core and run every resulting command, including
    /// the commands produced by events the shell generates along the way.
    async fn execute(&mut self, event: SupervisorEvent) -> bool {
        debug!(?event, state = %self.core.state(), "supervisor received event");

        let step = self.core.step(event);
        let mut keep_running = step.keep_running;
        let mut queue: VecDeque<CoreCommand> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                CoreCommand::SpawnTask => {
                    self.spawn_task();
                    None
                }
                CoreCommand::CancelTask => match self.active.take() {
                    Some(task) => {
                        let outcome = cancel_and_join(task).await;
                        Some(SupervisorEvent::TaskFinished(outcome))
                    }
                    None => None,
                },
                CoreCommand::Report(outcome) => {
                    self.report(&outcome);
                    None
                }
                CoreCommand::Restart => Some(self.prepare_restart().await),
                CoreCommand::Exit(code) => {
                    self.exit_code = Some(code);
                    None
                }
            };

            if let Some(event) = follow_up {
                debug!(?event, state = %self.core.state(), "supervisor generated event");
                let step = self.core.step(event);
                keep_running = step.keep_running;
                // Follow-up commands run before whatever was already queued.
                for command in step.commands.into_iter().rev() {
                    queue.push_front(command);
                }
            }
        }

        keep_running
    }

    fn spawn_task(&mut self) {
        debug_assert!(self.active.is_none(), "spawning while a task is live");

        self.next_task_id += 1;
        let id = self.next_task_id;
        let (handle, ctx) = execution_context(id);
        let join = tokio::spawn(self.backend.run(ctx));

        debug!(task_id = id, "task spawned");
        self.active = Some(ActiveTask { id, handle, join });
    }

    /// Wait out the settle window, then absorb every change that is already
    /// buffered. Returns the event that ends the restart: `Start`, or a
    /// shutdown that arrived during the settle window.
    async fn prepare_restart(&mut self) -> SupervisorEvent {
        if let Some(window) = self.core.options().debounce {
            debug!(window_ms = window.as_millis() as u64, "settling before restart");
            tokio::select! {
                biased;

                signal = next_shutdown(&mut self.shutdown) => {
                    return SupervisorEvent::ShutdownRequested(signal);
                }
                _ = tokio::time::sleep(window) => {}
            }
        }

        if let Some(changes) = self.changes.as_mut() {
            let mut absorbed = 0usize;
            while let Some(change) = changes.try_recv() {
                let step = self.core.step(SupervisorEvent::Changed(change));
                debug_assert!(step.commands.is_empty());
                absorbed += 1;
            }
            if absorbed > 0 {
                debug!(absorbed, "coalesced buffered changes into restart");
            }
        }

        info!("rebuilding");
        SupervisorEvent::Start
    }

    fn report(&self, outcome: &TaskOutcome) {
        if let Some(msg) = outcome.diagnostic() {
            error!("{msg}");
        }

        match outcome {
            TaskOutcome::Success => info!("program exited successfully"),
            TaskOutcome::BuildFailed(cause) => info!(%cause, "build failed"),
            TaskOutcome::RunFailed(cause) => info!(%cause, "program failed"),
            TaskOutcome::Cancelled => {}
        }

        if self.core.options().watch {
            info!("waiting for changes");
        }
    }
}

/// Cancel a task and wait until it has fully torn down.
async fn cancel_and_join(mut task: ActiveTask) -> TaskOutcome {
    debug!(task_id = task.id, "cancelling task");
    task.handle.cancel();
    join_outcome(&mut task.join).await
}

async fn join_outcome(join: &mut JoinHandle<TaskOutcome>) -> TaskOutcome {
    match join.await {
        Ok(outcome) => outcome,
        Err(err) => TaskOutcome::RunFailed(FailureCause::Io(format!("task aborted: {err}"))),
    }
}

/// Next shutdown signal; pending forever once the listener is gone.
async fn next_shutdown(rx: &mut Option<mpsc::Receiver<ShutdownSignal>>) -> ShutdownSignal {
    let Some(inner) = rx.as_mut() else {
        return pending().await;
    };
    if let Some(signal) = inner.recv().await {
        return signal;
    }
    *rx = None;
    pending().await
}

/// Next change; pending forever in single-run mode or once the stream ends.
async fn next_change(changes: &mut Option<ChangeStream>) -> ChangeEvent {
    let Some(stream) = changes.as_mut() else {
        return pending().await;
    };
    if let Some(change) = stream.recv().await {
        return change;
    }
    debug!("change stream closed");
    *changes = None;
    pending().await
}

/// Outcome of the in-flight task; pending forever while there is none.
async fn join_active(active: &mut Option<ActiveTask>) -> TaskOutcome {
    let Some(task) = active.as_mut() else {
        return pending().await;
    };
    let outcome = join_outcome(&mut task.join).await;
    debug!(task_id = task.id, ?outcome, "task finished");
    *active = None;
    outcome
}
