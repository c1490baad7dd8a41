#![allow(dead_code)]

use std::time::Duration;

use gorun::engine::{Supervisor, SupervisorCore, SupervisorOptions};
use gorun::signals::ShutdownSignal;
use gorun::types::{ChangeEvent, ChangeKind};
use gorun::watch::{ChangeStream, RelevanceFilter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::fake_backend::FakeBackend;

/// Builder for a supervisor wired to hand-fed channels.
pub struct SupervisorBuilder {
    options: SupervisorOptions,
    relevance: RelevanceFilter,
}

impl SupervisorBuilder {
    /// Single-run mode, default relevance policy.
    pub fn new() -> Self {
        Self {
            options: SupervisorOptions::default(),
            relevance: RelevanceFilter::default(),
        }
    }

    pub fn watch(mut self) -> Self {
        self.options.watch = true;
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.options.debounce = Some(window);
        self
    }

    pub fn extensions(mut self, exts: &[&str]) -> Self {
        self.relevance = RelevanceFilter::new(exts.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn relevance(mut self, filter: RelevanceFilter) -> Self {
        self.relevance = filter;
        self
    }

    /// Spawn the supervisor loop on the current runtime.
    pub fn spawn(self, backend: FakeBackend) -> RunningSupervisor {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let changes = self
            .options
            .watch
            .then(|| ChangeStream::from_channel(change_rx));
        let core = SupervisorCore::new(self.options, self.relevance);
        let supervisor = Supervisor::new(core, backend, changes, shutdown_rx);

        RunningSupervisor {
            changes: change_tx,
            shutdown: shutdown_tx,
            join: tokio::spawn(supervisor.run()),
        }
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A spawned supervisor plus the senders feeding it.
pub struct RunningSupervisor {
    pub changes: mpsc::UnboundedSender<ChangeEvent>,
    pub shutdown: mpsc::Sender<ShutdownSignal>,
    pub join: JoinHandle<i32>,
}

impl RunningSupervisor {
    /// Report a modification of `path`.
    pub fn change(&self, path: &str) {
        self.changes
            .send(ChangeEvent::new(path, ChangeKind::Modify))
            .expect("supervisor dropped its change stream");
    }

    /// Deliver a change exactly as the watcher produced it.
    pub fn send(&self, change: ChangeEvent) {
        self.changes
            .send(change)
            .expect("supervisor dropped its change stream");
    }

    /// Deliver `signal` and wait for the exit code.
    pub async fn shutdown(self, signal: ShutdownSignal) -> i32 {
        self.shutdown
            .send(signal)
            .await
            .expect("supervisor dropped its shutdown receiver");
        self.exit_code().await
    }

    pub async fn exit_code(self) -> i32 {
        self.join.await.expect("supervisor task panicked")
    }
}
