use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use gorun::exec::{ExecutionContext, TaskBackend, TaskFuture};
use gorun::types::TaskOutcome;
use tokio::sync::{mpsc, oneshot};

#[derive(Default)]
struct State {
    started: Vec<u64>,
    cancelled: Vec<u64>,
    finished: Vec<(u64, TaskOutcome)>,
    /// Outcomes handed to the next tasks without waiting for `finish`.
    scripted: VecDeque<TaskOutcome>,
    pending: HashMap<u64, oneshot::Sender<TaskOutcome>>,
}

struct Shared {
    state: Mutex<State>,
    started_tx: mpsc::UnboundedSender<u64>,
    finished_tx: mpsc::UnboundedSender<(u64, TaskOutcome)>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record_finish(&self, id: u64, outcome: &TaskOutcome) {
        self.lock().finished.push((id, outcome.clone()));
        let _ = self.finished_tx.send((id, outcome.clone()));
    }
}

/// A fake task backend that:
/// - records which tasks were started, cancelled and how they finished
/// - finishes a task only when the test says so (or immediately, if an
///   outcome was scripted up front)
/// - honours cancellation like the real backend does.
#[derive(Clone)]
pub struct FakeBackend {
    shared: Arc<Shared>,
}

/// Test-side control of a [`FakeBackend`].
pub struct FakeBackendHandle {
    shared: Arc<Shared>,
    started_rx: mpsc::UnboundedReceiver<u64>,
    finished_rx: mpsc::UnboundedReceiver<(u64, TaskOutcome)>,
}

pub fn fake_backend() -> (FakeBackend, FakeBackendHandle) {
    let (started_tx, started_rx) = mpsc::unbounded_channel();
    let (finished_tx, finished_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        state: Mutex::new(State::default()),
        started_tx,
        finished_tx,
    });

    (
        FakeBackend {
            shared: Arc::clone(&shared),
        },
        FakeBackendHandle {
            shared,
            started_rx,
            finished_rx,
        },
    )
}

impl TaskBackend for FakeBackend {
    fn run(&self, mut ctx: ExecutionContext) -> TaskFuture {
        let id = ctx.id();
        let shared = Arc::clone(&self.shared);

        let (tx, rx) = oneshot::channel();
        let scripted = {
            let mut state = shared.lock();
            state.started.push(id);
            let scripted = state.scripted.pop_front();
            if scripted.is_none() {
                state.pending.insert(id, tx);
            }
            scripted
        };
        let _ = shared.started_tx.send(id);

        Box::pin(async move {
            if let Some(outcome) = scripted {
                shared.record_finish(id, &outcome);
                return outcome;
            }

            // Like the real runner: an exit that is already available wins.
            let outcome = tokio::select! {
                biased;

                res = rx => res.unwrap_or(TaskOutcome::Cancelled),
                _ = ctx.cancelled() => {
                    shared.lock().cancelled.push(id);
                    TaskOutcome::Cancelled
                }
            };
            shared.record_finish(id, &outcome);
            outcome
        })
    }
}

impl FakeBackendHandle {
    /// Queue an outcome for the next task that starts; it finishes at once.
    pub fn script(&self, outcome: TaskOutcome) {
        self.shared.lock().scripted.push_back(outcome);
    }

    /// Finish task `id` with `outcome`. Returns `false` if it is not pending.
    pub fn finish(&self, id: u64, outcome: TaskOutcome) -> bool {
        match self.shared.lock().pending.remove(&id) {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Wait for the next task start and return its id.
    pub async fn next_start(&mut self) -> u64 {
        self.started_rx.recv().await.expect("fake backend dropped")
    }

    /// Wait for the next task to reach an outcome.
    pub async fn next_finish(&mut self) -> (u64, TaskOutcome) {
        self.finished_rx.recv().await.expect("fake backend dropped")
    }

    pub fn started(&self) -> Vec<u64> {
        self.shared.lock().started.clone()
    }

    pub fn cancelled(&self) -> Vec<u64> {
        self.shared.lock().cancelled.clone()
    }

    pub fn finished(&self) -> Vec<(u64, TaskOutcome)> {
        self.shared.lock().finished.clone()
    }
}
