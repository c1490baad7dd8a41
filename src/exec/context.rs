// src/exec/context.rs

//! Cancellable execution context for one build+run cycle.

use tokio::sync::oneshot;
use tracing::debug;

/// Create a linked cancel handle / execution context pair.
///
/// `id` is only used to correlate log lines.
pub fn execution_context(id: u64) -> (CancelHandle, ExecutionContext) {
    let (tx, rx) = oneshot::channel::<()>();
    (
        CancelHandle { id, tx: Some(tx) },
        ExecutionContext {
            id,
            rx,
            cancelled: false,
        },
    )
}

/// Owner side: requests cancellation of exactly one task.
///
/// Dropping the handle also cancels the task.
#[derive(Debug)]
pub struct CancelHandle {
    id: u64,
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cancellation. Returns `false` if the task had already
    /// finished (or this handle was already used).
    pub fn cancel(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let delivered = tx.send(()).is_ok();
                if !delivered {
                    debug!(task_id = self.id, "task already finished while cancelling");
                }
                delivered
            }
            None => false,
        }
    }
}

/// Task side: observed by the build and run steps.
#[derive(Debug)]
pub struct ExecutionContext {
    id: u64,
    rx: oneshot::Receiver<()>,
    cancelled: bool,
}

impl ExecutionContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once cancellation was requested or the handle was dropped.
    ///
    /// Cancel-safe and may be awaited repeatedly.
    pub async fn cancelled(&mut self) {
        if self.cancelled {
            return;
        }
        // Either an explicit cancel or a dropped handle: both mean stop.
        let _ = (&mut self.rx).await;
        self.cancelled = true;
    }

    /// Non-blocking check.
    pub fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            match self.rx.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => self.cancelled = true,
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_is_observed() {
        let (mut handle, mut ctx) = execution_context(1);

        assert!(!ctx.is_cancelled());
        assert!(handle.cancel());
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
        // Awaiting again is fine.
        ctx.cancelled().await;
    }

    #[tokio::test]
    async fn dropped_handle_cancels() {
        let (handle, mut ctx) = execution_context(2);
        drop(handle);

        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_after_task_finished_reports_false() {
        let (mut handle, ctx) = execution_context(3);
        drop(ctx);

        assert!(!handle.cancel());
        assert!(!handle.cancel());
    }

    #[tokio::test]
    async fn not_cancelled_stays_pending() {
        let (_handle, mut ctx) = execution_context(4);

        let waited = tokio::time::timeout(Duration::from_millis(20), ctx.cancelled()).await;
        assert!(waited.is_err());
        assert!(!ctx.is_cancelled());
    }
}
