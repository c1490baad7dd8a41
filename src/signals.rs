// src/signals.rs

//! Termination signal delivery into the supervisor loop.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A request to terminate, by origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Hangup,
    Quit,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Hangup => "SIGHUP",
            ShutdownSignal::Quit => "SIGQUIT",
            ShutdownSignal::Terminate => "SIGTERM",
        };
        f.write_str(s)
    }
}

/// Exit code used when a second signal cuts shutdown short.
pub const FORCED_EXIT_CODE: i32 = 1;

/// Install the termination handlers and forward the first signal to the
/// returned receiver.
///
/// Unix: SIGINT, SIGHUP, SIGQUIT and SIGTERM. Elsewhere: Ctrl-C only.
/// Handlers are installed before this returns, so it should be called as
/// early as possible. A second signal, while the supervisor is still
/// shutting down, exits the process immediately.
pub fn spawn_signal_listener() -> mpsc::Receiver<ShutdownSignal> {
    listen(|signal| {
        warn!(%signal, "second termination signal, exiting immediately");
        std::process::exit(FORCED_EXIT_CODE);
    })
}

/// Forward the first signal; hand the second one to `on_repeat`.
fn listen<F>(on_repeat: F) -> mpsc::Receiver<ShutdownSignal>
where
    F: FnOnce(ShutdownSignal) + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);

    // Without handlers the sender is dropped; the supervisor treats a closed
    // channel as "no signals".
    let Some(mut signals) = TerminationSignals::install() else {
        return rx;
    };

    tokio::spawn(async move {
        let Some(signal) = signals.recv().await else {
            return;
        };
        debug!(%signal, "received termination signal");
        // The supervisor may already be gone.
        let _ = tx.send(signal).await;

        if let Some(signal) = signals.recv().await {
            on_repeat(signal);
        }
    });

    rx
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn install() -> Option<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let register = |kind: SignalKind| match signal(kind) {
            Ok(s) => Some(s),
            Err(err) => {
                warn!(error = %err, "failed to install signal handler");
                None
            }
        };

        Some(Self {
            interrupt: register(SignalKind::interrupt())?,
            hangup: register(SignalKind::hangup())?,
            quit: register(SignalKind::quit())?,
            terminate: register(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Option<ShutdownSignal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(ShutdownSignal::Interrupt),
            Some(()) = self.hangup.recv() => Some(ShutdownSignal::Hangup),
            Some(()) = self.quit.recv() => Some(ShutdownSignal::Quit),
            Some(()) = self.terminate.recv() => Some(ShutdownSignal::Terminate),
            else => None,
        }
    }
}

#[cfg(not(unix))]
struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    fn install() -> Option<Self> {
        Some(Self)
    }

    async fn recv(&mut self) -> Option<ShutdownSignal> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some(ShutdownSignal::Interrupt),
            Err(err) => {
                warn!(error = %err, "failed to install Ctrl-C handler");
                None
            }
        }
    }
}
