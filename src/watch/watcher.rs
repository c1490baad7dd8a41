// src/watch/watcher.rs

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::errors::{GorunError, Result};
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::patterns::WatchPattern;

/// Ordered, infinite stream of change events for the subscribed patterns.
///
/// Owns the underlying `RecommendedWatcher`; dropping the stream stops
/// watching.
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream")
            .field("live", &self.watcher.is_some())
            .finish()
    }
}

impl ChangeStream {
    /// A stream fed by hand instead of by a filesystem watcher.
    pub fn from_channel(rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { rx, watcher: None }
    }

    /// Next event, in the order the notifier produced them.
    ///
    /// `None` only if the producer side is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Next already-buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

/// Pin every pattern's base to its canonical path.
///
/// Fails with [`GorunError::WatchSetup`] if a base does not exist. Event
/// paths from the notifier are canonical, so patterns used to match them
/// (here and in the relevance filter) go through this first.
pub fn resolve_patterns(patterns: Vec<WatchPattern>) -> Result<Vec<WatchPattern>> {
    patterns
        .into_iter()
        .map(|pattern| -> Result<WatchPattern> {
            let base = pattern.base().canonicalize().map_err(|e| {
                GorunError::WatchSetup(format!(
                    "cannot watch {:?} ({}): {e}",
                    pattern.raw(),
                    pattern.base().display()
                ))
            })?;
            Ok(pattern.with_base(base))
        })
        .collect()
}

/// Register every pattern with a cross-platform watcher (`notify`) and return
/// the merged event stream.
///
/// Fails with [`GorunError::WatchSetup`] if any pattern's base path does not
/// exist or cannot be registered. Events for files changed before this
/// returns are not reported.
pub fn subscribe(patterns: Vec<WatchPattern>) -> Result<ChangeStream> {
    let resolved = resolve_patterns(patterns)?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ChangeEvent>();

    let callback_patterns = resolved.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in translate_event(event, &callback_patterns) {
                    // The receiver is gone only when the supervisor is
                    // shutting down.
                    let _ = event_tx.send(change);
                }
            }
            Err(err) => {
                warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )
    .map_err(|e| GorunError::WatchSetup(format!("creating file watcher: {e}")))?;

    for pattern in &resolved {
        debug!(pattern = %pattern.raw(), base = %pattern.base().display(), "watching pattern");
        watcher
            .watch(pattern.base(), pattern.recursive_mode())
            .map_err(|e| {
                GorunError::WatchSetup(format!("cannot watch {:?}: {e}", pattern.raw()))
            })?;
    }

    info!(patterns = resolved.len(), "file watcher started");

    Ok(ChangeStream {
        rx: event_rx,
        watcher: Some(watcher),
    })
}

/// Turn one raw notify event into change records for the paths that belong
/// to at least one pattern, preserving path order.
pub fn translate_event(event: Event, patterns: &[WatchPattern]) -> Vec<ChangeEvent> {
    let Some(kind) = change_kind(&event.kind) else {
        trace!(?event, "ignoring access event");
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .filter(|path| patterns.iter().any(|p| p.matches(path)))
        .map(|path| ChangeEvent::new(path, kind))
        .collect()
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) => Some(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
        EventKind::Modify(_) => Some(ChangeKind::Modify),
        EventKind::Remove(_) => Some(ChangeKind::Remove),
        EventKind::Any | EventKind::Other => Some(ChangeKind::Other),
    }
}
