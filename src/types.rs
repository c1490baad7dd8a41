use std::fmt;
use std::path::PathBuf;

/// Kind of filesystem change reported by the notifier.
///
/// The supervisor only looks at the path; the kind is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
    Rename,
    Other,
}

/// A single change-event record: one path plus what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.path.display())
    }
}

/// Why a build or run step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The subprocess exited unsuccessfully. `None` means it was killed by a
    /// signal we did not send. Its own stderr already reached the user.
    Exited(Option<i32>),
    /// The supervisor could not start the subprocess or wait for it.
    Io(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Exited(Some(code)) => write!(f, "exit status {code}"),
            FailureCause::Exited(None) => write!(f, "terminated by signal"),
            FailureCause::Io(msg) => write!(f, "{msg}"),
        }
    }
}

/// Terminal result of one build+run cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    BuildFailed(FailureCause),
    RunFailed(FailureCause),
    /// Torn down on request. Not an error.
    Cancelled,
}

impl TaskOutcome {
    /// Process exit code for single-run mode.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskOutcome::Success => 0,
            _ => 1,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }

    /// Message the supervisor should log itself, if any.
    ///
    /// Exit-status failures return `None`: the subprocess already explained
    /// itself on the shared stderr.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            TaskOutcome::BuildFailed(FailureCause::Io(msg)) => {
                Some(format!("build step failed: {msg}"))
            }
            TaskOutcome::RunFailed(FailureCause::Io(msg)) => {
                Some(format!("program failed: {msg}"))
            }
            _ => None,
        }
    }
}
