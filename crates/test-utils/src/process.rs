//! Process-table checks for tests that spawn real subprocesses.

use std::time::Duration;

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// True if `pid` names a live process.
///
/// A killed process that its new parent has not reaped yet is a zombie and
/// counts as dead.
pub fn pid_alive(pid: i32) -> bool {
    if kill(Pid::from_raw(pid), None).is_err() {
        return false;
    }

    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // The state field follows the parenthesised command name.
        Ok(stat) => !stat
            .rsplit_once(')')
            .is_some_and(|(_, rest)| rest.trim_start().starts_with('Z')),
        Err(_) => true,
    }
}

/// Poll until `pid` is gone, panicking after `limit`.
pub async fn wait_until_dead(pid: i32, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while pid_alive(pid) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "process {pid} still alive after {limit:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
