// src/exec/process_group.rs

//! Process-group plumbing for build and run steps.
//!
//! Every step is spawned as the leader of a new process group. Cancelling a
//! step kills the whole group, so helpers it forked (the compiler and linker
//! under `go build`, or whatever the program starts) die with it.
//!
//! A process in a background group is stopped when it reads from the
//! terminal. The run step therefore takes over the terminal foreground while
//! it runs ([`TerminalForeground`]), and gives it back when it ends. While it
//! holds the terminal, Ctrl-C reaches the program instead of the supervisor;
//! if the program dies from it, the signal is raised again in the
//! supervisor so it shuts down as if it had received it first.

use std::io;
use std::process::ExitStatus;

use tokio::process::{Child, Command};

/// Make the command about to be spawned the leader of a new process group.
#[cfg(unix)]
pub fn isolate(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate(_cmd: &mut Command) {}

/// Kill the child's process group and reap the child.
#[cfg(unix)]
pub async fn kill_group(child: &mut Child) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    use tracing::debug;

    if let Some(pid) = child.id() {
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            // The group may already be gone; the leader is still ours to reap.
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => {
                debug!(pid, error = %errno, "killpg failed, killing the leader only");
                return child.kill().await;
            }
        }
    }

    child.wait().await.map(drop)
}

#[cfg(not(unix))]
pub async fn kill_group(child: &mut Child) -> io::Result<()> {
    child.kill().await
}

#[cfg(unix)]
pub use self::unix::TerminalForeground;

#[cfg(not(unix))]
pub use self::fallback::TerminalForeground;

#[cfg(unix)]
mod unix {
    use std::io::IsTerminal;
    use std::os::fd::AsFd;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use nix::sys::signal::{killpg, pthread_sigmask, raise, SigSet, SigmaskHow, Signal};
    use nix::unistd::{getpgrp, tcgetpgrp, tcsetpgrp, Pid};
    use tokio::process::Child;
    use tracing::{debug, info, warn};

    /// The terminal on stdin, lent to a step's process group.
    ///
    /// Dropping the guard gives the terminal back to the supervisor.
    #[derive(Debug)]
    pub struct TerminalForeground {
        /// Our own process group, set while the terminal is lent out.
        owner: Option<Pid>,
    }

    impl TerminalForeground {
        pub fn none() -> Self {
            Self { owner: None }
        }

        /// Lend the terminal to `child`'s group, if stdin is a terminal and
        /// the supervisor is currently in the foreground.
        pub fn hand_to(child: &Child) -> Self {
            let Some(pid) = child.id() else {
                return Self::none();
            };
            let stdin = std::io::stdin();
            if !stdin.is_terminal() {
                return Self::none();
            }

            let owner = getpgrp();
            match tcgetpgrp(stdin.as_fd()) {
                Ok(foreground) if foreground == owner => {}
                _ => return Self::none(),
            }

            let group = Pid::from_raw(pid as i32);
            if let Err(errno) = tcsetpgrp(stdin.as_fd(), group) {
                debug!(pid, error = %errno, "could not hand the terminal to the program");
                return Self::none();
            }
            // A read before the handover stopped the program with SIGTTIN.
            let _ = killpg(group, Signal::SIGCONT);

            debug!(pid, "terminal handed to the program");
            Self { owner: Some(owner) }
        }

        pub fn is_held(&self) -> bool {
            self.owner.is_some()
        }

        /// Take the terminal back after the child exited with `status`.
        ///
        /// A SIGINT or SIGQUIT that killed the child came from the terminal,
        /// and is raised again in this process.
        pub fn release(mut self, status: &ExitStatus) {
            if self.owner.is_none() {
                return;
            }
            self.reclaim();

            let interrupted = status
                .signal()
                .and_then(|n| Signal::try_from(n).ok())
                .filter(|s| matches!(s, Signal::SIGINT | Signal::SIGQUIT));
            if let Some(signal) = interrupted {
                info!(signal = signal.as_str(), "program was interrupted from the terminal");
                if let Err(errno) = raise(signal) {
                    warn!(signal = signal.as_str(), error = %errno, "failed to raise signal in supervisor");
                }
            }
        }

        fn reclaim(&mut self) {
            let Some(owner) = self.owner.take() else {
                return;
            };

            // From a background group, tcsetpgrp raises SIGTTOU unless it is
            // blocked.
            let mut ttou = SigSet::empty();
            ttou.add(Signal::SIGTTOU);
            let mut previous = SigSet::empty();
            if let Err(errno) =
                pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&ttou), Some(&mut previous))
            {
                warn!(error = %errno, "cannot block SIGTTOU, leaving the terminal as is");
                return;
            }

            if let Err(errno) = tcsetpgrp(std::io::stdin().as_fd(), owner) {
                warn!(error = %errno, "failed to take the terminal back");
            }

            let _ = pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous), None);
        }
    }

    impl Drop for TerminalForeground {
        fn drop(&mut self) {
            self.reclaim();
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    use std::process::ExitStatus;

    use tokio::process::Child;

    #[derive(Debug)]
    pub struct TerminalForeground;

    impl TerminalForeground {
        pub fn none() -> Self {
            Self
        }

        pub fn hand_to(_child: &Child) -> Self {
            Self
        }

        pub fn is_held(&self) -> bool {
            false
        }

        pub fn release(self, _status: &ExitStatus) {}
    }
}

/// Give the terminal back once a step's `wait` returned `status`.
pub fn release_terminal(foreground: TerminalForeground, status: &io::Result<ExitStatus>) {
    match status {
        Ok(status) => foreground.release(status),
        Err(_) => drop(foreground),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use gorun_test_utils::process::{pid_alive, wait_until_dead};
    use std::process::Stdio;
    use std::time::Duration;

    #[tokio::test]
    async fn isolated_child_leads_its_own_group() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30").stdin(Stdio::null()).kill_on_drop(true);
        isolate(&mut cmd);
        let mut child = cmd.spawn().unwrap();

        let pid = child.id().unwrap() as i32;
        let group = nix::unistd::getpgid(Some(nix::unistd::Pid::from_raw(pid))).unwrap();
        assert_eq!(group.as_raw(), pid);
        assert_ne!(group, nix::unistd::getpgrp());

        kill_group(&mut child).await.unwrap();
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn killing_the_group_takes_background_children_along() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("grandchild.pid");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("sleep 30 & echo $! > '{}'; wait", pid_file.display()))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        isolate(&mut cmd);
        let mut child = cmd.spawn().unwrap();

        let grandchild = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(pid) = std::fs::read_to_string(&pid_file)
                    .ok()
                    .and_then(|s| s.trim().parse::<i32>().ok())
                {
                    break pid;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(pid_alive(grandchild));

        kill_group(&mut child).await.unwrap();
        wait_until_dead(grandchild, Duration::from_secs(5)).await;
    }

    #[test]
    fn foreground_guard_without_terminal_is_inert() {
        let guard = TerminalForeground::none();
        assert!(!guard.is_held());
        release_terminal(guard, &Ok(ExitStatus::default()));
    }
}
