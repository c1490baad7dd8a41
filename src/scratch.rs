// src/scratch.rs

//! Per-process scratch directory for build artifacts.

use std::io;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::errors::{GorunError, Result};

/// `$TMPDIR/gorun-<pid>`, removed by [`ScratchDir::close`] (or on drop).
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create the scratch directory under the OS temp root.
    pub fn create() -> Result<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Create the scratch directory under `root`.
    ///
    /// If `gorun-<pid>` is already taken (a leftover from an earlier process
    /// with the same pid, or a second supervisor in this process), a random
    /// suffix is appended instead. The leftover is never touched.
    pub fn create_in(root: &Path) -> Result<Self> {
        let prefix = format!("gorun-{}", std::process::id());
        let dir = match tempfile::Builder::new()
            .prefix(&prefix)
            .rand_bytes(0)
            .tempdir_in(root)
        {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    path = %root.join(&prefix).display(),
                    "scratch directory already exists, using a random suffix"
                );
                tempfile::Builder::new()
                    .prefix(&format!("{prefix}-"))
                    .tempdir_in(root)
                    .map_err(|e| scratch_error(root, &prefix, e))?
            }
            Err(err) => return Err(scratch_error(root, &prefix, err)),
        };

        debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it.
    ///
    /// Failures are logged, not returned: the supervisor is exiting anyway.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "removed scratch directory"),
            Err(err) => warn!(path = %path.display(), error = %err, "failed to delete scratch directory"),
        }
    }
}

fn scratch_error(root: &Path, prefix: &str, err: io::Error) -> GorunError {
    GorunError::ScratchDir(format!("creating {}: {err}", root.join(prefix).display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_after_pid_and_removed_on_close() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(root.path()).unwrap();
        let path = scratch.path().to_path_buf();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("gorun-{}", std::process::id())
        );
        assert!(path.is_dir());

        std::fs::write(path.join("app"), b"binary").unwrap();
        scratch.close();
        assert!(!path.exists());
    }

    #[test]
    fn leftover_directory_gets_a_suffixed_sibling() {
        let root = tempfile::tempdir().unwrap();
        let leftover = root.path().join(format!("gorun-{}", std::process::id()));
        std::fs::create_dir(&leftover).unwrap();
        std::fs::write(leftover.join("old"), b"stale").unwrap();

        let scratch = ScratchDir::create_in(root.path()).unwrap();
        let path = scratch.path().to_path_buf();

        assert_ne!(path, leftover);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&format!("gorun-{}-", std::process::id())));
        assert!(leftover.join("old").exists());

        scratch.close();
        assert!(!path.exists());
        assert!(leftover.exists());
    }

    #[test]
    fn missing_root_is_a_scratch_error() {
        let err = ScratchDir::create_in(Path::new("/definitely/not/here/gorun")).unwrap_err();
        assert!(matches!(err, GorunError::ScratchDir(_)));
    }
}
