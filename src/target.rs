// src/target.rs

//! The target descriptor: what to build and run, plus its arguments.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{GorunError, Result};
use crate::fs::FileSystem;
use crate::watch::path_utils::absolutize;

/// Name used when the target has no usable base name (e.g. `/`).
const FALLBACK_NAME: &str = "main";

/// Reference to the file or directory to build/run. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// As typed by the user, for log messages. The toolchain gets `path`.
    pub raw: String,
    /// Absolute, lexically-normalised path.
    pub path: PathBuf,
    pub is_dir: bool,
    /// Pass-through arguments for the program.
    pub args: Vec<String>,
}

impl TargetDescriptor {
    /// Resolve `raw` against `cwd`, failing if it does not exist.
    pub fn resolve(
        fs: &dyn FileSystem,
        cwd: &Path,
        raw: &str,
        args: Vec<String>,
    ) -> Result<Self> {
        let path = absolutize(cwd, Path::new(raw));

        if !fs.exists(&path) {
            return Err(GorunError::TargetNotFound(format!(
                "{raw} ({})",
                path.display()
            )));
        }

        let is_dir = fs.is_dir(&path);
        debug!(target = %path.display(), is_dir, "resolved target");

        Ok(Self {
            raw: raw.to_string(),
            path,
            is_dir,
            args,
        })
    }

    /// Default artifact name.
    ///
    /// A file target loses its extension (`main.go` -> `main`); a directory
    /// keeps its whole name. `.` resolves to the working directory, so its
    /// base name is the working directory's.
    pub fn base_name(&self) -> String {
        let name = if self.is_dir {
            self.path.file_name()
        } else {
            self.path.file_stem()
        };

        name.map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string())
    }

    /// Directory watched when no explicit patterns are given.
    pub fn watch_root(&self) -> &Path {
        if self.is_dir {
            &self.path
        } else {
            self.path.parent().unwrap_or(&self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/work/app/main.go", "package main");
        fs.add_file("/work/tools/gen.go", "package main");
        fs
    }

    #[test]
    fn directory_target_uses_directory_name() {
        let t = TargetDescriptor::resolve(&fs(), Path::new("/work"), "./app", vec![]).unwrap();

        assert!(t.is_dir);
        assert_eq!(t.path, PathBuf::from("/work/app"));
        assert_eq!(t.base_name(), "app");
        assert_eq!(t.watch_root(), Path::new("/work/app"));
    }

    #[test]
    fn file_target_strips_extension() {
        let t = TargetDescriptor::resolve(&fs(), Path::new("/work"), "tools/gen.go", vec![]).unwrap();

        assert!(!t.is_dir);
        assert_eq!(t.base_name(), "gen");
        assert_eq!(t.watch_root(), Path::new("/work/tools"));
    }

    #[test]
    fn current_directory_uses_working_directory_name() {
        let t = TargetDescriptor::resolve(&fs(), Path::new("/work/app"), ".", vec![]).unwrap();

        assert_eq!(t.raw, ".");
        assert_eq!(t.base_name(), "app");
    }

    #[test]
    fn args_are_kept_verbatim() {
        let args = vec!["a".to_string(), "-b".to_string()];
        let t = TargetDescriptor::resolve(&fs(), Path::new("/work"), "app", args.clone()).unwrap();
        assert_eq!(t.args, args);
    }

    #[test]
    fn missing_target_is_reported() {
        match TargetDescriptor::resolve(&fs(), Path::new("/work"), "nope", vec![]) {
            Err(GorunError::TargetNotFound(msg)) => assert!(msg.contains("nope")),
            other => panic!("expected TargetNotFound, got {other:?}"),
        }
    }
}
