// src/exec/toolchain.rs

//! Build plan resolution: which command builds the target and what gets run
//! afterwards.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{GorunError, Result};
use crate::target::TargetDescriptor;
use crate::watch::path_utils::is_within;

/// A program plus its arguments, not yet spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How the artifact is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// `go build -o <scratch>/<name> <target>`; run the scratch artifact.
    Build,
    /// `go install <target>`; run the installed binary found on `PATH`.
    Install,
}

/// Resolved once at startup and shared by every build+run cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub build: CommandSpec,
    /// Program executed after a successful build.
    pub artifact: OsString,
}

/// The toolchain binary and the environment it is resolved against.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: String,
    gopath: Option<OsString>,
}

impl GoToolchain {
    pub fn new(go: impl Into<String>, gopath: Option<OsString>) -> Self {
        Self {
            go: go.into(),
            gopath,
        }
    }

    /// Pick the build mode for `target` and produce the commands.
    ///
    /// `name` overrides the artifact base name; it cannot be combined with
    /// install mode, because `go install` decides the binary name itself.
    pub fn plan(
        &self,
        target: &TargetDescriptor,
        scratch: &Path,
        name: Option<&str>,
    ) -> Result<BuildPlan> {
        if self.installable(target) {
            if name.is_some() {
                return Err(GorunError::ConfigError(
                    "option \"-n\" doesn't work with \"go install\"".to_string(),
                ));
            }

            let plan = BuildPlan {
                mode: BuildMode::Install,
                build: CommandSpec::new(&self.go)
                    .arg("install")
                    .arg(target.path.as_os_str()),
                artifact: OsString::from(target.base_name()),
            };
            info!(build = %plan.build, "target is inside GOPATH, using go install");
            return Ok(plan);
        }

        let base = name.map(str::to_string).unwrap_or_else(|| target.base_name());
        let artifact = artifact_path(scratch, &base);

        let plan = BuildPlan {
            mode: BuildMode::Build,
            build: CommandSpec::new(&self.go)
                .arg("build")
                .arg("-o")
                .arg(artifact.as_os_str())
                .arg(target.path.as_os_str()),
            artifact: artifact.into_os_string(),
        };
        debug!(build = %plan.build, "resolved build plan");
        Ok(plan)
    }

    /// A directory target below `<entry>/src` for any `GOPATH` entry.
    fn installable(&self, target: &TargetDescriptor) -> bool {
        if !target.is_dir {
            return false;
        }
        let Some(gopath) = self.gopath.as_deref() else {
            return false;
        };

        gopath_src_dirs(gopath).any(|src| is_within(&src, &target.path))
    }
}

fn gopath_src_dirs(gopath: &OsStr) -> impl Iterator<Item = PathBuf> + '_ {
    std::env::split_paths(gopath)
        .filter(|entry| !entry.as_os_str().is_empty())
        .map(|entry| entry.join("src"))
}

/// `<scratch>/<name>` plus the platform executable suffix.
fn artifact_path(scratch: &Path, base: &str) -> PathBuf {
    scratch.join(format!("{base}{}", std::env::consts::EXE_SUFFIX))
}
