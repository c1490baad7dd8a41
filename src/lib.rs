// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod scratch;
pub mod signals;
pub mod target;
pub mod types;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, Settings};
use crate::engine::{Supervisor, SupervisorCore, SupervisorOptions};
use crate::exec::{BuildPlan, GoToolchain, ProcessBackend};
use crate::fs::RealFileSystem;
use crate::scratch::ScratchDir;
use crate::signals::{spawn_signal_listener, ShutdownSignal};
use crate::target::TargetDescriptor;
use crate::watch::{resolve_patterns, subscribe, ChangeStream, RelevanceFilter, WatchPattern};

/// Everything resolved at startup, owned by one supervisor run.
#[derive(Debug)]
pub struct SupervisorContext {
    pub settings: Settings,
    pub target: TargetDescriptor,
    pub plan: BuildPlan,
    scratch: ScratchDir,
}

impl SupervisorContext {
    /// Resolve settings, the target and the build plan, and create the
    /// scratch directory. Any failure here is fatal.
    pub fn prepare(args: &CliArgs, cwd: &Path) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(
                load_and_validate(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
            ),
            None => None,
        };

        let settings = Settings::resolve(args, file.as_ref(), std::env::var_os("GOPATH"))?;
        let target = TargetDescriptor::resolve(
            &RealFileSystem,
            cwd,
            &settings.target,
            settings.args.clone(),
        )?;

        let scratch = ScratchDir::create()?;
        let plan = GoToolchain::new(settings.go.clone(), settings.gopath.clone()).plan(
            &target,
            scratch.path(),
            settings.name.as_deref(),
        )?;

        Ok(Self {
            settings,
            target,
            plan,
            scratch,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Watch patterns in effect: the explicit ones, or the target's directory.
    pub fn watch_patterns(&self, cwd: &Path) -> Result<Vec<WatchPattern>> {
        if self.settings.patterns.is_empty() {
            return Ok(vec![WatchPattern::everything_under(self.target.watch_root())]);
        }

        let patterns = self
            .settings
            .patterns
            .iter()
            .map(|raw| WatchPattern::parse(cwd, raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(patterns)
    }

    /// Run the supervisor until it exits, then remove the scratch directory.
    ///
    /// `changes` is `None` in single-run mode. Returns the process exit code.
    pub async fn run(
        self,
        changes: Option<ChangeStream>,
        relevance: RelevanceFilter,
        shutdown: mpsc::Receiver<ShutdownSignal>,
    ) -> i32 {
        let options = SupervisorOptions {
            watch: self.settings.watch,
            debounce: self.settings.debounce,
        };
        let core = SupervisorCore::new(options, relevance);
        let backend = ProcessBackend::new(self.plan, self.target.args);

        let code = Supervisor::new(core, backend, changes, shutdown).run().await;

        self.scratch.close();
        code
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - signal handling, installed first so an early Ctrl-C is not lost
/// - config file + CLI flags + environment
/// - target resolution and build plan
/// - the scratch directory
/// - (optional) file watcher and the relevance policy for its patterns
/// - the supervisor loop
pub async fn run(args: CliArgs) -> Result<i32> {
    let shutdown = spawn_signal_listener();

    let cwd = std::env::current_dir().context("reading current directory")?;
    let ctx = SupervisorContext::prepare(&args, &cwd)?;

    info!(
        target = %ctx.target.raw,
        path = %ctx.target.path.display(),
        scratch = %ctx.scratch_path().display(),
        watch = ctx.settings.watch,
        "gorun starting"
    );

    // The watch is live before the first build starts.
    let (changes, relevance) = if ctx.settings.watch {
        let patterns = resolve_patterns(ctx.watch_patterns(&cwd)?)?;
        debug!(?patterns, "watch patterns");
        let relevance = ctx.settings.relevance_filter(&patterns);
        (Some(subscribe(patterns)?), relevance)
    } else {
        (None, ctx.settings.relevance_filter(&[]))
    };

    Ok(ctx.run(changes, relevance, shutdown).await)
}
