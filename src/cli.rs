// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

const EXAMPLES: &str = "\
Examples:
  gorun .
  gorun ./dir
  gorun ./dir arg0 arg1 arg2 ...

  gorun -w               ./dir
  gorun -p=./dir,./dir0  ./dir
  gorun -n=name          ./dir
  gorun -v -w -n=name    ./dir";

/// Command-line arguments for `gorun`.
///
/// Flags must come before the target; everything after the target (or after
/// `--`) is passed to the program untouched.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gorun",
    version,
    about = "Runs a Go file or directory. Can watch and rerun.",
    after_help = EXAMPLES,
    long_about = None
)]
pub struct CliArgs {
    /// Watch and rerun.
    #[arg(short, long)]
    pub watch: bool,

    /// Comma-separated watch patterns. Implies `-w`. Uses "..." as a wildcard.
    #[arg(short, long, value_name = "PATTERNS", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// Binary and process name. Works only when using "go build".
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Comma-separated file extensions whose changes trigger a rerun.
    ///
    /// Default: `go`.
    #[arg(short = 'e', long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Wait this long after a relevant change before rebuilding
    /// (e.g. `250ms`, `1s`). Changes arriving in the window are folded into
    /// the same rebuild. Off by default.
    #[arg(long, value_name = "DURATION")]
    pub debounce: Option<String>,

    /// Optional TOML config file; CLI flags take precedence over it.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Go toolchain binary to invoke.
    #[arg(long, value_name = "PATH")]
    pub go: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `-v`. If omitted, `GORUN_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// File or directory to build and run.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Arguments passed through to the program.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
