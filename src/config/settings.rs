// src/config/settings.rs

//! Effective settings: CLI flags over config file over built-in defaults.

use std::ffi::OsString;
use std::time::Duration;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{normalize_extensions, validate_debounce, validate_name};
use crate::errors::Result;
use crate::watch::{RelevanceFilter, WatchPattern};

/// Source extension that triggers a rebuild when nothing else is configured.
pub const DEFAULT_EXTENSION: &str = "go";

/// Toolchain binary used when nothing else is configured.
pub const DEFAULT_GO: &str = "go";

/// Everything the supervisor needs to know, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Target exactly as the user typed it.
    pub target: String,
    /// Pass-through arguments for the program.
    pub args: Vec<String>,
    pub watch: bool,
    /// Explicit watch patterns; empty means "the target's directory".
    pub patterns: Vec<String>,
    pub extensions: Vec<String>,
    /// True if `-e` or the config file chose the extensions.
    pub explicit_extensions: bool,
    pub name: Option<String>,
    pub debounce: Option<Duration>,
    pub go: String,
    /// Value of `GOPATH`, if set.
    pub gopath: Option<OsString>,
}

impl Settings {
    /// Merge CLI flags with an optional config file and the `GOPATH` value.
    pub fn resolve(
        cli: &CliArgs,
        file: Option<&ConfigFile>,
        gopath: Option<OsString>,
    ) -> Result<Self> {
        let cli_patterns = split_patterns(&cli.patterns);
        // `-p` implies `-w`; patterns from the config file alone do not.
        let watch = cli.watch || !cli_patterns.is_empty();

        let patterns = if cli_patterns.is_empty() {
            file.map(|f| f.watch.patterns.clone()).unwrap_or_default()
        } else {
            cli_patterns
        };

        let (extensions, explicit_extensions) = if !cli.extensions.is_empty() {
            (normalize_extensions(&cli.extensions)?, true)
        } else if let Some(exts) = file.and_then(|f| f.watch.extensions.clone()) {
            (exts, true)
        } else {
            (vec![DEFAULT_EXTENSION.to_string()], false)
        };

        let debounce = match cli.debounce.as_deref() {
            Some(raw) => Some(validate_debounce(raw)?),
            None => file.and_then(|f| f.watch.debounce),
        };

        let name = cli
            .name
            .clone()
            .or_else(|| file.and_then(|f| f.build.name.clone()));
        if let Some(name) = &name {
            validate_name(name)?;
        }

        let go = cli
            .go
            .clone()
            .or_else(|| file.and_then(|f| f.build.go.clone()))
            .unwrap_or_else(|| DEFAULT_GO.to_string());

        let settings = Self {
            target: cli.target.clone(),
            args: cli.args.clone(),
            watch,
            patterns,
            extensions,
            explicit_extensions,
            name,
            debounce,
            go,
            gopath: gopath.filter(|p| !p.is_empty()),
        };

        debug!(?settings, "resolved settings");
        Ok(settings)
    }

    /// Relevance policy for the given watch patterns.
    ///
    /// Without explicit extensions, a file picked out by a glob pattern
    /// (`-p='*.txt'`) is relevant even if its extension is not `go`.
    pub fn relevance_filter(&self, patterns: &[WatchPattern]) -> RelevanceFilter {
        let filter = RelevanceFilter::new(self.extensions.clone());
        if self.explicit_extensions {
            filter
        } else {
            filter.with_globs(patterns.iter().cloned())
        }
    }
}

/// Trim CLI pattern values and drop empty ones (`-p=a,,b` is `a`, `b`).
fn split_patterns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{BuildSection, WatchConfig};
    use crate::errors::GorunError;
    use clap::Parser;
    use std::path::Path;

    fn cli(args: &[&str]) -> CliArgs {
        let mut full = vec!["gorun"];
        full.extend_from_slice(args);
        CliArgs::try_parse_from(full).unwrap()
    }

    fn file() -> ConfigFile {
        ConfigFile {
            watch: WatchConfig {
                patterns: vec!["./cmd/...".to_string()],
                extensions: Some(vec!["go".to_string(), "tmpl".to_string()]),
                debounce: Some(Duration::from_millis(100)),
            },
            build: BuildSection {
                go: Some("/opt/go/bin/go".to_string()),
                name: Some("api".to_string()),
            },
        }
    }

    #[test]
    fn defaults_without_config_file() {
        let s = Settings::resolve(&cli(&["./app", "x"]), None, None).unwrap();

        assert!(!s.watch);
        assert!(s.patterns.is_empty());
        assert_eq!(s.extensions, vec!["go"]);
        assert_eq!(s.go, "go");
        assert_eq!(s.name, None);
        assert_eq!(s.debounce, None);
        assert_eq!(s.args, vec!["x"]);
    }

    #[test]
    fn patterns_flag_implies_watch_and_drops_blanks() {
        let s = Settings::resolve(&cli(&["-p=./a, ,./b", "./app"]), None, None).unwrap();

        assert!(s.watch);
        assert_eq!(s.patterns, vec!["./a", "./b"]);
    }

    #[test]
    fn config_file_fills_in_unset_flags() {
        let s = Settings::resolve(&cli(&["-w", "./app"]), Some(&file()), None).unwrap();

        assert!(s.watch);
        assert_eq!(s.patterns, vec!["./cmd/..."]);
        assert_eq!(s.extensions, vec!["go", "tmpl"]);
        assert_eq!(s.debounce, Some(Duration::from_millis(100)));
        assert_eq!(s.go, "/opt/go/bin/go");
        assert_eq!(s.name.as_deref(), Some("api"));
    }

    #[test]
    fn config_file_patterns_do_not_enable_watch() {
        let s = Settings::resolve(&cli(&["./app"]), Some(&file()), None).unwrap();
        assert!(!s.watch);
    }

    #[test]
    fn flags_override_config_file() {
        let s = Settings::resolve(
            &cli(&["-e", ".txt", "-n", "web", "--debounce", "1s", "--go", "go1.22", "./app"]),
            Some(&file()),
            None,
        )
        .unwrap();

        assert_eq!(s.extensions, vec!["txt"]);
        assert_eq!(s.name.as_deref(), Some("web"));
        assert_eq!(s.debounce, Some(Duration::from_secs(1)));
        assert_eq!(s.go, "go1.22");
    }

    #[test]
    fn empty_gopath_is_treated_as_unset() {
        let s = Settings::resolve(&cli(&["./app"]), None, Some(OsString::new())).unwrap();
        assert_eq!(s.gopath, None);
    }

    #[test]
    fn glob_patterns_widen_default_relevance() {
        let s = Settings::resolve(&cli(&["-p=*.txt", "./app"]), None, None).unwrap();
        let patterns = [WatchPattern::parse(Path::new("/work"), "*.txt").unwrap()];
        let filter = s.relevance_filter(&patterns);

        assert!(!s.explicit_extensions);
        assert!(filter.is_relevant(Path::new("/work/notes.txt")));
        assert!(!filter.is_relevant(Path::new("/work/notes.md")));
    }

    #[test]
    fn explicit_extensions_are_not_widened_by_globs() {
        let s = Settings::resolve(&cli(&["-p=*.txt", "-e=go", "./app"]), None, None).unwrap();
        let patterns = [WatchPattern::parse(Path::new("/work"), "*.txt").unwrap()];

        assert!(s.explicit_extensions);
        assert!(!s.relevance_filter(&patterns).is_relevant(Path::new("/work/notes.txt")));
    }

    #[test]
    fn overflowing_debounce_is_a_config_error() {
        let err = Settings::resolve(&cli(&["--debounce=307445734561825861m", "./app"]), None, None)
            .unwrap_err();
        assert!(matches!(err, GorunError::ConfigError(_)), "{err:?}");
    }

    #[test]
    fn invalid_name_is_rejected() {
        assert!(Settings::resolve(&cli(&["-n", "a/b", "./app"]), None, None).is_err());
    }
}
