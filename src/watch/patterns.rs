// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use notify::RecursiveMode;

use crate::errors::{GorunError, Result};
use crate::watch::path_utils::{absolutize, relative_str};

/// Segment meaning "this directory and everything below it".
const RECURSIVE_WILDCARD: &str = "...";

/// One compiled watch pattern.
///
/// A pattern is split into a static base path, which is what the notifier
/// actually watches, and an optional glob remainder matched against event
/// paths relative to that base:
///
/// | pattern          | base          | remainder   |
/// |------------------|---------------|-------------|
/// | `./dir/...`      | `<cwd>/dir`   | (all)       |
/// | `*.txt`          | `<cwd>`       | `*.txt`     |
/// | `src/**/*.go`    | `<cwd>/src`   | `**/*.go`   |
/// | `src/.../*.go`   | `<cwd>/src`   | `**/*.go`   |
/// | `./main.go`      | `<cwd>/main.go` | (all)     |
///
/// `*` and `?` do not cross `/`; use `**` or `...` for that.
#[derive(Clone)]
pub struct WatchPattern {
    raw: String,
    base: PathBuf,
    matcher: Option<GlobMatcher>,
    recursive: bool,
}

impl fmt::Debug for WatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPattern")
            .field("raw", &self.raw)
            .field("base", &self.base)
            .field("recursive", &self.recursive)
            .finish_non_exhaustive()
    }
}

impl WatchPattern {
    /// Compile `raw`, resolving relative patterns against `cwd`.
    ///
    /// Does not touch the filesystem; [`crate::watch::subscribe`] checks that
    /// the base exists.
    pub fn parse(cwd: &Path, raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace('\\', "/");
        if normalized.is_empty() {
            return Err(GorunError::WatchSetup("empty watch pattern".to_string()));
        }

        let segments: Vec<&str> = normalized.split('/').collect();
        let split_at = segments
            .iter()
            .position(|s| is_dynamic_segment(s))
            .unwrap_or(segments.len());

        let (static_part, dynamic_part) = segments.split_at(split_at);

        let static_str = static_part.join("/");
        let base = if static_str.is_empty() {
            absolutize(cwd, Path::new("."))
        } else {
            absolutize(cwd, Path::new(&static_str))
        };

        // A lone trailing `...` is the same as no remainder at all.
        let dynamic: Vec<&str> = match dynamic_part {
            [only] if *only == RECURSIVE_WILDCARD => Vec::new(),
            rest => rest
                .iter()
                .map(|s| if *s == RECURSIVE_WILDCARD { "**" } else { *s })
                .collect(),
        };

        if dynamic.is_empty() {
            return Ok(Self {
                raw: raw.to_string(),
                base,
                matcher: None,
                recursive: true,
            });
        }

        let remainder = dynamic.join("/");
        let glob = GlobBuilder::new(&remainder)
            .literal_separator(true)
            .build()
            .map_err(|e| GorunError::WatchSetup(format!("invalid watch pattern {raw:?}: {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            base,
            recursive: dynamic.len() > 1 || remainder.contains("**"),
            matcher: Some(glob.compile_matcher()),
        })
    }

    /// Everything under `dir`; the default when no patterns are given.
    pub fn everything_under(dir: &Path) -> Self {
        Self {
            raw: format!("{}/{}", dir.display(), RECURSIVE_WILDCARD),
            base: dir.to_path_buf(),
            matcher: None,
            recursive: true,
        }
    }

    /// Pattern as written by the user.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Path handed to the notifier.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn recursive_mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }

    /// True if the pattern has a glob remainder, as opposed to naming a
    /// directory or file outright.
    pub fn is_glob(&self) -> bool {
        self.matcher.is_some()
    }

    /// Replace the base with its canonical form once it is known to exist.
    pub(crate) fn with_base(mut self, base: PathBuf) -> Self {
        self.base = base;
        self
    }

    /// True if an event for `path` belongs to this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.base, path) else {
            return false;
        };

        match &self.matcher {
            None => true,
            Some(matcher) => matcher.is_match(rel.as_str()),
        }
    }
}

fn is_dynamic_segment(segment: &str) -> bool {
    segment == RECURSIVE_WILDCARD || segment.contains(['*', '?', '[', '{'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> WatchPattern {
        WatchPattern::parse(Path::new("/work"), raw).unwrap()
    }

    #[test]
    fn ellipsis_watches_directory_recursively() {
        let p = parse("./app/...");

        assert_eq!(p.base(), Path::new("/work/app"));
        assert_eq!(p.recursive_mode(), RecursiveMode::Recursive);
        assert!(p.matches(Path::new("/work/app/main.go")));
        assert!(p.matches(Path::new("/work/app/internal/db/db.go")));
        assert!(!p.matches(Path::new("/work/other/main.go")));
    }

    #[test]
    fn plain_directory_means_everything_below() {
        let p = parse("app");

        assert!(!p.is_glob());
        assert_eq!(p.base(), Path::new("/work/app"));
        assert!(p.matches(Path::new("/work/app/x/y.go")));
    }

    #[test]
    fn top_level_glob_is_not_recursive() {
        let p = parse("*.txt");

        assert!(p.is_glob());
        assert_eq!(p.base(), Path::new("/work"));
        assert_eq!(p.recursive_mode(), RecursiveMode::NonRecursive);
        assert!(p.matches(Path::new("/work/notes.txt")));
        assert!(!p.matches(Path::new("/work/main.go")));
        assert!(!p.matches(Path::new("/work/sub/notes.txt")));
    }

    #[test]
    fn double_star_and_ellipsis_are_equivalent() {
        for raw in ["src/**/*.go", "src/.../*.go"] {
            let p = parse(raw);

            assert_eq!(p.base(), Path::new("/work/src"), "{raw}");
            assert_eq!(p.recursive_mode(), RecursiveMode::Recursive, "{raw}");
            assert!(p.matches(Path::new("/work/src/a/b/c.go")), "{raw}");
            assert!(p.matches(Path::new("/work/src/c.go")), "{raw}");
            assert!(!p.matches(Path::new("/work/src/a/b/c.txt")), "{raw}");
        }
    }

    #[test]
    fn absolute_patterns_keep_their_root() {
        let p = parse("/srv/shared/...");
        assert_eq!(p.base(), Path::new("/srv/shared"));
    }

    #[test]
    fn parent_segments_are_resolved() {
        let p = parse("../lib/...");
        assert_eq!(p.base(), Path::new("/lib"));
    }

    #[test]
    fn default_pattern_covers_target_directory() {
        let p = WatchPattern::everything_under(Path::new("/work/app"));

        assert_eq!(p.recursive_mode(), RecursiveMode::Recursive);
        assert!(p.matches(Path::new("/work/app/deep/nested/file.go")));
        assert!(!p.matches(Path::new("/work/elsewhere.go")));
    }

    #[test]
    fn invalid_glob_is_a_watch_setup_error() {
        let err = WatchPattern::parse(Path::new("/work"), "src/[abc.go").unwrap_err();
        assert!(matches!(err, GorunError::WatchSetup(_)));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(WatchPattern::parse(Path::new("/work"), "  ").is_err());
    }
}
