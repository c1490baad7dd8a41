// src/watch/relevance.rs

//! Decides whether a change should trigger a rebuild.

use std::path::Path;

use crate::config::DEFAULT_EXTENSION;
use crate::watch::patterns::WatchPattern;

/// Pure, stateless predicate over changed paths.
///
/// A path is relevant if its extension is one of the configured source
/// extensions (compared without the leading dot, case-sensitively), or if
/// it matches one of the glob patterns added with
/// [`RelevanceFilter::with_globs`].
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    extensions: Vec<String>,
    globs: Vec<WatchPattern>,
}

impl RelevanceFilter {
    /// `extensions` are expected in bare form (`"go"`, not `".go"`).
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions,
            globs: Vec::new(),
        }
    }

    /// Also treat paths matched by these patterns as relevant.
    ///
    /// Only patterns with a glob remainder count; a plain directory pattern
    /// would make every file below it relevant.
    pub fn with_globs(mut self, patterns: impl IntoIterator<Item = WatchPattern>) -> Self {
        self.globs
            .extend(patterns.into_iter().filter(WatchPattern::is_glob));
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        let by_extension = match path.extension() {
            Some(ext) => self.extensions.iter().any(|e| ext == e.as_str()),
            None => false,
        };

        by_extension || self.globs.iter().any(|glob| glob.matches(path))
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(vec![DEFAULT_EXTENSION.to_string()])
    }
}
