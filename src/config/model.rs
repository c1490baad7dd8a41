// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Optional config file as read from TOML.
///
/// ```toml
/// [watch]
/// patterns = ["./...", "../shared/..."]
/// extensions = ["go"]
/// debounce = "200ms"
///
/// [build]
/// go = "go"
/// name = "server"
/// ```
///
/// Every section and key is optional. Values here are defaults that CLI flags
/// override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Watch patterns used when watch mode is on and `-p` is not given.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions whose changes trigger a rebuild.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Settle window before a rebuild, e.g. `"200ms"`.
    #[serde(default)]
    pub debounce: Option<String>,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Go toolchain binary.
    #[serde(default)]
    pub go: Option<String>,

    /// Artifact / process name override.
    #[serde(default)]
    pub name: Option<String>,
}

/// Validated `[watch]` section with normalised values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchConfig {
    pub patterns: Vec<String>,
    /// Without leading dots.
    pub extensions: Option<Vec<String>>,
    pub debounce: Option<Duration>,
}

/// Validated config file. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub watch: WatchConfig,
    pub build: BuildSection,
}

impl ConfigFile {
    /// Build a `ConfigFile` from already-validated parts.
    pub(crate) fn new_unchecked(watch: WatchConfig, build: BuildSection) -> Self {
        Self { watch, build }
    }
}
