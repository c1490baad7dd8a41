// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{BuildSection, ConfigFile, RawConfigFile, WatchConfig};
use crate::errors::{GorunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GorunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let watch = WatchConfig {
            patterns: validate_patterns(&raw.watch.patterns, "[watch].patterns")?,
            extensions: raw
                .watch
                .extensions
                .as_deref()
                .map(normalize_extensions)
                .transpose()?,
            debounce: raw
                .watch
                .debounce
                .as_deref()
                .map(validate_debounce)
                .transpose()?,
        };

        validate_build_section(&raw.build)?;

        Ok(ConfigFile::new_unchecked(watch, raw.build))
    }
}

/// Reject blank patterns; trim the rest.
pub fn validate_patterns(patterns: &[String], origin: &str) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(GorunError::ConfigError(format!(
                "{origin} must not contain empty patterns"
            )));
        }
        out.push(trimmed.to_string());
    }
    Ok(out)
}

/// Normalise extensions to their bare form (`".go"` -> `"go"`).
///
/// An explicitly empty list is an error: nothing would ever be relevant.
pub fn normalize_extensions(extensions: &[String]) -> Result<Vec<String>> {
    if extensions.is_empty() {
        return Err(GorunError::ConfigError(
            "extension list must not be empty".to_string(),
        ));
    }

    let mut out: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let bare = ext.trim().trim_start_matches('.');
        if bare.is_empty() {
            return Err(GorunError::ConfigError(format!(
                "invalid extension {ext:?}: must not be empty"
            )));
        }
        if bare.contains(['/', '\\']) {
            return Err(GorunError::ConfigError(format!(
                "invalid extension {ext:?}: must not contain path separators"
            )));
        }
        if !out.iter().any(|e| e == bare) {
            out.push(bare.to_string());
        }
    }
    Ok(out)
}

pub fn validate_debounce(raw: &str) -> Result<Duration> {
    parse_duration(raw)
        .map_err(|e| GorunError::ConfigError(format!("invalid debounce {raw:?}: {e}")))
}

/// The artifact name becomes a file name in the scratch directory.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GorunError::ConfigError(
            "artifact name must not be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(GorunError::ConfigError(format!(
            "artifact name {name:?} must be a plain file name"
        )));
    }
    Ok(())
}

fn validate_build_section(build: &BuildSection) -> Result<()> {
    if let Some(go) = &build.go {
        if go.trim().is_empty() {
            return Err(GorunError::ConfigError(
                "[build].go must not be empty".to_string(),
            ));
        }
    }
    if let Some(name) = &build.name {
        validate_name(name)?;
    }
    Ok(())
}
