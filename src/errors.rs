// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GorunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// A watch pattern could not be registered with the notifier.
    #[error("Watch setup error: {0}")]
    WatchSetup(String),

    #[error("Temporary build directory error: {0}")]
    ScratchDir(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GorunError>;
