// src/config/mod.rs

//! Configuration for gorun.
//!
//! Responsibilities:
//! - Define the optional TOML-backed file model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and normalise it (`validate.rs`).
//! - Merge CLI flags, the config file and the environment into the single
//!   [`Settings`] value the rest of the crate consumes (`settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_and_validate_with, load_from_path};
pub use model::{BuildSection, ConfigFile, RawConfigFile, WatchConfig, WatchSection};
pub use settings::{Settings, DEFAULT_EXTENSION, DEFAULT_GO};
