// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling watch patterns into a watched base path plus an optional glob.
//! - Wiring up a cross-platform filesystem watcher (`notify`) and exposing
//!   its events as one ordered [`ChangeStream`].
//! - Deciding which changed paths are relevant enough to rebuild for.
//!
//! It does **not** know about builds or processes; the engine decides what a
//! relevant change means.

pub mod path_utils;
pub mod patterns;
pub mod relevance;
pub mod watcher;

pub use patterns::WatchPattern;
pub use relevance::RelevanceFilter;
pub use watcher::{resolve_patterns, subscribe, translate_event, ChangeStream};
