// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling user watch/ignore patterns into matchers (`patterns`).
//! - Wiring up the recursive project watcher over `notify` (`watcher`).
//! - The second, independent watcher on the tool's state directory that
//!   drives live reconfiguration (`config_watcher`).
//!
//! It does **not** own any restart policy; it only turns filesystem changes
//! into control events for the engine.

pub mod config_watcher;
pub mod patterns;
pub mod watcher;

pub use config_watcher::spawn_config_watcher;
pub use patterns::{Matcher, PathFilter};
pub use watcher::{ChangeKind, ChangeRecord, WatcherHandle, spawn_project_watcher};
