// src/engine/mod.rs

//! The watch/debounce/restart control core.
//!
//! This module ties together:
//! - the debounce gates that coalesce event bursts (`debounce`)
//! - the controller event loop that owns all mutable state and reacts to:
//!   - accepted file changes
//!   - timer expiries
//!   - config-file changes
//!   - console commands
//!   - child process lifecycle events
//!   - shutdown signals

pub mod controller;
pub mod debounce;

pub use controller::{ControlEvent, Controller};
pub use debounce::DebounceGate;
