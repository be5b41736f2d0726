// src/exec/mod.rs

//! Child process supervision.
//!
//! Owns the lifecycle of the one supervised process: spawn through the
//! platform shell, forced kill-and-restart, and exit notification back into
//! the engine's control-event stream.

pub mod supervisor;

pub use supervisor::{RestartCause, SupervisorCommand, spawn_supervisor};
