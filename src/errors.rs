// src/errors.rs

//! Crate-wide error aliases.
//!
//! Everything recoverable is reported through the output sink and handled
//! locally; what remains is wiring/startup failure, for which `anyhow` is
//! enough. This module is the single place to grow structured errors if that
//! ever changes.

pub use anyhow::{Error, Result};
