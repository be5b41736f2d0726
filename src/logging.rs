// src/logging.rs

//! Diagnostic logging setup using `tracing` + `tracing-subscriber`.
//!
//! These are internal diagnostics, separate from the user-facing watcher
//! output in [`crate::output`]. Priority for the level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WATCHRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. off (the console stays reserved for the watcher's own messages)

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Initialise the global diagnostic subscriber.
///
/// Safe to call once at startup. Does nothing when no level was requested.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => Some(lvl.into()),
        None => std::env::var("WATCHRUN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s)),
    };

    let Some(level) = level else {
        return Ok(());
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
