// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Restart a process whenever project files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Entry target to supervise. Run through the platform shell, so plain
    /// executables and shebang scripts both work.
    #[arg(value_name = "ENTRY")]
    pub entry: PathBuf,

    /// Project root to watch. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Diagnostic log level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` is consulted; with neither set, internal
    /// diagnostics stay off and only the watcher's own output is shown.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
