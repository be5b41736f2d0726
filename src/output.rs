// src/output.rs

//! User-facing watcher output.
//!
//! Distinct from the `tracing` diagnostics in [`crate::logging`]: these are
//! the lines a developer actually watches while the tool runs. Four levels
//! (error / warn / info / success) plus an unlabeled separator, with ANSI
//! styling via `console`, a silent gate toggled from the runtime console,
//! and an optional append-only file mirror with the styling stripped.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use console::{Term, style};

const SEPARATOR_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy)]
enum Level {
    Error,
    Warn,
    Info,
    Success,
}

impl Level {
    fn label(self) -> String {
        match self {
            Level::Error => style("[error]").red().bold().to_string(),
            Level::Warn => style("[warn]").yellow().to_string(),
            Level::Info => style("[info]").cyan().to_string(),
            Level::Success => style("[ok]").green().to_string(),
        }
    }

    fn gated_by_silent(self) -> bool {
        matches!(self, Level::Info | Level::Success)
    }
}

struct Mirror {
    path: PathBuf,
    file: File,
    reported_failure: bool,
}

/// Leveled output sink for the watcher.
pub struct Reporter {
    silent: bool,
    labels: bool,
    timestamps: bool,
    mirror: Option<Mirror>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            silent: false,
            labels: true,
            timestamps: true,
            mirror: None,
        }
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Point the file mirror at `path`, or disable it with `None`.
    ///
    /// An unopenable file disables the mirror; that is reported to stderr
    /// and the watch loop carries on.
    pub fn set_mirror(&mut self, path: Option<PathBuf>) {
        self.mirror = path.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Mirror {
                    path,
                    file,
                    reported_failure: false,
                }),
                Err(err) => {
                    eprintln!("watchrun: cannot open log file {}: {err}", path.display());
                    None
                }
            }
        });
    }

    pub fn error(&mut self, message: &str) {
        self.emit(Level::Error, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.emit(Level::Warn, message);
    }

    pub fn info(&mut self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn success(&mut self, message: &str) {
        self.emit(Level::Success, message);
    }

    /// Unlabeled separator line, gated like info.
    pub fn separator(&mut self) {
        if self.silent {
            return;
        }
        let line = style("-".repeat(SEPARATOR_WIDTH)).dim().to_string();
        println!("{line}");
        self.mirror_line(&line);
    }

    /// Bare line for console command replies. Never gated or labeled.
    pub fn plain(&mut self, message: &str) {
        println!("{message}");
        self.mirror_line(message);
    }

    pub fn clear_screen(&self) {
        let _ = Term::stdout().clear_screen();
    }

    fn emit(&mut self, level: Level, message: &str) {
        if self.silent && level.gated_by_silent() {
            return;
        }
        let mut line = String::new();
        if self.timestamps {
            line.push_str(&style(Local::now().format("%H:%M:%S")).dim().to_string());
            line.push(' ');
        }
        if self.labels {
            line.push_str(&level.label());
            line.push(' ');
        }
        line.push_str(message);
        println!("{line}");
        self.mirror_line(&line);
    }

    fn mirror_line(&mut self, rendered: &str) {
        let Some(mirror) = self.mirror.as_mut() else {
            return;
        };
        let plain = console::strip_ansi_codes(rendered);
        if let Err(err) = writeln!(mirror.file, "{plain}") {
            // Best-effort mirror: report to the next available sink once,
            // never interrupt the watch loop.
            if !mirror.reported_failure {
                eprintln!(
                    "watchrun: failed to append to {}: {err}",
                    mirror.path.display()
                );
                mirror.reported_failure = true;
            }
        }
    }
}
