// src/console.rs

//! Runtime command console.
//!
//! A line-oriented interpreter over standard input that coexists with the
//! watchers and the supervised process. The reader only parses and forwards
//! commands; all replies and state changes happen on the controller task.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::ControlEvent;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Clear,
    Help,
    Status,
    LastChange,
    /// `silent` toggles, `silent on` / `silent off` force.
    Silent(Option<bool>),
    Restart,
    Stop,
    /// Anything non-empty that is not a known command.
    Unknown(String),
}

/// Parse one input line. Returns `None` for blank lines.
///
/// Commands are case-insensitive and surrounding whitespace is ignored.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut words = line.split_whitespace();
    let head = words.next()?.to_lowercase();
    let arg = words.next().map(str::to_lowercase);
    let trailing = words.next().is_some();

    let cmd = match (head.as_str(), arg.as_deref(), trailing) {
        ("clear" | "cls", None, _) => ConsoleCommand::Clear,
        ("help" | "h" | "?", None, _) => ConsoleCommand::Help,
        ("status" | "stats", None, _) => ConsoleCommand::Status,
        ("last-change" | "lc", None, _) => ConsoleCommand::LastChange,
        ("silent", None, _) => ConsoleCommand::Silent(None),
        ("silent", Some("on"), false) => ConsoleCommand::Silent(Some(true)),
        ("silent", Some("off"), false) => ConsoleCommand::Silent(Some(false)),
        ("rs", None, _) => ConsoleCommand::Restart,
        ("stop" | "x", None, _) => ConsoleCommand::Stop,
        _ => ConsoleCommand::Unknown(line.to_string()),
    };
    Some(cmd)
}

/// Spawn the stdin reader.
///
/// Reads happen on a plain thread: a blocked console read must not hold up
/// runtime shutdown, and the thread dies with the process.
pub fn spawn_console(events_tx: mpsc::Sender<ControlEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(cmd) = parse_command(&line) else {
                continue;
            };
            if events_tx
                .blocking_send(ControlEvent::Console(cmd))
                .is_err()
            {
                break;
            }
        }
        debug!("console reader ended");
    });
}
