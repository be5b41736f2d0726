// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod watch;

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::engine::{ControlEvent, Controller};
use crate::errors::Result;

/// Watch `project_root` and keep `entry` running, restarting it on
/// debounced file changes, until `stop` or a shutdown signal.
///
/// This is the crate's sole external operation. It wires together:
/// - the child process supervisor
/// - the controller that owns all watch/debounce/restart state
/// - the project and config-file watcher subscriptions
/// - the stdin command console
/// - signal handling
pub async fn start_watcher(entry: PathBuf, project_root: PathBuf) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel::<ControlEvent>(64);

    let supervisor_tx = exec::spawn_supervisor(entry.clone(), events_tx.clone());

    let mut controller = Controller::new(
        entry,
        project_root,
        events_tx.clone(),
        events_rx,
        supervisor_tx,
    )?;
    controller.start_watchers()?;

    console::spawn_console(events_tx.clone());

    // Ctrl-C → orderly shutdown through the same path as `stop`.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("watchrun: failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ControlEvent::ShutdownRequested).await;
        });
    }

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let tx = events_tx.clone();
        tokio::spawn(async move {
            let Ok(mut term) = signal(SignalKind::terminate()) else {
                return;
            };
            term.recv().await;
            let _ = tx.send(ControlEvent::ShutdownRequested).await;
        });
    }

    controller.run().await
}
