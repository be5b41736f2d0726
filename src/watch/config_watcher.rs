// src/watch/config_watcher.rs

use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::CONFIG_FILE_NAME;
use crate::engine::ControlEvent;
use crate::watch::watcher::{WatcherHandle, change_kind};

/// Spawn the watcher over the tool's state directory.
///
/// Independent from the project watcher: non-recursive, filtered to the
/// config filename, and debounced by the engine's own config timer. Emits
/// [`ControlEvent::ConfigFileChanged`] so the engine can reload and rebuild
/// the project watcher.
pub fn spawn_config_watcher(
    state_dir: impl Into<PathBuf>,
    events_tx: mpsc::Sender<ControlEvent>,
) -> Result<WatcherHandle> {
    let state_dir = state_dir.into();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("watchrun: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("watchrun: config watch error: {err}");
            }
        },
        notify::Config::default(),
    )?;

    watcher.watch(&state_dir, RecursiveMode::NonRecursive)?;

    debug!("config watcher started on {:?}", state_dir);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if change_kind(&event.kind).is_none() {
                continue;
            }
            let is_config = event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(OsStr::new(CONFIG_FILE_NAME)));
            if !is_config {
                continue;
            }
            debug!("config file event observed");
            if events_tx
                .send(ControlEvent::ConfigFileChanged)
                .await
                .is_err()
            {
                return;
            }
        }
        debug!("config watcher loop ended");
    });

    Ok(WatcherHandle::new(watcher))
}
