// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::ControlEvent;
use crate::watch::patterns::PathFilter;

/// Events observed inside this window after watcher registration are
/// dropped: some backends report pre-existing files when a watch is first
/// established, and only genuine post-start changes should count.
const STARTUP_SETTLE: Duration = Duration::from_millis(500);

/// Kind of an accepted file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Change,
    Remove,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Add => "add",
            ChangeKind::Change => "change",
            ChangeKind::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// The most recent accepted file event.
///
/// A single record, overwritten on every accepted event and never cleared;
/// the console's `last-change` command reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Forward-slash path relative to the watch root.
    pub relative_path: String,
    pub kind: ChangeKind,
    pub observed_at: DateTime<Local>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {}",
            self.kind,
            self.relative_path,
            self.observed_at.format("%H:%M:%S")
        )
    }
}

/// Handle for a filesystem watcher subscription.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping the handle closes the subscription.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl WatcherHandle {
    pub(crate) fn new(inner: RecommendedWatcher) -> Self {
        Self { _inner: inner }
    }
}

/// Spawn the recursive project watcher.
///
/// Every raw event path is normalized to a forward-slash path relative to
/// `root`, run through `filter` (ignore list first, then watch list), and
/// forwarded as [`ControlEvent::PathChanged`] when accepted. The watcher is
/// fully disposable: drop the handle and create a new one to swap in fresh
/// matchers after a config change.
pub fn spawn_project_watcher(
    root: impl Into<PathBuf>,
    filter: PathFilter,
    events_tx: mpsc::Sender<ControlEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // tracing is not reliably usable from the notify thread.
                    eprintln!("watchrun: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("watchrun: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    debug!("project watcher started on {:?}", root);

    let settle_until = Instant::now() + STARTUP_SETTLE;
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if Instant::now() < settle_until {
                continue;
            }
            let Some(kind) = change_kind(&event.kind) else {
                continue;
            };
            for path in &event.paths {
                let Some(rel) = relative_str(&root, path) else {
                    warn!("could not relativize path {:?} against root {:?}", path, root);
                    continue;
                };
                if rel.is_empty() {
                    continue;
                }
                if !filter.accepts(&rel) {
                    debug!(path = %rel, "change filtered out");
                    continue;
                }
                let record = ChangeRecord {
                    relative_path: rel,
                    kind,
                    observed_at: Local::now(),
                };
                debug!(path = %record.relative_path, kind = %record.kind, "change accepted");
                if events_tx
                    .send(ControlEvent::PathChanged(record))
                    .await
                    .is_err()
                {
                    // Engine gone; no point keeping the loop alive.
                    return;
                }
            }
        }
        debug!("project watcher loop ended");
    });

    Ok(WatcherHandle::new(watcher))
}

/// Map raw notify event kinds onto the three kinds the engine reacts to.
pub(crate) fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Add),
        EventKind::Modify(_) => Some(ChangeKind::Change),
        EventKind::Remove(_) => Some(ChangeKind::Remove),
        _ => None,
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
