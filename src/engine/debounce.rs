// src/engine/debounce.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

/// State of one coalescing restart cycle: idle → pending (timer armed) →
/// fired (quiet period over, deferred action outstanding) → idle.
///
/// Timer expiries are delivered as ordinary events carrying a generation
/// stamp; re-arming bumps the generation, so a stale expiry is simply
/// ignored on receipt instead of the sleep being aborted. At most one
/// restart executes per armed window.
#[derive(Debug, Default)]
pub struct DebounceGate {
    next_generation: u64,
    /// Generation of the armed (pending) window, if any.
    pending: Option<u64>,
    /// Generation of a fired window whose deferred action is outstanding.
    fired: Option<u64>,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm, or re-arm, the gate for a full quiet period.
    ///
    /// Returns the generation to stamp on the expiry event, and whether
    /// this opened a fresh coalescing window (the caller announces the
    /// upcoming restart exactly once per window, on the first event of a
    /// burst).
    pub fn arm(&mut self) -> (u64, bool) {
        self.next_generation += 1;
        let fresh = self.pending.is_none();
        self.pending = Some(self.next_generation);
        (self.next_generation, fresh)
    }

    /// Consume a quiet-period expiry. Pending → fired on a current
    /// generation; a stale or cancelled expiry returns false.
    pub fn try_fire(&mut self, generation: u64) -> bool {
        if self.pending == Some(generation) {
            self.pending = None;
            self.fired = Some(generation);
            true
        } else {
            false
        }
    }

    /// Consume the deferred action of a fired window. Fired → idle on a
    /// current generation.
    pub fn complete(&mut self, generation: u64) -> bool {
        if self.fired == Some(generation) {
            self.fired = None;
            true
        } else {
            false
        }
    }

    /// Cancel an armed window. A fired window's deferred action is left to
    /// run to completion.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Cancel the armed window and any outstanding deferred action.
    pub fn cancel_all(&mut self) {
        self.pending = None;
        self.fired = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Deliver `make_event()` to `tx` after `delay`.
///
/// The expiry is an ordinary event; the receiver validates its generation
/// against the owning gate.
pub fn schedule<E, F>(delay: Duration, tx: mpsc::Sender<E>, make_event: F)
where
    E: Send + 'static,
    F: FnOnce() -> E + Send + 'static,
{
    tokio::spawn(async move {
        sleep(delay).await;
        let _ = tx.send(make_event()).await;
    });
}
