//! Cooperative stop and pause signalling for workers.
//!
//! Workers never get interrupted mid-render. They sample their
//! [`WorkerControl`] at fixed checkpoints: before each poll, while blocked
//! waiting for work, and once after every render before any side effect.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared pause flag with a condition variable for waiters.
#[derive(Debug, Default)]
struct PauseGate {
    paused: Mutex<bool>,
    changed: Condvar,
}

impl PauseGate {
    fn set(&self, paused: bool) {
        let mut guard = self.paused.lock();
        *guard = paused;
        self.changed.notify_all();
    }

    fn wake(&self) {
        let _guard = self.paused.lock();
        self.changed.notify_all();
    }
}

/// Stop/pause token handed to every worker.
///
/// Stopping uses a [`CancellationToken`]: [`child`](Self::child) controls
/// inherit the parent's stop but can be stopped on their own. Pausing is
/// shared by the parent and every child.
#[derive(Debug, Clone, Default)]
pub struct WorkerControl {
    token: CancellationToken,
    gate: Arc<PauseGate>,
}

impl WorkerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a control that stops when this one stops, and shares its
    /// pause state.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            gate: Arc::clone(&self.gate),
        }
    }

    /// Requests a stop. Irreversible.
    pub fn stop(&self) {
        self.token.cancel();
        self.gate.wake();
    }

    /// Suspends workers at their next checkpoint.
    pub fn pause(&self) {
        self.gate.set(true);
    }

    /// Lets paused workers continue.
    pub fn resume(&self) {
        self.gate.set(false);
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_paused(&self) -> bool {
        *self.gate.paused.lock()
    }

    /// True when in-progress work must be discarded: stopped or paused.
    pub fn is_cancelled(&self) -> bool {
        self.is_stopped() || self.is_paused()
    }

    /// Blocks while paused.
    ///
    /// Returns `false` if the control was stopped, `true` once it is running.
    /// `recheck` bounds each wait so a stop from a parent token (which cannot
    /// notify the gate) is still observed promptly.
    pub fn wait_while_paused(&self, recheck: Duration) -> bool {
        let mut paused = self.gate.paused.lock();
        while *paused && !self.is_stopped() {
            self.gate.changed.wait_for(&mut paused, recheck);
        }
        !self.is_stopped()
    }
}
