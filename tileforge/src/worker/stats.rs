//! Per-worker counters and aggregated pool statistics.

use crate::cache::CacheTier;
use crate::worker::worker::{JobOutcome, WorkerState};
use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Snapshot of what one or more workers have done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests taken from the queue
    pub processed: u64,
    /// Dropped because the fast tier had them
    pub fast_hits: u64,
    /// Dropped because the durable tier had them
    pub durable_hits: u64,
    /// Dropped because another worker was processing them
    pub already_in_flight: u64,
    pub render_failures: u64,
    /// Rendered but discarded at the cancellation checkpoint
    pub cancelled: u64,
    /// Rendered and accepted by the display
    pub accepted: u64,
    /// Rendered but rejected by the display
    pub rejected: u64,
    pub cache_write_failures: u64,
}

impl WorkerStats {
    /// Successful renders, accepted or not.
    pub fn rendered(&self) -> u64 {
        self.accepted + self.rejected
    }

    pub fn cache_hits(&self) -> u64 {
        self.fast_hits + self.durable_hits
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.fast_hits += other.fast_hits;
        self.durable_hits += other.durable_hits;
        self.already_in_flight += other.already_in_flight;
        self.render_failures += other.render_failures;
        self.cancelled += other.cancelled;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.cache_write_failures += other.cache_write_failures;
    }
}

impl std::iter::Sum for WorkerStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut total, stats| {
            total += stats;
            total
        })
    }
}

/// Live state and counters of one worker, readable from other threads.
#[derive(Debug, Default)]
pub struct WorkerMonitor {
    state: AtomicU8,
    processed: AtomicU64,
    fast_hits: AtomicU64,
    durable_hits: AtomicU64,
    already_in_flight: AtomicU64,
    render_failures: AtomicU64,
    cancelled: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    cache_write_failures: AtomicU64,
}

impl WorkerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn record(&self, outcome: &JobOutcome) {
        let counter = match outcome {
            JobOutcome::CacheHit(CacheTier::Fast) => &self.fast_hits,
            JobOutcome::CacheHit(CacheTier::Durable) => &self.durable_hits,
            JobOutcome::AlreadyInFlight => &self.already_in_flight,
            JobOutcome::RenderFailed => &self.render_failures,
            JobOutcome::Cancelled => &self.cancelled,
            JobOutcome::Rendered { accepted: true } => &self.accepted,
            JobOutcome::Rendered { accepted: false } => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        // Last so a reader that sees the job processed also sees its outcome
        self.processed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            processed: self.processed.load(Ordering::Acquire),
            fast_hits: self.fast_hits.load(Ordering::Relaxed),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            already_in_flight: self.already_in_flight.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
        }
    }
}
