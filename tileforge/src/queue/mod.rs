//! Queue of pending render requests.
//!
//! Any number of producers may push while workers poll. Requests are handed
//! out lowest priority value first, FIFO among equal priorities. A request
//! whose fingerprint is already pending is not queued a second time.

use crate::tile::{Fingerprint, RenderRequest, TileCoord};
use crate::worker::WorkerControl;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Priority added per zoom level of difference from the scheduled centre.
pub const ZOOM_LEVEL_PENALTY: f64 = 5.0;

/// Upper bound on a single blocking wait inside [`JobQueue::poll`].
pub const DEFAULT_POLL_RECHECK: Duration = Duration::from_millis(50);

struct QueuedJob {
    priority: f64,
    seq: u64,
    request: RenderRequest,
}

// BinaryHeap is a max-heap; invert so the lowest (priority, seq) pops first.
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedJob {}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedJob>,
    pending: HashSet<Fingerprint>,
    next_seq: u64,
    center: Option<TileCoord>,
}

impl QueueState {
    fn insert(&mut self, request: RenderRequest, priority: f64) -> bool {
        if !self.pending.insert(request.fingerprint()) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedJob {
            priority,
            seq,
            request,
        });
        true
    }
}

/// Priority of `tile` relative to the visible centre: distance in tiles plus
/// a penalty per zoom level of difference.
pub fn scheduling_priority(tile: &TileCoord, center: &TileCoord) -> f64 {
    let zoom_diff = (i32::from(tile.zoom) - i32::from(center.zoom)).unsigned_abs();
    tile.distance_to(center) + ZOOM_LEVEL_PENALTY * f64::from(zoom_diff)
}

/// Thread-safe priority queue of render requests.
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    poll_recheck: Duration,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::with_poll_recheck(DEFAULT_POLL_RECHECK)
    }

    /// Creates a queue whose blocking waits re-check the worker control at
    /// least every `poll_recheck`.
    pub fn with_poll_recheck(poll_recheck: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            poll_recheck,
        }
    }

    /// Enqueues a request.
    ///
    /// The priority is the distance from the last [`schedule`](Self::schedule)
    /// centre, or 0 if no centre was set. Returns `false` if a request with the
    /// same fingerprint is already pending.
    pub fn push(&self, request: RenderRequest) -> bool {
        let mut state = self.state.lock();
        let priority = state
            .center
            .map(|center| scheduling_priority(request.tile(), &center))
            .unwrap_or(0.0);
        self.insert_locked(&mut state, request, priority)
    }

    /// Enqueues a request with an explicit priority (lower is sooner).
    pub fn push_with_priority(&self, request: RenderRequest, priority: f64) -> bool {
        let mut state = self.state.lock();
        self.insert_locked(&mut state, request, priority)
    }

    fn insert_locked(&self, state: &mut QueueState, request: RenderRequest, priority: f64) -> bool {
        let fingerprint = request.fingerprint();
        if state.insert(request, priority) {
            self.available.notify_one();
            true
        } else {
            debug!(fingerprint = %fingerprint, "Request already pending, not queued");
            false
        }
    }

    /// Non-blocking check for pending work.
    pub fn has_work(&self) -> bool {
        !self.state.lock().heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_work()
    }

    /// Removes and returns the next request.
    ///
    /// Blocks while the queue is empty. Returns `None` as soon as `control` is
    /// stopped or paused, so a worker never blocks here past a stop.
    pub fn poll(&self, control: &WorkerControl) -> Option<RenderRequest> {
        let mut state = self.state.lock();
        loop {
            if control.is_cancelled() {
                return None;
            }
            if let Some(job) = state.heap.pop() {
                state.pending.remove(&job.request.fingerprint());
                return Some(job.request);
            }
            self.available.wait_for(&mut state, self.poll_recheck);
        }
    }

    /// Waits up to `timeout` for the queue to become non-empty.
    ///
    /// Returns whether work is available. Also returns early when
    /// [`wake_all`](Self::wake_all) is called.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if state.heap.is_empty() {
            self.available.wait_for(&mut state, timeout);
        }
        !state.heap.is_empty()
    }

    /// Wakes every thread blocked in [`poll`](Self::poll) or
    /// [`wait_for_work`](Self::wait_for_work).
    pub fn wake_all(&self) {
        let _state = self.state.lock();
        self.available.notify_all();
    }

    /// Drops every pending request and returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.heap.len();
        state.heap.clear();
        state.pending.clear();
        removed
    }

    /// Re-prioritizes pending requests around `center`, nearest first.
    ///
    /// Requests pushed afterwards are prioritized against the same centre.
    pub fn schedule(&self, center: TileCoord) {
        let mut state = self.state.lock();
        state.center = Some(center);
        let jobs = std::mem::take(&mut state.heap).into_vec();
        state.heap = jobs
            .into_iter()
            .map(|mut job| {
                job.priority = scheduling_priority(job.request.tile(), &center);
                job
            })
            .collect();
        debug!(center = %center, pending = state.heap.len(), "Rescheduled job queue");
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
