//! The tile worker loop.
//!
//! A [`TileWorker`] repeatedly takes one request from the shared
//! [`JobQueue`] and resolves it completely before taking the next:
//!
//! ```text
//! poll ─► claim ─► fast? ─► durable? ─► render ─► cancelled? ─► draw
//!           │        │          │          │                    │
//!           ▼        ▼          ▼          ▼          accepted ─┴─► fast.put
//!        dropped   dropped    dropped   failed                  │
//!                                                        notify_changed
//!                                                               │
//!                                                          durable.put
//! ```
//!
//! A cache hit is a silent no-op: the tile was already shown or stored by
//! whoever produced it.

use crate::cache::{CacheTier, TileCache, TileCaches};
use crate::display::DisplaySurface;
use crate::queue::JobQueue;
use crate::raster::{TileBuffer, TileImage};
use crate::render::Renderer;
use crate::tile::{Fingerprint, RenderRequest};
use crate::worker::control::WorkerControl;
use crate::worker::in_flight::InFlightRegistry;
use crate::worker::stats::WorkerMonitor;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default bound on idle and pause waits.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(100);

/// Observable state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Idle, paused, or blocked waiting for a request
    WaitingForWork = 0,
    /// Processing one request
    Rendering = 1,
    /// Loop exited; the render buffer is released
    Stopped = 2,
}

impl WorkerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Rendering,
            2 => WorkerState::Stopped,
            _ => WorkerState::WaitingForWork,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::WaitingForWork => write!(f, "waiting"),
            WorkerState::Rendering => write!(f, "rendering"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How one request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Already cached; nothing rendered, drawn or written
    CacheHit(CacheTier),
    /// Another worker holds the fingerprint; dropped
    AlreadyInFlight,
    /// The renderer reported an error; nothing drawn or written
    RenderFailed,
    /// Stopped or paused during the render; result discarded
    Cancelled,
    /// Rendered and written to the durable tier (and the fast tier when
    /// `accepted` by the display)
    Rendered { accepted: bool },
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::CacheHit(tier) => write!(f, "{} cache hit", tier),
            JobOutcome::AlreadyInFlight => write!(f, "already in flight"),
            JobOutcome::RenderFailed => write!(f, "render failed"),
            JobOutcome::Cancelled => write!(f, "cancelled"),
            JobOutcome::Rendered { accepted: true } => write!(f, "rendered"),
            JobOutcome::Rendered { accepted: false } => write!(f, "rendered off screen"),
        }
    }
}

/// Shared handles every worker of a pool needs.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<JobQueue>,
    pub caches: TileCaches,
    pub renderer: Arc<dyn Renderer>,
    pub display: Arc<dyn DisplaySurface>,
    pub in_flight: Arc<InFlightRegistry>,
}

impl WorkerContext {
    /// Context with a fresh in-flight registry.
    pub fn new(
        queue: Arc<JobQueue>,
        caches: TileCaches,
        renderer: Arc<dyn Renderer>,
        display: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            queue,
            caches,
            renderer,
            display,
            in_flight: Arc::new(InFlightRegistry::new()),
        }
    }
}

/// One cooperative render loop with its own scratch buffer.
pub struct TileWorker {
    id: usize,
    name: String,
    context: WorkerContext,
    control: WorkerControl,
    monitor: Arc<WorkerMonitor>,
    buffer: TileBuffer,
    idle_wait: Duration,
}

impl TileWorker {
    /// Creates a worker and allocates its render buffer.
    ///
    /// # Arguments
    ///
    /// * `id` - Worker index, used in the thread name and logs
    /// * `context` - Queue, caches, renderer, display and registry
    /// * `control` - Stop/pause token sampled at each checkpoint
    pub fn new(id: usize, context: WorkerContext, control: WorkerControl) -> Self {
        let name = format!("tile-worker-{}", id);
        Self {
            buffer: TileBuffer::allocate(name.clone()),
            id,
            name,
            context,
            control,
            monitor: Arc::new(WorkerMonitor::new()),
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }

    /// Bound on each idle or pause wait before re-checking the control.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for reading this worker's state and counters from elsewhere.
    pub fn monitor(&self) -> Arc<WorkerMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn state(&self) -> WorkerState {
        self.monitor.state()
    }

    /// Runs until the control is stopped, then releases the buffer.
    pub fn run(mut self) {
        info!(worker = %self.name, "Tile worker started");
        let queue = Arc::clone(&self.context.queue);

        loop {
            if self.control.is_stopped() {
                break;
            }

            if self.control.is_paused() {
                self.monitor.set_state(WorkerState::WaitingForWork);
                if !self.control.wait_while_paused(self.idle_wait) {
                    break;
                }
                continue;
            }

            if !queue.has_work() {
                self.monitor.set_state(WorkerState::WaitingForWork);
                queue.wait_for_work(self.idle_wait);
                continue;
            }

            let Some(request) = queue.poll(&self.control) else {
                continue;
            };

            self.monitor.set_state(WorkerState::Rendering);
            self.process(&request);
            self.monitor.set_state(WorkerState::WaitingForWork);
        }

        self.monitor.set_state(WorkerState::Stopped);
        info!(worker = %self.name, "Tile worker stopped");
    }

    /// Resolves one request and records the outcome.
    pub fn process(&mut self, request: &RenderRequest) -> JobOutcome {
        let started = Instant::now();
        let outcome = self.resolve(request);
        self.monitor.record(&outcome);
        debug!(
            worker = %self.name,
            tile = %request.tile(),
            fingerprint = %request.fingerprint(),
            outcome = %outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Processed tile request"
        );
        outcome
    }

    fn resolve(&mut self, request: &RenderRequest) -> JobOutcome {
        let fingerprint = request.fingerprint();
        let context = &self.context;

        // Held until after the cache writes
        let Some(_claim) = context.in_flight.try_claim(request, self.id) else {
            return JobOutcome::AlreadyInFlight;
        };

        if let Some(tier) = context.caches.lookup(&fingerprint) {
            return JobOutcome::CacheHit(tier);
        }

        let rendered = context
            .renderer
            .execute(request, self.buffer.image_mut());

        if self.control.is_cancelled() {
            return JobOutcome::Cancelled;
        }

        if let Err(e) = rendered {
            debug!(
                worker = %self.name,
                tile = %request.tile(),
                error = %e,
                "Render failed"
            );
            return JobOutcome::RenderFailed;
        }

        let image = self.buffer.image();
        let accepted = context.display.draw(request.tile(), image);
        if accepted {
            self.store(context.caches.fast().as_ref(), CacheTier::Fast, fingerprint, image);
        }
        context.display.notify_changed();
        self.store(
            context.caches.durable().as_ref(),
            CacheTier::Durable,
            fingerprint,
            image,
        );

        JobOutcome::Rendered { accepted }
    }

    fn store(&self, cache: &dyn TileCache, tier: CacheTier, key: Fingerprint, image: &TileImage) {
        if let Err(e) = cache.put(key, image) {
            self.monitor.record_cache_write_failure();
            warn!(
                worker = %self.name,
                tier = %tier,
                fingerprint = %key,
                error = %e,
                "Failed to write tile to cache"
            );
        }
    }
}
