//! High-level facade that wires caches, queue and worker pool together.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tileforge::display::{FrameBuffer, Viewport};
//! use tileforge::render::DebugRenderer;
//! use tileforge::service::{TileSystem, TileSystemConfig};
//! use tileforge::tile::{RenderRequest, TileCoord};
//!
//! let center = TileCoord::new(2741, 4394, 13)?;
//! let display = Arc::new(FrameBuffer::new(Viewport::around(center, 1)?));
//! let system = TileSystem::start(
//!     &TileSystemConfig::default(),
//!     Arc::new(DebugRenderer::new()),
//!     display.clone(),
//! )?;
//!
//! system.schedule(center);
//! system.submit_all(center.neighbourhood(1).into_iter().map(RenderRequest::new));
//! system.wait_idle(Duration::from_secs(30));
//! let stats = system.shutdown();
//! println!("rendered {} tiles", stats.rendered());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::cache::{CacheConfig, CacheError, TileCaches};
use crate::display::DisplaySurface;
use crate::queue::JobQueue;
use crate::render::Renderer;
use crate::tile::{RenderRequest, TileCoord};
use crate::worker::{
    InFlightStats, WorkerContext, WorkerError, WorkerPool, WorkerPoolConfig, WorkerState,
    WorkerStats,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

/// Interval between checks in [`TileSystem::wait_idle`].
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from building a tile system.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failed to open the caches
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Failed to start the workers
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Configuration for a [`TileSystem`].
#[derive(Debug, Clone, Default)]
pub struct TileSystemConfig {
    pub cache: CacheConfig,
    pub workers: WorkerPoolConfig,
}

/// Running tile rendering system: caches, queue and worker pool.
pub struct TileSystem {
    queue: Arc<JobQueue>,
    caches: TileCaches,
    pool: WorkerPool,
    submitted: AtomicU64,
    cleared: AtomicU64,
}

impl TileSystem {
    /// Open the caches described by `config` and start the workers.
    pub fn start(
        config: &TileSystemConfig,
        renderer: Arc<dyn Renderer>,
        display: Arc<dyn DisplaySurface>,
    ) -> Result<Self, ServiceError> {
        let caches = TileCaches::open(&config.cache)?;
        Self::with_caches(caches, &config.workers, renderer, display)
    }

    /// Start workers over existing caches.
    pub fn with_caches(
        caches: TileCaches,
        workers: &WorkerPoolConfig,
        renderer: Arc<dyn Renderer>,
        display: Arc<dyn DisplaySurface>,
    ) -> Result<Self, ServiceError> {
        let queue = Arc::new(JobQueue::new());
        let context = WorkerContext::new(Arc::clone(&queue), caches.clone(), renderer, display);
        let pool = WorkerPool::start(workers, context)?;

        Ok(Self {
            queue,
            caches,
            pool,
            submitted: AtomicU64::new(0),
            cleared: AtomicU64::new(0),
        })
    }

    /// Enqueue a request. Returns `false` if the same request is already
    /// pending.
    pub fn submit(&self, request: RenderRequest) -> bool {
        let queued = self.queue.push(request);
        if queued {
            self.submitted.fetch_add(1, Ordering::AcqRel);
        }
        queued
    }

    /// Enqueue several requests, returning how many were queued.
    pub fn submit_all<I>(&self, requests: I) -> usize
    where
        I: IntoIterator<Item = RenderRequest>,
    {
        requests
            .into_iter()
            .filter(|request| self.submit(request.clone()))
            .count()
    }

    /// Render tiles nearest `center` first.
    pub fn schedule(&self, center: TileCoord) {
        self.queue.schedule(center);
    }

    /// Drop every pending request, returning how many were removed.
    pub fn clear_queue(&self) -> usize {
        let removed = self.queue.clear();
        self.cleared.fetch_add(removed as u64, Ordering::AcqRel);
        removed
    }

    /// Requests submitted through this system that have not been resolved.
    pub fn pending(&self) -> u64 {
        let done = self.pool.stats().processed + self.cleared.load(Ordering::Acquire);
        self.submitted.load(Ordering::Acquire).saturating_sub(done)
    }

    /// Blocks until every submitted request is resolved or `timeout` elapses.
    ///
    /// Returns whether the system went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.pending() == 0 && self.queue.is_empty() && self.pool.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_CHECK_INTERVAL);
        }
    }

    pub fn pause(&self) {
        self.pool.pause();
    }

    pub fn resume(&self) {
        self.pool.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.pool.is_paused()
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn caches(&self) -> &TileCaches {
        &self.caches
    }

    pub fn stats(&self) -> WorkerStats {
        self.pool.stats()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.pool.states()
    }

    pub fn in_flight_stats(&self) -> InFlightStats {
        self.pool.context().in_flight.stats()
    }

    /// Stop and join the workers, returning their final counters.
    pub fn shutdown(mut self) -> WorkerStats {
        self.pool.shutdown();
        let stats = self.pool.stats();
        info!(
            processed = stats.processed,
            rendered = stats.rendered(),
            cache_hits = stats.cache_hits(),
            render_failures = stats.render_failures,
            "Tile system stopped"
        );
        self.caches.log_stats();
        stats
    }
}
