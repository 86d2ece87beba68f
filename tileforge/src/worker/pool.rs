//! Pool of tile workers sharing one queue, one pair of caches and one
//! in-flight registry.
//!
//! Each worker runs on its own named OS thread (`tile-worker-N`). The pool
//! owns the parent [`WorkerControl`]; every worker gets a child control, so
//! the pool can stop everyone at once or a single worker on its own.

use crate::worker::control::WorkerControl;
use crate::worker::stats::{WorkerMonitor, WorkerStats};
use crate::worker::worker::{TileWorker, WorkerContext, WorkerState, DEFAULT_IDLE_WAIT};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Worker pool errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The OS refused to start a worker thread
    #[error("Failed to spawn worker thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A pool needs at least one worker
    #[error("Worker pool must have at least one worker")]
    NoWorkers,
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads (default: 2)
    pub workers: usize,
    /// Bound on each idle or pause wait (default: 100ms)
    pub idle_wait: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }
}

impl WorkerPoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }
}

struct PoolWorker {
    name: String,
    control: WorkerControl,
    monitor: Arc<WorkerMonitor>,
    handle: Option<JoinHandle<()>>,
}

/// Running set of tile workers.
///
/// Dropping the pool stops and joins every worker.
pub struct WorkerPool {
    control: WorkerControl,
    context: WorkerContext,
    workers: Vec<PoolWorker>,
}

impl WorkerPool {
    /// Spawns `config.workers` workers over `context`.
    ///
    /// If a thread fails to spawn, workers already started are stopped and
    /// joined before the error is returned.
    pub fn start(config: &WorkerPoolConfig, context: WorkerContext) -> Result<Self, WorkerError> {
        if config.workers == 0 {
            return Err(WorkerError::NoWorkers);
        }

        let mut pool = Self {
            control: WorkerControl::new(),
            context,
            workers: Vec::with_capacity(config.workers),
        };

        for id in 0..config.workers {
            let control = pool.control.child();
            let worker = TileWorker::new(id, pool.context.clone(), control.clone())
                .with_idle_wait(config.idle_wait);
            let name = worker.name().to_string();
            let monitor = worker.monitor();

            let handle = match thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run())
            {
                Ok(handle) => handle,
                Err(source) => {
                    pool.shutdown();
                    return Err(WorkerError::Spawn { name, source });
                }
            };

            pool.workers.push(PoolWorker {
                name,
                control,
                monitor,
                handle: Some(handle),
            });
        }

        info!(workers = pool.workers.len(), "Worker pool started");
        Ok(pool)
    }

    /// Suspends every worker at its next checkpoint.
    ///
    /// A render already in progress completes but its result is discarded.
    pub fn pause(&self) {
        self.control.pause();
        self.context.queue.wake_all();
        info!("Worker pool paused");
    }

    pub fn resume(&self) {
        self.control.resume();
        info!("Worker pool resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// Tells every worker to exit. Does not wait; see [`join`](Self::join).
    pub fn stop(&self) {
        self.control.stop();
        self.context.queue.wake_all();
    }

    /// Stops a single worker. Returns `false` for an unknown id.
    pub fn stop_worker(&self, id: usize) -> bool {
        match self.workers.get(id) {
            Some(worker) => {
                worker.control.stop();
                self.context.queue.wake_all();
                true
            }
            None => false,
        }
    }

    /// Waits for every stopped worker thread to exit.
    ///
    /// Only call after [`stop`](Self::stop); running workers never exit on
    /// their own.
    pub fn join(&mut self) {
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!(worker = %worker.name, "Worker thread panicked");
                }
            }
        }
    }

    /// Stops and joins every worker.
    pub fn shutdown(&mut self) {
        self.stop();
        self.join();
        if !self.workers.is_empty() {
            info!(workers = self.workers.len(), "Worker pool stopped");
        }
    }

    /// Aggregated counters of every worker.
    pub fn stats(&self) -> WorkerStats {
        self.workers.iter().map(|w| w.monitor.stats()).sum()
    }

    pub fn states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(|w| w.monitor.state()).collect()
    }

    /// True when no worker is processing a request.
    pub fn is_idle(&self) -> bool {
        self.states()
            .iter()
            .all(|state| *state != WorkerState::Rendering)
    }

    pub fn context(&self) -> &WorkerContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}
