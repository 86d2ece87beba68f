//! Background tile workers.
//!
//! - [`TileWorker`]: the render loop, one request at a time
//! - [`WorkerPool`]: N workers on named threads over a shared [`WorkerContext`]
//! - [`WorkerControl`]: cooperative stop / pause
//! - [`InFlightRegistry`]: keeps two workers from rendering the same tile

mod control;
mod in_flight;
mod pool;
mod stats;
#[allow(clippy::module_inception)]
mod worker;

pub use control::WorkerControl;
pub use in_flight::{InFlightClaim, InFlightEntry, InFlightRegistry, InFlightStats};
pub use pool::{WorkerError, WorkerPool, WorkerPoolConfig, DEFAULT_WORKER_COUNT};
pub use stats::{WorkerMonitor, WorkerStats};
pub use worker::{JobOutcome, TileWorker, WorkerContext, WorkerState, DEFAULT_IDLE_WAIT};
