//! Default values for every configuration setting.

use crate::cache::{default_cache_directory, DEFAULT_DISK_CAPACITY, DEFAULT_MEMORY_CAPACITY};
use crate::tile::{DEFAULT_TEXT_SCALE, DEFAULT_THEME};
use crate::worker::{DEFAULT_IDLE_WAIT, DEFAULT_WORKER_COUNT};

use super::file::config_directory;
use super::settings::{CacheSettings, ConfigFile, LoggingSettings, RenderSettings, WorkerSettings};

/// Default fast tier capacity in tiles.
pub const DEFAULT_CONFIG_MEMORY_CAPACITY: usize = DEFAULT_MEMORY_CAPACITY;

/// Default durable tier capacity in tiles.
pub const DEFAULT_CONFIG_DISK_CAPACITY: usize = DEFAULT_DISK_CAPACITY;

/// Default number of workers.
pub const DEFAULT_CONFIG_WORKERS: usize = DEFAULT_WORKER_COUNT;

/// Upper bound on `[workers] count`.
pub const MAX_WORKERS: usize = 64;

/// Default idle wait in milliseconds.
pub const DEFAULT_IDLE_WAIT_MS: u64 = DEFAULT_IDLE_WAIT.as_millis() as u64;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tileforge.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_directory(),
                memory_capacity: DEFAULT_CONFIG_MEMORY_CAPACITY,
                disk_capacity: DEFAULT_CONFIG_DISK_CAPACITY,
                persistent: true,
            },
            workers: WorkerSettings {
                count: DEFAULT_CONFIG_WORKERS,
                idle_wait_ms: DEFAULT_IDLE_WAIT_MS,
            },
            render: RenderSettings {
                theme: DEFAULT_THEME.to_string(),
                text_scale: DEFAULT_TEXT_SCALE,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE),
            },
        }
    }
}
