//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file, plus the
//! conversions into the library's runtime configuration types.

use crate::cache::{CacheConfig, DiskCacheConfig, MemoryCacheConfig};
use crate::tile::JobParameters;
use crate::worker::WorkerPoolConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Cache settings
    pub cache: CacheSettings,
    /// Worker pool settings
    pub workers: WorkerSettings,
    /// Default render parameters
    pub render: RenderSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Durable tier directory
    pub directory: PathBuf,
    /// Fast tier capacity in tiles
    pub memory_capacity: usize,
    /// Durable tier capacity in tiles
    pub disk_capacity: usize,
    /// Keep durable tiles across sessions
    pub persistent: bool,
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Number of worker threads
    pub count: usize,
    /// Bound on idle and pause waits, in milliseconds
    pub idle_wait_ms: u64,
}

/// Render parameters applied to requests built by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub theme: String,
    pub text_scale: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        CacheConfig {
            memory: MemoryCacheConfig {
                capacity: settings.memory_capacity,
            },
            disk: DiskCacheConfig {
                directory: settings.directory.clone(),
                capacity: settings.disk_capacity,
                persistent: settings.persistent,
            },
        }
    }
}

impl From<&WorkerSettings> for WorkerPoolConfig {
    fn from(settings: &WorkerSettings) -> Self {
        WorkerPoolConfig::default()
            .with_workers(settings.count)
            .with_idle_wait(Duration::from_millis(settings.idle_wait_ms))
    }
}

impl From<&RenderSettings> for JobParameters {
    fn from(settings: &RenderSettings) -> Self {
        JobParameters::new(settings.theme.clone(), settings.text_scale)
    }
}
