//! Core types for the tile cache tiers.

use crate::raster::ImageError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default number of tiles held by the fast (memory) tier.
pub const DEFAULT_MEMORY_CAPACITY: usize = 128;

/// Default number of tiles held by the durable (disk) tier.
pub const DEFAULT_DISK_CAPACITY: usize = 4096;

/// Which cache tier a lookup was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Low latency, small capacity, holds tiles known to be visible
    Fast,
    /// Higher latency, large and possibly persistent, holds every rendered tile
    Durable,
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTier::Fast => write!(f, "fast"),
            CacheTier::Durable => write!(f, "durable"),
        }
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode a stored tile
    #[error("Cache image error: {0}")]
    Image(#[from] image::ImageError),

    /// Stored tile has the wrong dimensions
    #[error("Cached tile rejected: {0}")]
    InvalidTile(#[from] ImageError),

    /// The cache cannot keep its contents across sessions
    #[error("This cache does not support persistence")]
    PersistenceUnsupported,

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Memory cache configuration.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Maximum number of tiles (default: 128)
    pub capacity: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

/// Disk cache configuration.
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Cache directory root
    pub directory: PathBuf,
    /// Maximum number of tiles (default: 4096)
    pub capacity: usize,
    /// Keep tiles across sessions (default: true)
    pub persistent: bool,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            capacity: DEFAULT_DISK_CAPACITY,
            persistent: true,
        }
    }
}

/// Platform cache directory for tiles, e.g. `~/.cache/tileforge` on Linux.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tileforge")
}

/// Configuration for both cache tiers.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Fast tier configuration
    pub memory: MemoryCacheConfig,
    /// Durable tier configuration
    pub disk: DiskCacheConfig,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fast tier capacity in tiles.
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory.capacity = capacity;
        self
    }

    /// Set the durable tier capacity in tiles.
    pub fn with_disk_capacity(mut self, capacity: usize) -> Self {
        self.disk.capacity = capacity;
        self
    }

    /// Set the durable tier directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.disk.directory = dir;
        self
    }

    /// Set whether the durable tier survives restarts.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.disk.persistent = persistent;
        self
    }
}
