//! Two-tier tile cache.
//!
//! A small fast tier ([`MemoryTileCache`]) holds tiles that are likely to be
//! visible; a large durable tier ([`DiskTileCache`]) holds every rendered
//! tile and may survive restarts. Both implement [`TileCache`] and are keyed
//! by request [`Fingerprint`](crate::tile::Fingerprint).

mod disk;
mod lru_index;
mod memory;
mod stats;
mod system;
mod r#trait;
mod types;

pub use disk::DiskTileCache;
pub use memory::MemoryTileCache;
pub use r#trait::{NoOpTileCache, TileCache};
pub use stats::TileCacheStats;
pub use system::TileCaches;
pub use types::{
    default_cache_directory, CacheConfig, CacheError, CacheTier, DiskCacheConfig,
    MemoryCacheConfig, DEFAULT_DISK_CAPACITY, DEFAULT_MEMORY_CAPACITY,
};
