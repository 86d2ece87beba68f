//! Two-tier cache coordinator.

use crate::cache::disk::DiskTileCache;
use crate::cache::memory::MemoryTileCache;
use crate::cache::r#trait::{NoOpTileCache, TileCache};
use crate::cache::types::{CacheConfig, CacheError, CacheTier};
use crate::tile::Fingerprint;
use std::sync::Arc;
use tracing::info;

/// The fast and durable cache tiers shared by every worker.
#[derive(Clone)]
pub struct TileCaches {
    fast: Arc<dyn TileCache>,
    durable: Arc<dyn TileCache>,
}

impl TileCaches {
    /// Open a memory fast tier and a disk durable tier.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let fast = Arc::new(MemoryTileCache::new(config.memory.capacity));
        let durable = Arc::new(DiskTileCache::open(&config.disk)?);
        Ok(Self::new(fast, durable))
    }

    /// Combine two existing caches.
    pub fn new(fast: Arc<dyn TileCache>, durable: Arc<dyn TileCache>) -> Self {
        Self { fast, durable }
    }

    /// Memory fast tier with no durable tier.
    pub fn memory_only(capacity: usize) -> Self {
        Self::new(
            Arc::new(MemoryTileCache::new(capacity)),
            Arc::new(NoOpTileCache),
        )
    }

    pub fn fast(&self) -> &Arc<dyn TileCache> {
        &self.fast
    }

    pub fn durable(&self) -> &Arc<dyn TileCache> {
        &self.durable
    }

    /// First tier holding `key`, checking the fast tier first.
    pub fn lookup(&self, key: &Fingerprint) -> Option<CacheTier> {
        if self.fast.contains_key(key) {
            Some(CacheTier::Fast)
        } else if self.durable.contains_key(key) {
            Some(CacheTier::Durable)
        } else {
            None
        }
    }

    /// Empty both tiers.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.fast.clear()?;
        self.durable.clear()
    }

    /// Log current statistics for both tiers.
    pub fn log_stats(&self) {
        for (tier, cache) in [(CacheTier::Fast, &self.fast), (CacheTier::Durable, &self.durable)] {
            let stats = cache.stats();
            info!(
                tier = %tier,
                entries = cache.len(),
                capacity = cache.capacity(),
                hits = stats.hits,
                misses = stats.misses,
                hit_rate = %format!("{:.1}%", stats.hit_rate() * 100.0),
                writes = stats.writes,
                evictions = stats.evictions,
                "Tile cache statistics"
            );
        }
    }
}
