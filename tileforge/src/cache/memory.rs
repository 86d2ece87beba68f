//! In-memory tile cache with LRU eviction.

use crate::cache::lru_index::LruIndex;
use crate::cache::r#trait::TileCache;
use crate::cache::stats::TileCacheStats;
use crate::cache::types::CacheError;
use crate::raster::TileImage;
use crate::tile::Fingerprint;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Entries {
    images: HashMap<Fingerprint, Arc<TileImage>>,
    recency: LruIndex,
}

impl Entries {
    fn evict_lru(&mut self) -> Option<Fingerprint> {
        let oldest = self.recency.pop_oldest()?;
        self.images.remove(&oldest);
        Some(oldest)
    }
}

/// Fast tile cache tier.
///
/// Holds up to `capacity` tiles and evicts the least recently read or
/// written tile when full. A capacity of zero stores nothing.
pub struct MemoryTileCache {
    entries: Mutex<Entries>,
    capacity: usize,
    stats: Mutex<TileCacheStats>,
}

impl MemoryTileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity,
            stats: Mutex::new(TileCacheStats::new()),
        }
    }
}

impl TileCache for MemoryTileCache {
    fn contains_key(&self, key: &Fingerprint) -> bool {
        self.entries.lock().images.contains_key(key)
    }

    fn get(&self, key: &Fingerprint) -> Option<Arc<TileImage>> {
        let mut entries = self.entries.lock();
        let found = entries.images.get(key).cloned();
        if found.is_some() {
            entries.recency.touch(key);
        }
        drop(entries);

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.record_hit();
        } else {
            stats.record_miss();
        }
        found
    }

    fn put(&self, key: Fingerprint, image: &TileImage) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut entries = self.entries.lock();
        let mut evicted = 0;
        if !entries.images.contains_key(&key) {
            while entries.images.len() >= self.capacity {
                if entries.evict_lru().is_none() {
                    break;
                }
                evicted += 1;
            }
        }

        entries.images.insert(key, Arc::new(image.clone()));
        entries.recency.record(key);
        let count = entries.images.len();
        drop(entries);

        let mut stats = self.stats.lock();
        stats.record_write();
        stats.record_evictions(evicted);
        stats.update_entry_count(count);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        entries.images.clear();
        entries.recency.clear();
        drop(entries);
        self.stats.lock().update_entry_count(0);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().images.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn stats(&self) -> TileCacheStats {
        self.stats.lock().clone()
    }
}
