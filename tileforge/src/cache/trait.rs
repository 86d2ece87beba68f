//! Tile cache trait definition for dependency injection.

use crate::cache::stats::TileCacheStats;
use crate::cache::types::CacheError;
use crate::raster::TileImage;
use crate::tile::Fingerprint;
use std::sync::Arc;

/// Key/value store from request fingerprint to rendered tile.
///
/// Both cache tiers implement this trait; workers never see which concrete
/// cache they talk to. Implementations must be safe to share between
/// workers. Eviction is the implementation's own concern.
///
/// # Example
///
/// ```
/// use tileforge::cache::{MemoryTileCache, TileCache};
/// use tileforge::raster::TileImage;
/// use tileforge::tile::{RenderRequest, TileCoord};
///
/// fn render_through(cache: &dyn TileCache, request: &RenderRequest) {
///     if cache.contains_key(&request.fingerprint()) {
///         return;
///     }
///     let tile = TileImage::new();
///     cache.put(request.fingerprint(), &tile).ok();
/// }
///
/// let cache = MemoryTileCache::new(16);
/// let request = RenderRequest::new(TileCoord::new(1, 1, 2).unwrap());
/// render_through(&cache, &request);
/// assert!(cache.contains_key(&request.fingerprint()));
/// ```
pub trait TileCache: Send + Sync {
    /// Membership test. Does not count as an access for eviction purposes.
    fn contains_key(&self, key: &Fingerprint) -> bool;

    /// Returns the cached tile, if present.
    fn get(&self, key: &Fingerprint) -> Option<Arc<TileImage>>;

    /// Stores a copy of `image` under `key`, evicting as needed.
    fn put(&self, key: Fingerprint, image: &TileImage) -> Result<(), CacheError>;

    /// Removes every entry.
    fn clear(&self) -> Result<(), CacheError>;

    /// Number of entries currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    /// Whether entries survive the cache being dropped.
    fn is_persistent(&self) -> bool {
        false
    }

    /// Changes persistence.
    ///
    /// Caches that cannot persist return
    /// [`CacheError::PersistenceUnsupported`] when asked to.
    fn set_persistent(&self, persistent: bool) -> Result<(), CacheError> {
        if persistent {
            Err(CacheError::PersistenceUnsupported)
        } else {
            Ok(())
        }
    }

    /// Snapshot of this cache's counters.
    fn stats(&self) -> TileCacheStats;
}

/// Cache that never stores anything.
///
/// Useful for disabling a tier:
/// - running without a durable tier
/// - measuring render throughput without cache hits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTileCache;

impl TileCache for NoOpTileCache {
    fn contains_key(&self, _key: &Fingerprint) -> bool {
        false
    }

    fn get(&self, _key: &Fingerprint) -> Option<Arc<TileImage>> {
        None
    }

    fn put(&self, _key: Fingerprint, _image: &TileImage) -> Result<(), CacheError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }

    fn stats(&self) -> TileCacheStats {
        TileCacheStats::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Fingerprint {
        Fingerprint::from_raw(42)
    }

    #[test]
    fn test_noop_cache_never_contains() {
        let cache = NoOpTileCache;
        cache.put(key(), &TileImage::new()).unwrap();
        assert!(!cache.contains_key(&key()));
        assert!(cache.get(&key()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_noop_cache_rejects_persistence() {
        let cache = NoOpTileCache;
        assert!(!cache.is_persistent());
        assert!(matches!(
            cache.set_persistent(true),
            Err(CacheError::PersistenceUnsupported)
        ));
        assert!(cache.set_persistent(false).is_ok());
    }

    #[test]
    fn test_noop_cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoOpTileCache>();
    }

    #[test]
    fn test_noop_cache_as_trait_object() {
        let cache: Arc<dyn TileCache> = Arc::new(NoOpTileCache);
        assert!(cache.clear().is_ok());
        assert_eq!(cache.capacity(), 0);
        assert_eq!(cache.stats(), TileCacheStats::new());
    }
}
