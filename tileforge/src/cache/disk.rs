//! Disk-backed tile cache with LRU eviction.
//!
//! Tiles are stored as PNG files sharded by the first two hex digits of
//! their fingerprint:
//!
//! ```text
//! <directory>/ba/ba7816bf8f01cfea.png
//! ```
//!
//! Writes go to a uniquely named temporary file in the shard directory and
//! are renamed into place, so readers never observe a partial tile.

use crate::cache::lru_index::LruIndex;
use crate::cache::r#trait::TileCache;
use crate::cache::stats::TileCacheStats;
use crate::cache::types::{CacheError, DiskCacheConfig};
use crate::raster::TileImage;
use crate::tile::Fingerprint;
use image::ImageFormat;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

const TILE_EXTENSION: &str = "png";
const TEMP_EXTENSION: &str = "tmp";

/// Durable tile cache tier.
///
/// Keeps an in-memory index of the tiles on disk. When persistent, tiles
/// found in the directory at startup are indexed (oldest modification time
/// first in eviction order). When not persistent, the directory's tiles are
/// removed at startup and again when the cache is dropped.
pub struct DiskTileCache {
    directory: PathBuf,
    capacity: usize,
    persistent: AtomicBool,
    index: Mutex<LruIndex>,
    stats: Mutex<TileCacheStats>,
    temp_counter: AtomicU64,
}

impl DiskTileCache {
    /// Open a disk cache.
    ///
    /// # Arguments
    ///
    /// * `config` - Directory, capacity, and persistence of the cache
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or scanned.
    pub fn open(config: &DiskCacheConfig) -> Result<Self, CacheError> {
        let cache = Self::unindexed(config, config.persistent)?;

        if config.persistent {
            cache.scan_directory(true)?;
            cache.evict_if_over_capacity()?;
        } else {
            cache.remove_tile_files()?;
        }

        info!(
            directory = %cache.directory.display(),
            capacity = cache.capacity,
            persistent = config.persistent,
            entries = cache.len(),
            "Disk tile cache opened"
        );

        Ok(cache)
    }

    /// Open an existing cache directory without modifying it.
    ///
    /// The directory is indexed as a persistent cache, but tiles beyond
    /// `config.capacity` are not evicted and temporary files left by a
    /// running writer are not removed. Dropping the result leaves every
    /// file in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or scanned.
    pub fn inspect(config: &DiskCacheConfig) -> Result<Self, CacheError> {
        let cache = Self::unindexed(config, true)?;
        cache.scan_directory(false)?;
        debug!(
            directory = %cache.directory.display(),
            entries = cache.len(),
            "Disk tile cache opened for inspection"
        );
        Ok(cache)
    }

    fn unindexed(config: &DiskCacheConfig, persistent: bool) -> Result<Self, CacheError> {
        fs::create_dir_all(&config.directory)?;
        Ok(Self {
            directory: config.directory.clone(),
            capacity: config.capacity,
            persistent: AtomicBool::new(persistent),
            index: Mutex::new(LruIndex::new()),
            stats: Mutex::new(TileCacheStats::new()),
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Root directory of this cache.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding the tile for `key`.
    pub fn tile_path(&self, key: &Fingerprint) -> PathBuf {
        let name = key.to_string();
        self.directory
            .join(&name[..2])
            .join(format!("{name}.{TILE_EXTENSION}"))
    }

    fn temp_path(&self, key: &Fingerprint) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = key.to_string();
        self.directory
            .join(&name[..2])
            .join(format!("{name}.{n}.{TEMP_EXTENSION}"))
    }

    fn write_tile(&self, key: &Fingerprint, image: &TileImage) -> Result<(), CacheError> {
        let path = self.tile_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path(key);
        if let Err(e) = image.as_rgba().save_with_format(&temp, ImageFormat::Png) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn read_tile(&self, key: &Fingerprint) -> Result<TileImage, CacheError> {
        let pixels = image::open(self.tile_path(key))?.to_rgba8();
        Ok(TileImage::from_rgba(pixels)?)
    }

    /// Evict least recently used tiles until the index fits the capacity.
    ///
    /// Returns the number of evicted tiles.
    pub fn evict_if_over_capacity(&self) -> Result<u64, CacheError> {
        let mut index = self.index.lock();
        let mut evicted = 0u64;
        while index.len() > self.capacity {
            let Some(oldest) = index.pop_oldest() else {
                break;
            };
            self.remove_file(&oldest);
            evicted += 1;
        }
        let count = index.len();
        drop(index);

        if evicted > 0 {
            debug!(evicted, remaining = count, "Disk cache eviction");
            let mut stats = self.stats.lock();
            stats.record_evictions(evicted);
            stats.update_entry_count(count);
        }
        Ok(evicted)
    }

    fn remove_file(&self, key: &Fingerprint) {
        let path = self.tile_path(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove cached tile");
            }
        }
    }

    /// Build the index from tile files already in the directory.
    ///
    /// Leftover temporary files are deleted when `remove_temp` is set.
    fn scan_directory(&self, remove_temp: bool) -> Result<(), CacheError> {
        let mut found: Vec<(Fingerprint, SystemTime)> = Vec::new();

        for shard in fs::read_dir(&self.directory)? {
            let shard = shard?.path();
            if !is_shard_dir(&shard) {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                if has_extension(&path, TEMP_EXTENSION) {
                    if remove_temp {
                        let _ = fs::remove_file(&path);
                    }
                    continue;
                }
                if let Some(key) = parse_tile_file_name(&path) {
                    let modified = fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .unwrap_or(SystemTime::UNIX_EPOCH);
                    found.push((key, modified));
                }
            }
        }

        found.sort_by_key(|(_, modified)| *modified);

        let mut index = self.index.lock();
        for (key, _) in found {
            index.record(key);
        }
        self.stats.lock().update_entry_count(index.len());
        Ok(())
    }

    /// Remove every tile and temporary file under the directory.
    fn remove_tile_files(&self) -> Result<(), CacheError> {
        if !self.directory.exists() {
            return Ok(());
        }
        for shard in fs::read_dir(&self.directory)? {
            let shard = shard?.path();
            if !is_shard_dir(&shard) {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                if parse_tile_file_name(&path).is_some() || has_extension(&path, TEMP_EXTENSION) {
                    fs::remove_file(&path)?;
                }
            }
            // Leaves shards holding foreign files in place
            let _ = fs::remove_dir(&shard);
        }
        Ok(())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

fn is_shard_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.len() == 2 && n.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Parse a fingerprint from `<16 hex>.png`.
fn parse_tile_file_name(path: &Path) -> Option<Fingerprint> {
    if !has_extension(path, TILE_EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

impl TileCache for DiskTileCache {
    fn contains_key(&self, key: &Fingerprint) -> bool {
        self.index.lock().contains(key)
    }

    fn get(&self, key: &Fingerprint) -> Option<Arc<TileImage>> {
        if !self.index.lock().touch(key) {
            self.stats.lock().record_miss();
            return None;
        }

        match self.read_tile(key) {
            Ok(image) => {
                self.stats.lock().record_hit();
                Some(Arc::new(image))
            }
            Err(e) => {
                warn!(fingerprint = %key, error = %e, "Dropping unreadable cached tile");
                let mut index = self.index.lock();
                index.remove(key);
                let count = index.len();
                drop(index);
                self.remove_file(key);

                let mut stats = self.stats.lock();
                stats.record_miss();
                stats.update_entry_count(count);
                None
            }
        }
    }

    fn put(&self, key: Fingerprint, image: &TileImage) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Ok(());
        }

        if let Err(e) = self.write_tile(&key, image) {
            self.stats.lock().record_write_failure();
            return Err(e);
        }

        {
            let mut index = self.index.lock();
            index.record(key);
            let count = index.len();
            drop(index);

            let mut stats = self.stats.lock();
            stats.record_write();
            stats.update_entry_count(count);
        }

        self.evict_if_over_capacity()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let mut index = self.index.lock();
        let removed = self.remove_tile_files();
        match &removed {
            Ok(()) => index.clear(),
            // Keep tracking whatever survived a partial removal
            Err(_) => index.retain(|key| self.tile_path(key).is_file()),
        }
        let count = index.len();
        drop(index);
        self.stats.lock().update_entry_count(count);
        removed
    }

    fn len(&self) -> usize {
        self.index.lock().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    fn set_persistent(&self, persistent: bool) -> Result<(), CacheError> {
        self.persistent.store(persistent, Ordering::Release);
        Ok(())
    }

    fn stats(&self) -> TileCacheStats {
        self.stats.lock().clone()
    }
}

impl Drop for DiskTileCache {
    fn drop(&mut self) {
        if self.is_persistent() {
            return;
        }
        if let Err(e) = self.remove_tile_files() {
            warn!(
                directory = %self.directory.display(),
                error = %e,
                "Failed to remove non-persistent tile cache"
            );
        }
    }
}
