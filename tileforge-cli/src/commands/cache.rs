//! Cache management CLI commands.

use clap::Subcommand;
use std::path::Path;
use tileforge::cache::{DiskCacheConfig, DiskTileCache, TileCache};
use tileforge::config::ConfigFile;

use super::load_config;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show durable cache statistics
    Stats,
    /// Remove every tile from the durable cache
    Clear,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let cache = inspect_cache(&config)?;

    match action {
        CacheAction::Stats => {
            println!("Disk cache: {}", cache.directory().display());
            println!("  Tiles:      {}", cache.len());
            println!("  Capacity:   {}", cache.capacity());
            println!(
                "  Persistent: {}",
                if config.cache.persistent { "yes" } else { "no" }
            );
            Ok(())
        }
        CacheAction::Clear => {
            let count = cache.len();
            println!("Clearing disk cache at: {}", cache.directory().display());
            cache.clear()?;
            println!("Deleted {} tiles", count);
            Ok(())
        }
    }
}

/// Open the configured durable cache without evicting or wiping anything.
fn inspect_cache(config: &ConfigFile) -> Result<DiskTileCache, CliError> {
    let cache = DiskTileCache::inspect(&DiskCacheConfig {
        directory: config.cache.directory.clone(),
        capacity: config.cache.disk_capacity,
        persistent: config.cache.persistent,
    })?;
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tileforge::raster::TileImage;
    use tileforge::tile::Fingerprint;

    fn config_for(dir: &TempDir, disk_capacity: usize) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.cache.directory = dir.path().to_path_buf();
        config.cache.disk_capacity = disk_capacity;
        config
    }

    fn fill(dir: &TempDir, tiles: u64) {
        let cache = DiskTileCache::open(&DiskCacheConfig {
            directory: dir.path().to_path_buf(),
            capacity: tiles as usize,
            persistent: true,
        })
        .unwrap();
        for n in 0..tiles {
            cache.put(Fingerprint::from_raw(n), &TileImage::new()).unwrap();
        }
    }

    #[test]
    fn test_inspect_cache_keeps_tiles_over_configured_capacity() {
        let temp = TempDir::new().unwrap();
        fill(&temp, 8);

        let cache = inspect_cache(&config_for(&temp, 2)).unwrap();
        assert_eq!(cache.len(), 8);
        drop(cache);

        assert_eq!(inspect_cache(&config_for(&temp, 8)).unwrap().len(), 8);
    }

    #[test]
    fn test_inspect_cache_keeps_tiles_when_not_persistent() {
        let temp = TempDir::new().unwrap();
        fill(&temp, 3);

        let mut config = config_for(&temp, 8);
        config.cache.persistent = false;
        drop(inspect_cache(&config).unwrap());

        assert_eq!(inspect_cache(&config_for(&temp, 8)).unwrap().len(), 3);
    }
}
