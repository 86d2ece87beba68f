//! User configuration for TileForge.
//!
//! Settings are read from `~/.tileforge/config.ini`:
//!
//! ```ini
//! [cache]
//! memory_capacity = 128
//! disk_capacity = 4096
//! directory = ~/.cache/tileforge
//! persistent = true
//!
//! [workers]
//! count = 2
//! idle_wait_ms = 100
//!
//! [render]
//! theme = osmarender
//! text_scale = 1.0
//!
//! [logging]
//! file = ~/.tileforge/tileforge.log
//! ```
//!
//! Missing files and keys fall back to the defaults in [`defaults`].
//!
//! # Example
//!
//! ```
//! use tileforge::cache::CacheConfig;
//! use tileforge::config::ConfigFile;
//! use tileforge::worker::WorkerPoolConfig;
//!
//! let config = ConfigFile::default();
//! let cache = CacheConfig::from(&config.cache);
//! let workers = WorkerPoolConfig::from(&config.workers);
//! assert_eq!(cache.memory.capacity, 128);
//! assert_eq!(workers.workers, 2);
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, RenderSettings, WorkerSettings};
