//! CLI command implementations.
//!
//! - [`render`] - Render the tiles around a centre tile
//! - [`cache`] - Durable cache management (stats, clear)
//! - [`config`] - Configuration management (init, show)

pub mod cache;
pub mod config;
pub mod render;

use std::path::Path;
use tileforge::config::ConfigFile;

use crate::error::CliError;

/// Load the configuration from `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load(path)?)
}
