//! TileForge - on-demand map tile rendering behind a two-tier cache
//!
//! Background workers take render requests from a prioritized queue, answer
//! them from a fast in-memory cache or a durable disk cache when possible,
//! and otherwise render the tile, offer it to the display, and store it.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use tileforge::service::{TileSystem, TileSystemConfig};
//!
//! let system = TileSystem::start(&TileSystemConfig::default(), renderer, display)?;
//! system.schedule(center);
//! system.submit_all(requests);
//! ```

pub mod cache;
pub mod config;
pub mod display;
pub mod logging;
pub mod queue;
pub mod raster;
pub mod render;
pub mod service;
pub mod tile;
pub mod worker;

/// Version of the TileForge library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
