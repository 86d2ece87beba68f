//! Rendering backend abstraction.
//!
//! A [`Renderer`] fills a worker's scratch [`TileImage`] for one
//! [`RenderRequest`]. It is the dominant cost of the pipeline, runs
//! synchronously on a worker thread, and cannot be interrupted.
//!
//! [`DebugRenderer`] is a deterministic pattern renderer used by the CLI and
//! the tests.

mod debug;

pub use debug::DebugRenderer;

use crate::raster::TileImage;
use crate::tile::RenderRequest;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a renderer.
///
/// Render failures are soft: the worker logs them and moves on without
/// touching the caches or the display.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The request names a map file that does not exist
    #[error("Map file not found: {}", .0.display())]
    MissingMapFile(PathBuf),

    /// The map file could not be read
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Capability that produces the pixels of a tile.
pub trait Renderer: Send + Sync {
    /// Fill `buffer` with the tile described by `request`.
    ///
    /// The buffer's previous contents are unspecified; implementations must
    /// overwrite every pixel they rely on.
    fn execute(&self, request: &RenderRequest, buffer: &mut TileImage) -> Result<(), RenderError>;
}
