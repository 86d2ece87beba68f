//! Fixed-size tile rasters and the worker's scratch buffer.

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::trace;

/// Width and height of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Errors from constructing tile rasters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Raster is not `TILE_SIZE` x `TILE_SIZE`
    #[error("Invalid tile dimensions: {width}x{height} (expected {TILE_SIZE}x{TILE_SIZE})")]
    InvalidDimensions { width: u32, height: u32 },
}

/// A `TILE_SIZE` x `TILE_SIZE` RGBA raster holding one rendered tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pixels: RgbaImage,
}

impl TileImage {
    /// Creates a fully transparent tile.
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::new(TILE_SIZE, TILE_SIZE),
        }
    }

    /// Wraps an existing raster, checking its dimensions.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, ImageError> {
        let (width, height) = pixels.dimensions();
        if width != TILE_SIZE || height != TILE_SIZE {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Iterates over `(x, y, pixel)` for every pixel, mutably.
    pub fn enumerate_pixels_mut(
        &mut self,
    ) -> impl Iterator<Item = (u32, u32, &mut Rgba<u8>)> + '_ {
        self.pixels.enumerate_pixels_mut()
    }

    /// Sets one pixel. Panics if `x` or `y` is outside the tile.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        self.pixels.put_pixel(x, y, color);
    }

    /// Overwrites every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// Size of the raw pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

impl Default for TileImage {
    fn default() -> Self {
        Self::new()
    }
}

/// The worker's exclusively owned render target.
///
/// Allocated once when a worker is built and released exactly once when the
/// worker is dropped, whichever way the worker exits.
#[derive(Debug)]
pub struct TileBuffer {
    owner: String,
    image: TileImage,
}

impl TileBuffer {
    pub fn allocate(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        trace!(owner = %owner, bytes = TILE_SIZE * TILE_SIZE * 4, "Allocated tile buffer");
        Self {
            owner,
            image: TileImage::new(),
        }
    }

    pub fn image(&self) -> &TileImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut TileImage {
        &mut self.image
    }
}

impl Drop for TileBuffer {
    fn drop(&mut self) {
        trace!(owner = %self.owner, "Released tile buffer");
    }
}
