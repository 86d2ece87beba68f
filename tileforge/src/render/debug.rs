//! Deterministic debug pattern renderer.

use crate::raster::{TileImage, TILE_SIZE};
use crate::render::{RenderError, Renderer};
use crate::tile::RenderRequest;
use image::Rgba;
use sha2::{Digest, Sha256};
use std::thread;
use std::time::Duration;

const FRAME_COLOR: Rgba<u8> = Rgba([40, 40, 40, 255]);
const MARKER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WATER_TINT: Rgba<u8> = Rgba([60, 110, 200, 255]);

/// Base marker edge in pixels, before zoom and text scaling.
const MARKER_BASE: f32 = 4.0;

/// Renders a flat colour per tile.
///
/// The background is derived from the theme name and shaded as a
/// checkerboard by tile coordinate, so neighbouring tiles are
/// distinguishable. Debug settings add:
/// - a 1-pixel frame around the tile
/// - a centred square marker sized by zoom and text scale
/// - a water tint for tiles rendered without a map file
///
/// A request naming a map file that does not exist fails with
/// [`RenderError::MissingMapFile`].
#[derive(Debug, Clone, Default)]
pub struct DebugRenderer {
    delay: Duration,
}

impl DebugRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` on every render to simulate an expensive backend.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn background(request: &RenderRequest) -> Rgba<u8> {
        let digest = Sha256::digest(request.parameters().theme.as_bytes());
        let tile = request.tile();
        let shade: u8 = if (tile.row + tile.col) % 2 == 0 { 0 } else { 32 };
        Rgba([
            digest[0].wrapping_sub(shade),
            digest[1].wrapping_sub(shade),
            digest[2].wrapping_sub(shade),
            255,
        ])
    }

    fn draw_frame(buffer: &mut TileImage) {
        let last = TILE_SIZE - 1;
        for i in 0..TILE_SIZE {
            buffer.put_pixel(i, 0, FRAME_COLOR);
            buffer.put_pixel(i, last, FRAME_COLOR);
            buffer.put_pixel(0, i, FRAME_COLOR);
            buffer.put_pixel(last, i, FRAME_COLOR);
        }
    }

    fn draw_marker(request: &RenderRequest, buffer: &mut TileImage) {
        let scale = request.parameters().text_scale.max(0.0);
        let edge = ((MARKER_BASE + f32::from(request.tile().zoom)) * scale).round() as u32;
        let edge = edge.clamp(1, TILE_SIZE);
        let start = (TILE_SIZE - edge) / 2;
        for y in start..start + edge {
            for x in start..start + edge {
                buffer.put_pixel(x, y, MARKER_COLOR);
            }
        }
    }
}

fn blend(a: Rgba<u8>, b: Rgba<u8>) -> Rgba<u8> {
    let mix = |x: u8, y: u8| ((u16::from(x) + u16::from(y)) / 2) as u8;
    Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255])
}

impl Renderer for DebugRenderer {
    fn execute(&self, request: &RenderRequest, buffer: &mut TileImage) -> Result<(), RenderError> {
        if let Some(map_file) = request.map_file() {
            if !map_file.exists() {
                return Err(RenderError::MissingMapFile(map_file.to_path_buf()));
            }
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let debug = request.debug_settings();
        let mut background = Self::background(request);
        if debug.highlight_water_tiles && request.map_file().is_none() {
            background = blend(background, WATER_TINT);
        }
        buffer.fill(background);

        if debug.draw_tile_frames {
            Self::draw_frame(buffer);
        }
        if debug.draw_tile_coordinates {
            Self::draw_marker(request, buffer);
        }
        Ok(())
    }
}
