//! Headless display surface backed by an RGBA canvas.

use crate::display::DisplaySurface;
use crate::raster::{TileImage, TILE_SIZE};
use crate::tile::{CoordError, TileCoord};
use image::{imageops, ImageFormat, RgbaImage};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::trace;

/// Largest viewport width or height, in tiles.
///
/// Bounds the canvas at `MAX_VIEWPORT_SPAN * TILE_SIZE` pixels per side.
pub const MAX_VIEWPORT_SPAN: u32 = 16;

/// Errors building a [`Viewport`].
#[derive(Debug, Error)]
pub enum ViewportError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("Viewport of {width}x{height} tiles exceeds the {MAX_VIEWPORT_SPAN}x{MAX_VIEWPORT_SPAN} tile limit")]
    TooLarge { width: u64, height: u64 },
}

/// Rectangular block of tiles at one zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    zoom: u8,
    rows: RangeInclusive<u32>,
    cols: RangeInclusive<u32>,
}

impl Viewport {
    /// Viewport covering `rows` x `cols` at `zoom`.
    ///
    /// Reversed ranges are normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if a corner lies outside the tile grid, or if either
    /// side spans more than [`MAX_VIEWPORT_SPAN`] tiles.
    pub fn new(
        zoom: u8,
        rows: RangeInclusive<u32>,
        cols: RangeInclusive<u32>,
    ) -> Result<Self, ViewportError> {
        let (row_min, row_max) = ordered(rows);
        let (col_min, col_max) = ordered(cols);
        TileCoord::new(row_min, col_min, zoom)?;
        TileCoord::new(row_max, col_max, zoom)?;
        Self::bounded(zoom, row_min..=row_max, col_min..=col_max)
    }

    /// Viewport of the tiles within `radius` of `center`, clamped to the grid.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::TooLarge`] if the clamped viewport spans more
    /// than [`MAX_VIEWPORT_SPAN`] tiles on either side.
    pub fn around(center: TileCoord, radius: u32) -> Result<Self, ViewportError> {
        let max = (TileCoord::grid_size(center.zoom) - 1) as u32;
        Self::bounded(
            center.zoom,
            center.row.saturating_sub(radius)..=center.row.saturating_add(radius).min(max),
            center.col.saturating_sub(radius)..=center.col.saturating_add(radius).min(max),
        )
    }

    fn bounded(
        zoom: u8,
        rows: RangeInclusive<u32>,
        cols: RangeInclusive<u32>,
    ) -> Result<Self, ViewportError> {
        let width = span(&cols);
        let height = span(&rows);
        if width > u64::from(MAX_VIEWPORT_SPAN) || height > u64::from(MAX_VIEWPORT_SPAN) {
            return Err(ViewportError::TooLarge { width, height });
        }
        Ok(Self { zoom, rows, cols })
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn rows(&self) -> &RangeInclusive<u32> {
        &self.rows
    }

    pub fn cols(&self) -> &RangeInclusive<u32> {
        &self.cols
    }

    /// Whether `tile` is shown by this viewport.
    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom && self.rows.contains(&tile.row) && self.cols.contains(&tile.col)
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.cols.end() - self.cols.start() + 1
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.rows.end() - self.rows.start() + 1
    }

    fn blank_canvas(&self) -> RgbaImage {
        RgbaImage::new(self.width() * TILE_SIZE, self.height() * TILE_SIZE)
    }
}

fn span(range: &RangeInclusive<u32>) -> u64 {
    u64::from(*range.end()) - u64::from(*range.start()) + 1
}

fn ordered(range: RangeInclusive<u32>) -> (u32, u32) {
    let (a, b) = range.into_inner();
    (a.min(b), a.max(b))
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "z{} rows {}..={} cols {}..={}",
            self.zoom,
            self.rows.start(),
            self.rows.end(),
            self.cols.start(),
            self.cols.end()
        )
    }
}

struct FrameState {
    viewport: Viewport,
    canvas: RgbaImage,
    drawn: HashSet<TileCoord>,
}

type RedrawCallback = Box<dyn Fn() + Send + Sync>;

/// Display surface that composites tiles into an in-memory canvas.
///
/// `draw` accepts a tile only while it lies inside the current viewport.
/// Moving the viewport clears the canvas.
pub struct FrameBuffer {
    state: Mutex<FrameState>,
    redraws: AtomicU64,
    on_redraw: Option<RedrawCallback>,
}

impl FrameBuffer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(FrameState {
                canvas: viewport.blank_canvas(),
                viewport,
                drawn: HashSet::new(),
            }),
            redraws: AtomicU64::new(0),
            on_redraw: None,
        }
    }

    /// Invoke `callback` on every redraw signal.
    pub fn with_redraw_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_redraw = Some(Box::new(callback));
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport.clone()
    }

    /// Move the view; tiles outside the new viewport will be rejected.
    pub fn set_viewport(&self, viewport: Viewport) {
        let mut state = self.state.lock();
        state.canvas = viewport.blank_canvas();
        state.viewport = viewport;
        state.drawn.clear();
    }

    /// Number of redraw signals received.
    pub fn redraw_count(&self) -> u64 {
        self.redraws.load(Ordering::Relaxed)
    }

    /// Number of distinct tiles composited since the last viewport change.
    pub fn drawn_count(&self) -> usize {
        self.state.lock().drawn.len()
    }

    pub fn is_drawn(&self, tile: &TileCoord) -> bool {
        self.state.lock().drawn.contains(tile)
    }

    /// Copy of the composited canvas.
    pub fn snapshot(&self) -> RgbaImage {
        self.state.lock().canvas.clone()
    }

    /// Write the composited canvas as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.snapshot().save_with_format(path, ImageFormat::Png)
    }
}

impl DisplaySurface for FrameBuffer {
    fn draw(&self, tile: &TileCoord, image: &TileImage) -> bool {
        let mut state = self.state.lock();
        if !state.viewport.contains(tile) {
            trace!(tile = %tile, viewport = %state.viewport, "Tile outside viewport");
            return false;
        }

        let x = i64::from(tile.col - state.viewport.cols.start()) * i64::from(TILE_SIZE);
        let y = i64::from(tile.row - state.viewport.rows.start()) * i64::from(TILE_SIZE);
        imageops::replace(&mut state.canvas, image.as_rgba(), x, y);
        state.drawn.insert(*tile);
        true
    }

    fn notify_changed(&self) {
        self.redraws.fetch_add(1, Ordering::Relaxed);
        if let Some(callback) = &self.on_redraw {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn coord(row: u32, col: u32, zoom: u8) -> TileCoord {
        TileCoord::new(row, col, zoom).unwrap()
    }

    fn solid(color: [u8; 4]) -> TileImage {
        let mut image = TileImage::new();
        image.fill(Rgba(color));
        image
    }

    #[test]
    fn test_viewport_around_clamps_to_grid() {
        let viewport = Viewport::around(coord(0, 1, 2), 1).unwrap();
        assert_eq!(viewport.rows(), &(0..=1));
        assert_eq!(viewport.cols(), &(0..=2));
        assert_eq!(viewport.width(), 3);
        assert_eq!(viewport.height(), 2);
    }

    #[test]
    fn test_viewport_new_normalizes_and_validates() {
        let viewport = Viewport::new(3, 5..=2, 1..=1).unwrap();
        assert_eq!(viewport.rows(), &(2..=5));
        assert!(matches!(
            Viewport::new(1, 0..=2, 0..=0),
            Err(ViewportError::Coord(_))
        ));
    }

    #[test]
    fn test_viewport_rejects_oversized_canvas() {
        let center = coord(500_000, 500_000, 20);
        assert!(matches!(
            Viewport::around(center, 100_000),
            Err(ViewportError::TooLarge {
                width: 200_001,
                height: 200_001
            })
        ));
        assert!(matches!(
            Viewport::new(20, 0..=0, 0..=MAX_VIEWPORT_SPAN),
            Err(ViewportError::TooLarge { width: 17, height: 1 })
        ));
    }

    #[test]
    fn test_viewport_at_span_limit() {
        let viewport = Viewport::new(10, 0..=MAX_VIEWPORT_SPAN - 1, 4..=4).unwrap();
        assert_eq!(viewport.height(), MAX_VIEWPORT_SPAN);

        // Clamping at the grid edge keeps a large radius within the limit
        let small_grid = Viewport::around(coord(1, 1, 2), u32::MAX).unwrap();
        assert_eq!(small_grid.width(), 4);
        assert_eq!(small_grid.height(), 4);
    }

    #[test]
    fn test_viewport_contains() {
        let viewport = Viewport::new(4, 2..=3, 5..=6).unwrap();
        assert!(viewport.contains(&coord(2, 5, 4)));
        assert!(viewport.contains(&coord(3, 6, 4)));
        assert!(!viewport.contains(&coord(4, 6, 4)));
        assert!(!viewport.contains(&coord(2, 5, 5)));
    }

    #[test]
    fn test_draw_inside_viewport() {
        let frame = FrameBuffer::new(Viewport::new(2, 1..=2, 1..=2).unwrap());
        assert!(frame.draw(&coord(2, 1, 2), &solid([255, 0, 0, 255])));

        let canvas = frame.snapshot();
        assert_eq!(canvas.dimensions(), (2 * TILE_SIZE, 2 * TILE_SIZE));
        assert_eq!(*canvas.get_pixel(5, TILE_SIZE + 5), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(TILE_SIZE + 5, 5), Rgba([0, 0, 0, 0]));
        assert!(frame.is_drawn(&coord(2, 1, 2)));
    }

    #[test]
    fn test_draw_outside_viewport_rejected() {
        let frame = FrameBuffer::new(Viewport::new(2, 0..=0, 0..=0).unwrap());
        assert!(!frame.draw(&coord(3, 3, 2), &TileImage::new()));
        assert_eq!(frame.drawn_count(), 0);
    }

    #[test]
    fn test_set_viewport_clears_canvas() {
        let frame = FrameBuffer::new(Viewport::new(2, 0..=0, 0..=0).unwrap());
        frame.draw(&coord(0, 0, 2), &solid([1, 2, 3, 255]));
        frame.set_viewport(Viewport::new(2, 3..=3, 3..=3).unwrap());

        assert_eq!(frame.drawn_count(), 0);
        assert!(!frame.draw(&coord(0, 0, 2), &TileImage::new()));
        assert!(frame.draw(&coord(3, 3, 2), &TileImage::new()));
    }

    #[test]
    fn test_notify_changed_counts_and_calls_back() {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);
        let frame = FrameBuffer::new(Viewport::around(coord(0, 0, 0), 0).unwrap())
            .with_redraw_callback(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        frame.notify_changed();
        frame.notify_changed();

        assert_eq!(frame.redraw_count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_save_png() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("frame.png");
        let frame = FrameBuffer::new(Viewport::around(coord(0, 0, 0), 0).unwrap());
        frame.draw(&coord(0, 0, 0), &solid([9, 9, 9, 255]));

        frame.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(*loaded.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
    }
}
