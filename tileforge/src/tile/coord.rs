//! Tile coordinate definitions

use std::fmt;
use thiserror::Error;

/// Lowest supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest supported zoom level.
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinates in the Slippy Map tiling scheme.
///
/// Row 0 is the northernmost row, column 0 the westernmost column. At zoom
/// level `z` there are `2^z` rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// X coordinate (east-west), 0 at west
    pub col: u32,
    /// Zoom level
    pub zoom: u8,
}

/// Errors from tile coordinate validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Zoom level outside `MIN_ZOOM..=MAX_ZOOM`
    #[error("Invalid zoom level: {0} (must be between {MIN_ZOOM} and {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Row or column outside the tile grid for the zoom level
    #[error("Tile {row}/{col} is outside the {size}x{size} grid at zoom {zoom}")]
    OutOfRange {
        row: u32,
        col: u32,
        zoom: u8,
        size: u64,
    },
}

impl TileCoord {
    /// Creates a validated tile coordinate.
    pub fn new(row: u32, col: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let size = Self::grid_size(zoom);
        if u64::from(row) >= size || u64::from(col) >= size {
            return Err(CoordError::OutOfRange {
                row,
                col,
                zoom,
                size,
            });
        }
        Ok(Self { row, col, zoom })
    }

    /// Number of rows (and columns) in the tile grid at `zoom`.
    #[inline]
    pub fn grid_size(zoom: u8) -> u64 {
        1u64 << zoom
    }

    /// Euclidean distance to `other`, measured in tiles at this tile's zoom.
    ///
    /// When the zoom levels differ, `other` is projected to this zoom first.
    pub fn distance_to(&self, other: &TileCoord) -> f64 {
        let (other_row, other_col) = other.center_at_zoom(self.zoom);
        let dr = (self.row as f64 + 0.5) - other_row;
        let dc = (self.col as f64 + 0.5) - other_col;
        (dr * dr + dc * dc).sqrt()
    }

    /// Centre of this tile expressed in fractional tile units at `zoom`.
    fn center_at_zoom(&self, zoom: u8) -> (f64, f64) {
        let scale = 2f64.powi(i32::from(zoom) - i32::from(self.zoom));
        (
            (self.row as f64 + 0.5) * scale,
            (self.col as f64 + 0.5) * scale,
        )
    }

    /// Returns all valid tiles within `radius` rows/columns of this tile,
    /// including the tile itself, in row-major order.
    pub fn neighbourhood(&self, radius: u32) -> Vec<TileCoord> {
        let max = Self::grid_size(self.zoom) - 1;
        let row_start = self.row.saturating_sub(radius);
        let col_start = self.col.saturating_sub(radius);
        let row_end = (u64::from(self.row) + u64::from(radius)).min(max) as u32;
        let col_end = (u64::from(self.col) + u64::from(radius)).min(max) as u32;

        let mut tiles = Vec::new();
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                tiles.push(TileCoord {
                    row,
                    col,
                    zoom: self.zoom,
                });
            }
        }
        tiles
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.row, self.col)
    }
}
