//! Display surface abstraction.
//!
//! A [`DisplaySurface`] composites rendered tiles into the live view. The
//! worker offers every freshly rendered tile to [`DisplaySurface::draw`];
//! the answer decides whether the tile goes into the fast cache.

mod frame_buffer;

pub use frame_buffer::{FrameBuffer, Viewport, ViewportError, MAX_VIEWPORT_SPAN};

use crate::raster::TileImage;
use crate::tile::TileCoord;

/// Capability that shows tiles to the user.
pub trait DisplaySurface: Send + Sync {
    /// Composite `image` at `tile`.
    ///
    /// Returns `false` if the tile is no longer within the displayed region.
    /// The borrow of `image` ends when this returns.
    fn draw(&self, tile: &TileCoord, image: &TileImage) -> bool;

    /// Fire-and-forget request to redraw the view.
    fn notify_changed(&self);
}
