//! Tile identity: coordinates, render requests and their fingerprints.

mod coord;
mod fingerprint;
mod request;

pub use coord::{CoordError, TileCoord, MAX_ZOOM, MIN_ZOOM};
pub use fingerprint::{Fingerprint, FingerprintParseError, FINGERPRINT_HEX_LEN};
pub use request::{
    DebugSettings, JobParameters, RenderRequest, DEFAULT_TEXT_SCALE, DEFAULT_THEME,
};
