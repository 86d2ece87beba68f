//! Render requests and their rendering parameters.

use super::coord::TileCoord;
use super::fingerprint::Fingerprint;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Default render theme name.
pub const DEFAULT_THEME: &str = "osmarender";

/// Default text scale factor.
pub const DEFAULT_TEXT_SCALE: f32 = 1.0;

/// Rendering parameters that change the produced image.
#[derive(Debug, Clone)]
pub struct JobParameters {
    /// Name of the render theme
    pub theme: String,
    /// Scale factor applied to labels
    pub text_scale: f32,
}

impl JobParameters {
    pub fn new(theme: impl Into<String>, text_scale: f32) -> Self {
        Self {
            theme: theme.into(),
            text_scale,
        }
    }
}

impl Default for JobParameters {
    fn default() -> Self {
        Self::new(DEFAULT_THEME, DEFAULT_TEXT_SCALE)
    }
}

// Compared bitwise so that equality agrees with the fingerprint encoding.
impl PartialEq for JobParameters {
    fn eq(&self, other: &Self) -> bool {
        self.theme == other.theme && self.text_scale.to_bits() == other.text_scale.to_bits()
    }
}

impl Eq for JobParameters {}

/// Debug overlays drawn on top of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DebugSettings {
    /// Draw a one-pixel frame around the tile
    pub draw_tile_frames: bool,
    /// Draw a marker encoding the tile coordinates
    pub draw_tile_coordinates: bool,
    /// Highlight tiles that contain only water
    pub highlight_water_tiles: bool,
}

impl DebugSettings {
    fn bits(&self) -> u8 {
        (self.draw_tile_frames as u8)
            | (self.draw_tile_coordinates as u8) << 1
            | (self.highlight_water_tiles as u8) << 2
    }
}

/// A request to render one map tile.
///
/// Requests are immutable once built; the fingerprint is computed whenever a
/// field is set, so it always reflects the current contents.
///
/// # Example
///
/// ```
/// use tileforge::tile::{DebugSettings, JobParameters, RenderRequest, TileCoord};
///
/// let tile = TileCoord::new(2741, 4394, 13).unwrap();
/// let request = RenderRequest::new(tile)
///     .with_parameters(JobParameters::new("night", 1.5))
///     .with_debug_settings(DebugSettings { draw_tile_frames: true, ..Default::default() });
///
/// assert_eq!(request.tile(), &tile);
/// assert_ne!(request.fingerprint(), RenderRequest::new(tile).fingerprint());
/// ```
#[derive(Debug, Clone)]
pub struct RenderRequest {
    tile: TileCoord,
    map_file: Option<PathBuf>,
    parameters: JobParameters,
    debug: DebugSettings,
    fingerprint: Fingerprint,
}

impl RenderRequest {
    /// Creates a request for `tile` with default parameters and no map file.
    pub fn new(tile: TileCoord) -> Self {
        let mut request = Self {
            tile,
            map_file: None,
            parameters: JobParameters::default(),
            debug: DebugSettings::default(),
            fingerprint: Fingerprint::from_raw(0),
        };
        request.fingerprint = request.compute_fingerprint();
        request
    }

    /// Sets the map file the tile is rendered from.
    pub fn with_map_file(mut self, map_file: impl Into<PathBuf>) -> Self {
        self.map_file = Some(map_file.into());
        self.fingerprint = self.compute_fingerprint();
        self
    }

    /// Sets the rendering parameters.
    pub fn with_parameters(mut self, parameters: JobParameters) -> Self {
        self.parameters = parameters;
        self.fingerprint = self.compute_fingerprint();
        self
    }

    /// Sets the debug overlays.
    pub fn with_debug_settings(mut self, debug: DebugSettings) -> Self {
        self.debug = debug;
        self.fingerprint = self.compute_fingerprint();
        self
    }

    pub fn tile(&self) -> &TileCoord {
        &self.tile
    }

    pub fn map_file(&self) -> Option<&Path> {
        self.map_file.as_deref()
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn debug_settings(&self) -> &DebugSettings {
        &self.debug
    }

    /// Cache key for this request.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Canonical encoding: every field length-prefixed or fixed-width, in a
    /// fixed order, so distinct requests never share an encoding.
    fn compute_fingerprint(&self) -> Fingerprint {
        let mut buf = Vec::with_capacity(64);
        buf.push(self.tile.zoom);
        buf.extend_from_slice(&self.tile.row.to_be_bytes());
        buf.extend_from_slice(&self.tile.col.to_be_bytes());

        match &self.map_file {
            Some(path) => {
                let path = path.to_string_lossy();
                buf.push(1);
                buf.extend_from_slice(&(path.len() as u64).to_be_bytes());
                buf.extend_from_slice(path.as_bytes());
            }
            None => buf.push(0),
        }

        buf.extend_from_slice(&(self.parameters.theme.len() as u64).to_be_bytes());
        buf.extend_from_slice(self.parameters.theme.as_bytes());
        buf.extend_from_slice(&self.parameters.text_scale.to_bits().to_be_bytes());
        buf.push(self.debug.bits());

        Fingerprint::digest(&buf)
    }
}

impl PartialEq for RenderRequest {
    fn eq(&self, other: &Self) -> bool {
        self.tile == other.tile
            && self.map_file == other.map_file
            && self.parameters == other.parameters
            && self.debug == other.debug
    }
}

impl Eq for RenderRequest {}

impl Hash for RenderRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}
