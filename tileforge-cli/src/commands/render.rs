//! Render command: renders the tiles around a centre tile.

use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tileforge::cache::CacheConfig;
use tileforge::config::ConfigFile;
use tileforge::display::{FrameBuffer, Viewport, MAX_VIEWPORT_SPAN};
use tileforge::logging::init_logging;
use tileforge::render::DebugRenderer;
use tileforge::service::{TileSystem, TileSystemConfig};
use tileforge::tile::{DebugSettings, JobParameters, RenderRequest, TileCoord};
use tileforge::worker::{WorkerPoolConfig, WorkerStats};
use tracing::info;

use super::load_config;
use crate::error::CliError;

/// Largest `--radius`: a block of 33x33 tiles.
pub const MAX_RADIUS: u32 = 16;

/// Largest `--view-radius` whose viewport fits in the frame buffer.
pub const MAX_VIEW_RADIUS: u32 = (MAX_VIEWPORT_SPAN - 1) / 2;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Zoom level of the centre tile
    #[arg(long)]
    pub zoom: u8,

    /// Row of the centre tile
    #[arg(long)]
    pub row: u32,

    /// Column of the centre tile
    #[arg(long)]
    pub col: u32,

    /// Render every tile within this many rows/columns of the centre
    #[arg(
        long,
        default_value = "2",
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_RADIUS))
    )]
    pub radius: u32,

    /// Display every tile within this many rows/columns of the centre
    #[arg(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_VIEW_RADIUS))
    )]
    pub view_radius: u32,

    /// Number of worker threads (overrides config)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Theme name (overrides config)
    #[arg(long)]
    pub theme: Option<String>,

    /// Draw a frame around every tile
    #[arg(long)]
    pub frames: bool,

    /// Draw a coordinate marker on every tile
    #[arg(long)]
    pub coordinates: bool,

    /// Simulated render cost per tile in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Give up if rendering takes longer than this many seconds
    #[arg(long, default_value = "300")]
    pub timeout: u64,

    /// Save the displayed frame as a PNG file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Run the render command.
pub fn run(args: RenderArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let _logging_guard =
        init_logging(&config.logging.file).map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let center = TileCoord::new(args.row, args.col, args.zoom)?;
    let system_config = system_config(&config, args.workers);
    let requests = build_requests(&config, &args, center);

    let display = Arc::new(FrameBuffer::new(Viewport::around(center, args.view_radius)?));
    let renderer =
        Arc::new(DebugRenderer::new().with_delay(Duration::from_millis(args.delay_ms)));
    let system = TileSystem::start(&system_config, renderer, display.clone())?;

    info!(
        center = %center,
        tiles = requests.len(),
        workers = system_config.workers.workers,
        "Rendering tiles"
    );

    let started = Instant::now();
    system.schedule(center);
    let queued = system.submit_all(requests);
    let timeout = Duration::from_secs(args.timeout);
    let finished = system.wait_idle(timeout);
    let stats = system.shutdown();

    if !finished {
        return Err(CliError::Timeout(timeout));
    }

    print_summary(queued, &stats, started.elapsed(), display.drawn_count());

    if let Some(path) = &args.output {
        display.save_png(path).map_err(|e| CliError::FileWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        println!("Saved frame to {}", path.display());
    }

    Ok(())
}

fn system_config(config: &ConfigFile, workers: Option<usize>) -> TileSystemConfig {
    let mut pool = WorkerPoolConfig::from(&config.workers);
    if let Some(workers) = workers {
        pool = pool.with_workers(workers);
    }
    TileSystemConfig {
        cache: CacheConfig::from(&config.cache),
        workers: pool,
    }
}

fn build_requests(config: &ConfigFile, args: &RenderArgs, center: TileCoord) -> Vec<RenderRequest> {
    let mut parameters = JobParameters::from(&config.render);
    if let Some(theme) = &args.theme {
        parameters.theme = theme.clone();
    }
    let debug = DebugSettings {
        draw_tile_frames: args.frames,
        draw_tile_coordinates: args.coordinates,
        highlight_water_tiles: false,
    };

    center
        .neighbourhood(args.radius)
        .into_iter()
        .map(|tile| {
            RenderRequest::new(tile)
                .with_parameters(parameters.clone())
                .with_debug_settings(debug)
        })
        .collect()
}

fn print_summary(queued: usize, stats: &WorkerStats, elapsed: Duration, drawn: usize) {
    println!();
    println!("Rendered {} tile requests in {:.2}s", queued, elapsed.as_secs_f64());
    println!("  Rendered:          {}", stats.rendered());
    println!("    displayed:       {}", stats.accepted);
    println!("    off screen:      {}", stats.rejected);
    println!("  Fast cache hits:   {}", stats.fast_hits);
    println!("  Durable hits:      {}", stats.durable_hits);
    println!("  Already in flight: {}", stats.already_in_flight);
    println!("  Render failures:   {}", stats.render_failures);
    println!("  Cancelled:         {}", stats.cancelled);
    if stats.cache_write_failures > 0 {
        println!("  Cache write failures: {}", stats.cache_write_failures);
    }
    println!("  Tiles on screen:   {}", drawn);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(radius: u32) -> RenderArgs {
        RenderArgs {
            zoom: 3,
            row: 0,
            col: 0,
            radius,
            view_radius: 1,
            workers: None,
            theme: Some("night".to_string()),
            frames: true,
            coordinates: false,
            delay_ms: 0,
            timeout: 10,
            output: None,
        }
    }

    #[test]
    fn test_build_requests_clamps_to_grid() {
        let center = TileCoord::new(0, 0, 3).unwrap();
        let requests = build_requests(&ConfigFile::default(), &args(1), center);

        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.parameters().theme == "night"));
        assert!(requests.iter().all(|r| r.debug_settings().draw_tile_frames));
    }

    #[test]
    fn test_largest_view_fits_frame_buffer() {
        let center = TileCoord::new(1000, 1000, 12).unwrap();
        let viewport = Viewport::around(center, MAX_VIEW_RADIUS).unwrap();
        assert!(viewport.width() <= MAX_VIEWPORT_SPAN);
        assert!(Viewport::around(center, MAX_VIEW_RADIUS + 1).is_err());
    }

    #[test]
    fn test_largest_radius_request_count() {
        let center = TileCoord::new(1000, 1000, 12).unwrap();
        let requests = build_requests(&ConfigFile::default(), &args(MAX_RADIUS), center);
        let side = 2 * MAX_RADIUS as usize + 1;
        assert_eq!(requests.len(), side * side);
    }

    #[test]
    fn test_system_config_worker_override() {
        let config = ConfigFile::default();
        assert_eq!(system_config(&config, None).workers.workers, config.workers.count);
        assert_eq!(system_config(&config, Some(7)).workers.workers, 7);
    }
}
