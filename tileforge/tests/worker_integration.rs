//! Integration tests for the tile worker.
//!
//! These tests verify the complete worker workflow including:
//! - Cache lookups before rendering (fast tier, then durable tier)
//! - Asymmetric cache writes depending on display acceptance
//! - Render failures and cancellation after a render
//! - Pause, resume and stop of running workers
//! - No concurrent duplicate renders across a worker pool

use image::Rgba;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tileforge::cache::{
    CacheConfig, CacheError, CacheTier, DiskCacheConfig, DiskTileCache, MemoryTileCache,
    NoOpTileCache, TileCache, TileCacheStats, TileCaches,
};
use tileforge::display::DisplaySurface;
use tileforge::queue::JobQueue;
use tileforge::raster::TileImage;
use tileforge::render::{RenderError, Renderer};
use tileforge::tile::{Fingerprint, RenderRequest, TileCoord};
use tileforge::worker::{
    JobOutcome, TileWorker, WorkerContext, WorkerControl, WorkerPool, WorkerPoolConfig,
    WorkerState,
};

// =============================================================================
// Test Helpers
// =============================================================================

type RenderHook = Box<dyn Fn() + Send + Sync>;

/// Renderer that fills the buffer with a fixed colour, or fails.
struct ScriptedRenderer {
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    active: Mutex<HashSet<Fingerprint>>,
    overlapped: AtomicBool,
    on_render: Option<RenderHook>,
}

impl ScriptedRenderer {
    fn ok() -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: Mutex::new(HashSet::new()),
            overlapped: AtomicBool::new(false),
            on_render: None,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_hook<F: Fn() + Send + Sync + 'static>(mut self, hook: F) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renderer for ScriptedRenderer {
    fn execute(&self, request: &RenderRequest, buffer: &mut TileImage) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fingerprint = request.fingerprint();
        if !self.active.lock().insert(fingerprint) {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some(hook) = &self.on_render {
            hook();
        }

        self.active.lock().remove(&fingerprint);
        if self.fail {
            return Err(RenderError::Failed("scripted failure".to_string()));
        }
        buffer.fill(Rgba([200, 100, 50, 255]));
        Ok(())
    }
}

/// Display that accepts or rejects every tile and counts redraw signals.
struct RecordingDisplay {
    accept: bool,
    draws: AtomicUsize,
    redraws: AtomicUsize,
}

impl RecordingDisplay {
    fn new(accept: bool) -> Self {
        Self {
            accept,
            draws: AtomicUsize::new(0),
            redraws: AtomicUsize::new(0),
        }
    }

    fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }
}

impl DisplaySurface for RecordingDisplay {
    fn draw(&self, _tile: &TileCoord, _image: &TileImage) -> bool {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.accept
    }

    fn notify_changed(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }
}

/// Memory cache that counts writes.
struct RecordingCache {
    inner: MemoryTileCache,
    puts: AtomicUsize,
}

impl RecordingCache {
    fn new() -> Self {
        Self {
            inner: MemoryTileCache::new(64),
            puts: AtomicUsize::new(0),
        }
    }

    fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl TileCache for RecordingCache {
    fn contains_key(&self, key: &Fingerprint) -> bool {
        self.inner.contains_key(key)
    }

    fn get(&self, key: &Fingerprint) -> Option<Arc<TileImage>> {
        self.inner.get(key)
    }

    fn put(&self, key: Fingerprint, image: &TileImage) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, image)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn stats(&self) -> TileCacheStats {
        self.inner.stats()
    }
}

/// Cache whose writes always fail.
struct BrokenCache;

impl TileCache for BrokenCache {
    fn contains_key(&self, _key: &Fingerprint) -> bool {
        false
    }

    fn get(&self, _key: &Fingerprint) -> Option<Arc<TileImage>> {
        None
    }

    fn put(&self, _key: Fingerprint, _image: &TileImage) -> Result<(), CacheError> {
        Err(CacheError::Io(std::io::Error::other("disk full")))
    }

    fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        1
    }

    fn stats(&self) -> TileCacheStats {
        TileCacheStats::new()
    }
}

struct Harness {
    worker: TileWorker,
    control: WorkerControl,
    queue: Arc<JobQueue>,
    renderer: Arc<ScriptedRenderer>,
    display: Arc<RecordingDisplay>,
    fast: Arc<RecordingCache>,
    durable: Arc<RecordingCache>,
}

fn harness(renderer: ScriptedRenderer, accept: bool) -> Harness {
    let queue = Arc::new(JobQueue::new());
    let renderer = Arc::new(renderer);
    let display = Arc::new(RecordingDisplay::new(accept));
    let fast = Arc::new(RecordingCache::new());
    let durable = Arc::new(RecordingCache::new());
    let control = WorkerControl::new();

    let context = WorkerContext::new(
        Arc::clone(&queue),
        TileCaches::new(fast.clone(), durable.clone()),
        renderer.clone(),
        display.clone(),
    );
    let worker = TileWorker::new(0, context, control.clone()).with_idle_wait(Duration::from_millis(10));

    Harness {
        worker,
        control,
        queue,
        renderer,
        display,
        fast,
        durable,
    }
}

fn request(row: u32, col: u32) -> RenderRequest {
    RenderRequest::new(TileCoord::new(row, col, 5).unwrap())
}

fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_render_accepted_fills_both_tiers() {
    let mut h = harness(ScriptedRenderer::ok(), true);
    let r1 = request(1, 1);

    let outcome = h.worker.process(&r1);

    assert_eq!(outcome, JobOutcome::Rendered { accepted: true });
    assert!(h.fast.contains_key(&r1.fingerprint()));
    assert!(h.durable.contains_key(&r1.fingerprint()));
    assert_eq!(h.display.redraws(), 1);
}

#[test]
fn test_durable_hit_is_silent() {
    let mut h = harness(ScriptedRenderer::ok(), true);
    let r2 = request(2, 2);
    h.durable.put(r2.fingerprint(), &TileImage::new()).unwrap();

    let outcome = h.worker.process(&r2);

    assert_eq!(outcome, JobOutcome::CacheHit(CacheTier::Durable));
    assert_eq!(h.renderer.calls(), 0);
    assert_eq!(h.fast.puts(), 0);
    assert_eq!(h.durable.puts(), 1);
    assert_eq!(h.display.draws(), 0);
    assert_eq!(h.display.redraws(), 0);
}

#[test]
fn test_fast_hit_is_silent() {
    let mut h = harness(ScriptedRenderer::ok(), true);
    let r = request(2, 3);
    h.fast.put(r.fingerprint(), &TileImage::new()).unwrap();

    assert_eq!(h.worker.process(&r), JobOutcome::CacheHit(CacheTier::Fast));
    assert_eq!(h.renderer.calls(), 0);
    assert_eq!(h.durable.puts(), 0);
    assert_eq!(h.display.redraws(), 0);
}

#[test]
fn test_render_failure_touches_nothing() {
    let mut h = harness(ScriptedRenderer::failing(), true);
    let r3 = request(3, 3);

    let outcome = h.worker.process(&r3);

    assert_eq!(outcome, JobOutcome::RenderFailed);
    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.fast.puts(), 0);
    assert_eq!(h.durable.puts(), 0);
    assert_eq!(h.display.draws(), 0);
    assert_eq!(h.display.redraws(), 0);
}

#[test]
fn test_render_rejected_fills_durable_only() {
    let mut h = harness(ScriptedRenderer::ok(), false);
    let r4 = request(4, 4);

    let outcome = h.worker.process(&r4);

    assert_eq!(outcome, JobOutcome::Rendered { accepted: false });
    assert!(!h.fast.contains_key(&r4.fingerprint()));
    assert_eq!(h.fast.puts(), 0);
    assert!(h.durable.contains_key(&r4.fingerprint()));
    assert_eq!(h.display.redraws(), 1);
}

#[test]
fn test_cached_tile_matches_rendered_pixels() {
    let mut h = harness(ScriptedRenderer::ok(), true);
    let r = request(5, 5);
    h.worker.process(&r);

    let cached = h.durable.get(&r.fingerprint()).unwrap();
    assert_eq!(cached.pixel(17, 42), Rgba([200, 100, 50, 255]));
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_pause_during_render_discards_result() {
    let control = WorkerControl::new();
    let pauser = control.clone();
    let renderer = ScriptedRenderer::ok().with_hook(move || pauser.pause());
    let mut h = harness(renderer, true);
    // Swap in a worker that shares the hook's control
    let context = WorkerContext::new(
        Arc::clone(&h.queue),
        TileCaches::new(h.fast.clone(), h.durable.clone()),
        h.renderer.clone(),
        h.display.clone(),
    );
    h.worker = TileWorker::new(1, context, control.clone());

    let outcome = h.worker.process(&request(6, 6));

    assert_eq!(outcome, JobOutcome::Cancelled);
    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.fast.puts(), 0);
    assert_eq!(h.durable.puts(), 0);
    assert_eq!(h.display.draws(), 0);
    assert_eq!(h.display.redraws(), 0);
}

#[test]
fn test_stop_during_render_discards_result() {
    let control = WorkerControl::new();
    let stopper = control.clone();
    let renderer = Arc::new(ScriptedRenderer::ok().with_hook(move || stopper.stop()));
    let fast = Arc::new(RecordingCache::new());
    let durable = Arc::new(RecordingCache::new());
    let display = Arc::new(RecordingDisplay::new(true));
    let queue = Arc::new(JobQueue::new());
    queue.push(request(7, 7));

    let context = WorkerContext::new(
        Arc::clone(&queue),
        TileCaches::new(fast.clone(), durable.clone()),
        renderer.clone(),
        display.clone(),
    );
    let worker = TileWorker::new(0, context, control).with_idle_wait(Duration::from_millis(10));
    let monitor = worker.monitor();

    let handle = thread::spawn(move || worker.run());
    handle.join().unwrap();

    assert_eq!(monitor.state(), WorkerState::Stopped);
    assert_eq!(monitor.stats().cancelled, 1);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(fast.puts() + durable.puts(), 0);
    assert_eq!(display.redraws(), 0);
}

#[test]
fn test_cache_write_failure_does_not_abort() {
    let queue = Arc::new(JobQueue::new());
    let display = Arc::new(RecordingDisplay::new(true));
    let context = WorkerContext::new(
        Arc::clone(&queue),
        TileCaches::new(Arc::new(BrokenCache), Arc::new(BrokenCache)),
        Arc::new(ScriptedRenderer::ok()),
        display.clone(),
    );
    let mut worker = TileWorker::new(0, context, WorkerControl::new());

    assert_eq!(
        worker.process(&request(8, 8)),
        JobOutcome::Rendered { accepted: true }
    );
    assert_eq!(worker.process(&request(8, 9)), JobOutcome::Rendered { accepted: true });

    let stats = worker.monitor().stats();
    assert_eq!(stats.cache_write_failures, 4);
    assert_eq!(display.redraws(), 2);
}

// =============================================================================
// Running workers
// =============================================================================

#[test]
fn test_running_worker_drains_queue() {
    let h = harness(ScriptedRenderer::ok(), true);
    for col in 0..5 {
        h.queue.push(request(0, col));
    }
    let monitor = h.worker.monitor();
    let control = h.control.clone();
    let worker = h.worker;
    let handle = thread::spawn(move || worker.run());

    assert!(wait_until(|| monitor.stats().processed == 5));
    assert!(h.queue.is_empty());
    assert_eq!(h.durable.len(), 5);

    control.stop();
    h.queue.wake_all();
    handle.join().unwrap();
    assert_eq!(monitor.state(), WorkerState::Stopped);
}

#[test]
fn test_pause_resume_running_worker() {
    let h = harness(ScriptedRenderer::ok(), true);
    let monitor = h.worker.monitor();
    let control = h.control.clone();
    let worker = h.worker;
    let handle = thread::spawn(move || worker.run());

    control.pause();
    h.queue.push(request(1, 0));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(monitor.stats().processed, 0);
    assert_eq!(h.queue.len(), 1);

    control.resume();
    assert!(wait_until(|| monitor.stats().processed == 1));
    assert_eq!(h.renderer.calls(), 1);

    control.stop();
    handle.join().unwrap();
}

#[test]
fn test_stop_ends_worker_blocked_on_empty_queue() {
    let h = harness(ScriptedRenderer::ok(), true);
    let control = h.control.clone();
    let worker = h.worker;
    let handle = thread::spawn(move || worker.run());
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    control.stop();
    h.queue.wake_all();
    handle.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_pool_never_renders_same_fingerprint_concurrently() {
    let renderer = Arc::new(ScriptedRenderer::ok().with_delay(Duration::from_millis(15)));
    let queue = Arc::new(JobQueue::new());
    let context = WorkerContext::new(
        Arc::clone(&queue),
        TileCaches::new(Arc::new(NoOpTileCache), Arc::new(NoOpTileCache)),
        renderer.clone(),
        Arc::new(RecordingDisplay::new(true)),
    );
    let mut pool = WorkerPool::start(
        &WorkerPoolConfig::default()
            .with_workers(4)
            .with_idle_wait(Duration::from_millis(5)),
        context,
    )
    .unwrap();

    let hot = request(9, 9);
    let deadline = Instant::now() + Duration::from_millis(400);
    while Instant::now() < deadline {
        queue.push(hot.clone());
        thread::sleep(Duration::from_millis(1));
    }
    assert!(wait_until(|| queue.is_empty() && pool.is_idle()));
    pool.shutdown();

    let stats = pool.stats();
    assert!(!renderer.overlapped.load(Ordering::SeqCst));
    assert!(stats.rendered() > 0);
    assert_eq!(
        stats.rendered() + stats.cancelled + stats.already_in_flight,
        stats.processed
    );
    assert_eq!(renderer.calls() as u64, stats.rendered() + stats.cancelled);
    assert!(pool.states().iter().all(|s| *s == WorkerState::Stopped));
}

#[test]
fn test_pool_with_disk_cache_persists_tiles() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new()
        .with_memory_capacity(4)
        .with_disk_capacity(64)
        .with_cache_dir(temp.path().to_path_buf());
    let queue = Arc::new(JobQueue::new());
    let context = WorkerContext::new(
        Arc::clone(&queue),
        TileCaches::open(&config).unwrap(),
        Arc::new(ScriptedRenderer::ok()),
        Arc::new(RecordingDisplay::new(false)),
    );
    let mut pool = WorkerPool::start(&WorkerPoolConfig::default().with_workers(2), context).unwrap();

    let requests: Vec<_> = (0..6).map(|col| request(3, col)).collect();
    for r in &requests {
        queue.push(r.clone());
    }
    assert!(wait_until(|| pool.stats().processed == 6));
    pool.shutdown();
    drop(pool);

    let reopened = DiskTileCache::open(&DiskCacheConfig {
        directory: temp.path().to_path_buf(),
        capacity: 64,
        persistent: true,
    })
    .unwrap();
    for r in &requests {
        assert!(reopened.contains_key(&r.fingerprint()));
    }
}
