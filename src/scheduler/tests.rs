// src/scheduler/tests.rs

use super::*;
use crate::color::Rgba;
use crate::probe::ProbeParams;
use crate::raster::Rect;
use crate::surface::mock::{RecordingSurface, SurfaceCall};
use crate::transform::{Affine, Point};
use std::time::Duration;
use test_log::test;

fn small_params() -> Params {
    let mut params = Params::default();
    params.probe = ProbeParams {
        num_elements: 8,
        ..ProbeParams::default()
    };
    params.simulation.time = 5e-6;
    params
}

fn config(width: u32, height: u32, chunk_width: u32, chunk_height: u32) -> Config {
    let mut config = Config::default();
    config.raster.width = width;
    config.raster.height = height;
    config.raster.pixels_per_meter = 1024.0;
    config.scheduler.chunk_width = chunk_width;
    config.scheduler.chunk_height = chunk_height;
    config.scheduler.chunks_per_tick = 1;
    config.scheduler.program = ProgramKind::Pressure;
    config
}

fn drain<S: DisplaySurface>(scheduler: &mut ChunkScheduler, surface: &mut S, now: Instant) {
    for _ in 0..scheduler.queue().len() * 2 {
        if scheduler.update(surface, now).unwrap().pending == 0 {
            break;
        }
    }
}

/// The whole raster rendered in one dispatch, for comparison.
fn reference_frame(config: &Config, params: &Params) -> Raster {
    let model = FieldModel::new(params, &config.limits).unwrap();
    let viewport = config.viewport(params).unwrap();
    let program = FieldProgram::new(&model, &viewport, config.scheduler.program);
    Dispatcher::Serial.execute(&program, Rect::new(0, 0, config.raster.width, config.raster.height))
}

#[test]
fn two_chunks_render_in_two_updates() {
    let config = config(512, 100, 256, 100);
    let params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(512, 100);
    let now = Instant::now();

    assert_eq!(scheduler.queue().len(), 2);
    let first = scheduler.update(&mut surface, now).unwrap();
    assert_eq!((first.rendered, first.pending), (1, 1));
    let second = scheduler.update(&mut surface, now).unwrap();
    assert_eq!((second.rendered, second.pending), (1, 0));

    assert_eq!(scheduler.queue().unprocessed_len(), 0);
    assert_eq!(
        surface.blits(),
        vec![Rect::new(0, 0, 256, 100), Rect::new(256, 0, 256, 100)]
    );

    let calls_before = surface.calls().len();
    let third = scheduler.update(&mut surface, now).unwrap();
    assert_eq!(third, UpdateReport::default());
    assert_eq!(surface.calls().len(), calls_before);
}

#[test]
fn chunked_render_matches_single_pass() {
    let config = config(40, 30, 16, 16);
    let params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(40, 30);
    drain(&mut scheduler, &mut surface, Instant::now());

    let expected = reference_frame(&config, &params);
    assert_eq!(surface.raster(), &expected);
    assert_eq!(scheduler.displayed(), &expected);
    assert_eq!(scheduler.stats().chunks_rendered, 6);
}

#[test]
fn each_chunk_is_cleared_before_it_is_blitted() {
    let config = config(32, 16, 16, 16);
    let mut scheduler = ChunkScheduler::new(&config, &small_params()).unwrap();
    let mut surface = RecordingSurface::new(32, 16);
    scheduler.update(&mut surface, Instant::now()).unwrap();
    let rect = Rect::new(0, 0, 16, 16);
    assert_eq!(
        surface.calls(),
        &[SurfaceCall::Clear { rect }, SurfaceCall::Blit { rect }]
    );
}

#[test]
fn invalidate_then_stop_leaves_everything_processed() {
    let config = config(64, 64, 16, 16);
    let mut scheduler = ChunkScheduler::new(&config, &small_params()).unwrap();
    let mut surface = RecordingSurface::new(64, 64);
    let now = Instant::now();
    scheduler.update(&mut surface, now).unwrap();
    scheduler.update(&mut surface, now).unwrap();

    scheduler.invalidate_all();
    scheduler.stop_processing();

    let queue = scheduler.queue();
    assert_eq!(queue.unprocessed_len(), 0);
    assert!((0..queue.len()).all(|id| queue.state(id) == Some(ChunkState::Processed)));
    assert!(queue.is_consistent());

    surface.clear_calls();
    let report = scheduler.update(&mut surface, now).unwrap();
    assert_eq!(report.rendered, 0);
    assert!(surface.calls().is_empty());
}

#[test]
fn burst_of_debounced_resets_fires_once() {
    let config = config(32, 32, 16, 16);
    let mut params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(32, 32);
    let t0 = Instant::now();

    // Ten slider updates over 45ms, with host ticks in between.
    for i in 0..10u64 {
        let now = t0 + Duration::from_millis(5 * i);
        params.simulation.time = 5e-6 + i as f64 * 1e-7;
        scheduler.debounced_reset(&params, now);
        let report = scheduler.update(&mut surface, now).unwrap();
        assert!(!report.reset);
        assert_eq!(report.rendered, 0);
    }
    assert_eq!(scheduler.generation(), 10);

    // Deadline is 200ms after the last call at 45ms.
    let quiet = scheduler.update(&mut surface, t0 + Duration::from_millis(200)).unwrap();
    assert!(!quiet.reset);
    assert!(scheduler.is_reset_pending());

    let fired = scheduler.update(&mut surface, t0 + Duration::from_millis(245)).unwrap();
    assert!(fired.reset);
    assert_eq!(fired.rendered, 1);

    drain(&mut scheduler, &mut surface, t0 + Duration::from_secs(1));
    assert_eq!(scheduler.stats().resets, 1);
    assert!(scheduler.is_idle());
    assert_eq!(surface.raster(), &reference_frame(&config, &params));
}

#[test]
fn immediate_reset_supersedes_pending_debounce() {
    let config = config(32, 32, 16, 16);
    let mut params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(32, 32);
    let t0 = Instant::now();

    params.simulation.gain = 6.0;
    scheduler.debounced_reset(&params, t0);
    let armed = scheduler.generation();
    scheduler.reset(&mut surface).unwrap();
    assert!(scheduler.generation() > armed);
    assert!(scheduler.is_reset_pending());

    let first = scheduler.update(&mut surface, t0).unwrap();
    assert_eq!(first.rendered, 1);

    // The debounce comes due but its generation is stale.
    let due = scheduler.update(&mut surface, t0 + Duration::from_millis(250)).unwrap();
    assert!(!due.reset);
    assert_eq!(due.rendered, 1);
    assert!(!scheduler.is_reset_pending());
    assert_eq!(scheduler.stats().resets, 1);

    drain(&mut scheduler, &mut surface, t0 + Duration::from_secs(1));
    assert!(scheduler.is_idle());
    assert_eq!(surface.raster(), &reference_frame(&config, &params));
}

#[test]
fn stale_chunks_are_discarded_until_reset_fires() {
    let config = config(32, 32, 16, 16);
    let mut params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(32, 32);
    let t0 = Instant::now();

    params.simulation.gain = 6.0;
    scheduler.debounced_reset(&params, t0);
    // Something else requeues work while the reset is still pending.
    scheduler.invalidate_all();
    assert_eq!(scheduler.queue().unprocessed_len(), 4);

    let report = scheduler.update(&mut surface, t0).unwrap();
    assert_eq!((report.rendered, report.discarded), (0, 1));
    assert!(surface.blits().is_empty());
    assert!(scheduler.queue().is_consistent());
}

#[test]
fn failed_reset_reports_the_configuration_error() {
    let config = config(32, 32, 16, 16);
    let mut params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(32, 32);
    let t0 = Instant::now();

    params.simulation.sound_speed = -1.0;
    scheduler.debounced_reset(&params, t0);
    let err = scheduler
        .update(&mut surface, t0 + Duration::from_millis(300))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidParameter { name: "simulation.sound_speed", .. })
    ));
}

#[test]
fn pan_shows_warped_preview_then_converges() {
    let config = config(64, 32, 16, 16);
    let mut params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(64, 32);
    let now = Instant::now();
    drain(&mut scheduler, &mut surface, now);
    let before = surface.raster().clone();

    // 16 pixels to the right in world space at 1024 px/m.
    params.camera = Affine::translation(16.0 / 1024.0, 0.0);
    let viewport = config.viewport(&params).unwrap();
    surface.clear_calls();
    scheduler.viewport_changed(viewport, &mut surface).unwrap();

    assert_eq!(
        surface.calls(),
        &[
            SurfaceCall::Clear { rect: Rect::new(0, 0, 64, 32) },
            SurfaceCall::Blit { rect: Rect::new(0, 0, 64, 32) },
        ]
    );
    let preview = surface.raster();
    for y in 0..32 {
        for x in 0..48 {
            assert_eq!(preview.get(x, y), before.get(x + 16, y), "({x}, {y})");
        }
        for x in 48..64 {
            assert_eq!(preview.get(x, y), Some(Rgba::TRANSPARENT));
        }
    }
    assert_eq!(scheduler.queue().unprocessed_len(), scheduler.queue().len());

    drain(&mut scheduler, &mut surface, now);
    assert_eq!(surface.raster(), &reference_frame(&config, &params));
    assert_eq!(scheduler.stats().resets, 0);
}

#[test]
fn zoom_preview_keeps_anchor_pixel() {
    let config = config(64, 64, 32, 32);
    let params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(64, 64);
    drain(&mut scheduler, &mut surface, Instant::now());
    let before = surface.raster().clone();

    let anchor = scheduler.viewport().to_world(Point::new(32.0, 32.0));
    let zoomed = scheduler.viewport().compose_pan_zoom(0.5, anchor).unwrap();
    scheduler.viewport_changed(zoomed, &mut surface).unwrap();
    // Camera scale 0.5 doubles on-screen size around raster (32, 32).
    assert_eq!(surface.raster().get(32, 32), before.get(32, 32));
    assert_eq!(surface.raster().get(33, 33), before.get(32, 32));
    assert_eq!(surface.raster().get(30, 30), before.get(31, 31));
}

#[test]
fn unchanged_viewport_is_a_no_op() {
    let config = config(32, 32, 16, 16);
    let params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(32, 32);
    drain(&mut scheduler, &mut surface, Instant::now());
    surface.clear_calls();
    let same = *scheduler.viewport();
    scheduler.viewport_changed(same, &mut surface).unwrap();
    assert!(surface.calls().is_empty());
    assert_eq!(scheduler.queue().unprocessed_len(), 0);
}

#[test]
fn partition_invariant_holds_across_operations() {
    let config = config(100, 70, 32, 32);
    let params = small_params();
    let mut scheduler = ChunkScheduler::new(&config, &params).unwrap();
    let mut surface = RecordingSurface::new(100, 70);
    let t0 = Instant::now();
    assert_eq!(scheduler.queue().len(), 12);

    for step in 0..40u64 {
        let now = t0 + Duration::from_millis(step * 30);
        match step % 7 {
            0 => scheduler.invalidate_all(),
            3 => scheduler.stop_processing(),
            5 => scheduler.debounced_reset(&params, now),
            _ => {
                scheduler.update(&mut surface, now).unwrap();
            }
        }
        let queue = scheduler.queue();
        assert!(queue.is_consistent(), "step {step}");
        assert_eq!(queue.unprocessed_len() + queue.processed_len(), queue.len());
    }
}
