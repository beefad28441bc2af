// src/main.rs

use anyhow::Context;
use beamsim::{
    color::Rgba,
    config::{Config, CONFIG},
    orchestrator::SimulationOrchestrator,
    raster::Raster,
    surface::MemorySurface,
};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Simulated interval between host ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Renders the transmit field of a linear array to a PNG.
#[derive(Parser, Debug)]
#[command(name = "beamsim", version)]
struct Args {
    /// JSON configuration file. Falls back to $BEAMSIM_CONFIG, then defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host ticks to run. Defaults to enough for the overlay to finish.
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Output image path.
    #[arg(short, long, default_value = "beamsim.png")]
    output: PathBuf,

    /// Draw the maximum-intensity overlay.
    #[arg(long)]
    overlay: bool,

    /// Seconds of simulation time to advance per tick.
    #[arg(long, default_value_t = 0.0)]
    time_step: f64,
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();
    info!("Starting beamsim...");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => CONFIG.clone(),
    };
    let mut params = config.params.clone();
    params.max_intensity_overlay |= args.overlay;

    let (width, height) = (config.raster.width, config.raster.height);
    let mut primary = MemorySurface::new(width, height);
    let mut overlay = MemorySurface::new(width, height);

    {
        let mut orchestrator = SimulationOrchestrator::new(&config, &mut primary, &mut overlay)
            .context("Failed to set up simulation")?;

        info!(
            "Simulating {} elements, {:?} wave",
            orchestrator.model().geometry().active_count(),
            params.wave_type
        );

        let per_tick = config.scheduler.chunks_per_tick.max(1);
        let ticks = args
            .ticks
            .unwrap_or_else(|| orchestrator.overlay().queue().len().div_ceil(per_tick) + 1);
        info!("Running {} ticks", ticks);

        let start = Instant::now();
        for tick in 0..ticks {
            let now = start + TICK_INTERVAL * tick as u32;
            let report = orchestrator
                .tick(params.clone(), now)
                .with_context(|| format!("Tick {} failed", tick))?;
            debug!("Tick {}: {:?}", tick, report);
            params.simulation.time += args.time_step;
        }

        if params.max_intensity_overlay && !orchestrator.overlay().is_idle() {
            warn!(
                "Overlay incomplete after {} ticks: {} chunks queued",
                ticks,
                orchestrator.overlay().queue().unprocessed_len()
            );
        }
        if let Some(peak) = orchestrator
            .timeline()
            .iter()
            .map(|v| v.abs())
            .max_by(f64::total_cmp)
        {
            info!("Timeline peak at sample point: {:.4}", peak);
        }
    }

    let background = Raster::filled(width, height, Rgba::new(255, 255, 255, 255));
    let composed = overlay
        .raster()
        .over(&primary.raster().over(&background)?)?;
    let image = image::RgbaImage::from_raw(width, height, composed.to_rgba_bytes())
        .context("Raster size does not match image dimensions")?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {}", args.output.display());

    Ok(())
}
