// src/scheduler/mod.rs

//! Chunked rendering of an expensive per-pixel program.
//!
//! The raster is split once into a fixed partition of chunks. Each call to
//! [`ChunkScheduler::update`] renders at most `chunks_per_tick` of them, so
//! the cost of a full frame is spread over many host ticks.
//!
//! ## Generations
//! Every reset request bumps a generation counter. Queued chunks remember
//! the generation they were queued under and the derived field model
//! remembers the generation it was built for; a chunk is rendered only if
//! both match the current generation, otherwise it is dropped as stale.
//!
//! ## Debounced resets
//! [`ChunkScheduler::debounced_reset`] pauses the queue immediately and arms
//! a trailing deadline. Repeated calls keep pushing the deadline out; the
//! real [`ChunkScheduler::reset`] runs from `update` once the deadline has
//! passed with no newer request.

mod chunks;
mod debounce;
#[cfg(test)]
mod tests;

pub use chunks::{Chunk, ChunkId, ChunkQueue, ChunkState};
pub use debounce::Debouncer;

use anyhow::Result;
use log::{debug, info, trace, warn};
use std::time::Instant;

use crate::config::{Config, Limits};
use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::field::{FieldModel, FieldProgram, ProgramKind};
use crate::params::Params;
use crate::raster::Raster;
use crate::surface::DisplaySurface;
use crate::transform::Viewport;

/// Running totals since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub resets: u64,
    pub chunks_rendered: u64,
    pub chunks_discarded: u64,
}

/// What a single [`ChunkScheduler::update`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub reset: bool,
    pub rendered: usize,
    pub discarded: usize,
    /// Chunks still queued afterwards.
    pub pending: usize,
}

pub struct ChunkScheduler {
    queue: ChunkQueue,
    width: u32,
    height: u32,
    chunks_per_tick: usize,
    program: ProgramKind,
    dispatcher: Dispatcher,
    limits: Limits,
    params: Params,
    viewport: Viewport,
    model: FieldModel,
    model_generation: u64,
    generation: u64,
    debouncer: Debouncer,
    /// Mirror of what has been drawn on the surface.
    displayed: Raster,
    stats: SchedulerStats,
}

impl ChunkScheduler {
    /// Builds the partition and the initial field model from `params`. Every
    /// chunk starts queued.
    pub fn new(config: &Config, params: &Params) -> Result<Self, ConfigError> {
        let (width, height) = (config.raster.width, config.raster.height);
        let sched = &config.scheduler;
        let generation = 0;
        let queue = ChunkQueue::partition(width, height, sched.chunk_width, sched.chunk_height, generation);
        let model = FieldModel::new(params, &config.limits)?;
        info!(
            "Chunk scheduler: {}x{} raster, {} chunks of {}x{}, {} per tick, {:?} program",
            width,
            height,
            queue.len(),
            sched.chunk_width,
            sched.chunk_height,
            sched.chunks_per_tick,
            sched.program
        );
        Ok(Self {
            queue,
            width,
            height,
            chunks_per_tick: sched.chunks_per_tick,
            program: sched.program,
            dispatcher: config.dispatcher(),
            limits: config.limits,
            params: params.clone(),
            viewport: config.viewport(params)?,
            model,
            model_generation: generation,
            generation,
            debouncer: Debouncer::new(sched.debounce_window()),
            displayed: Raster::new(width, height),
            stats: SchedulerStats::default(),
        })
    }

    pub fn queue(&self) -> &ChunkQueue {
        &self.queue
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// What the scheduler believes is on the surface.
    pub fn displayed(&self) -> &Raster {
        &self.displayed
    }

    pub fn is_reset_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.unprocessed_len() == 0 && !self.debouncer.is_armed()
    }

    /// Rebuilds the field model from the latest snapshot under a new
    /// generation, clears the surface and queues every chunk.
    ///
    /// A debounced reset still pending from an older generation is left
    /// armed; it is dropped as superseded when it comes due.
    pub fn reset<S>(&mut self, surface: &mut S) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        let model = FieldModel::new(&self.params, &self.limits)?;
        self.generation += 1;
        self.model = model;
        self.model_generation = self.generation;
        surface.clear()?;
        self.displayed = Raster::new(self.width, self.height);
        self.invalidate_all();
        self.stats.resets += 1;
        info!("Scheduler reset (generation {})", self.generation);
        Ok(())
    }

    /// Queues every processed chunk again under the current generation.
    pub fn invalidate_all(&mut self) {
        self.queue.invalidate_all(self.generation);
        debug!("Invalidated all chunks; {} queued", self.queue.unprocessed_len());
    }

    /// Pauses rendering by moving every queued chunk to processed.
    pub fn stop_processing(&mut self) {
        self.queue.stop_processing();
    }

    /// Records `params` as the latest snapshot, pauses rendering and arms a
    /// reset for after the quiet period.
    pub fn debounced_reset(&mut self, params: &Params, now: Instant) {
        self.params = params.clone();
        self.stop_processing();
        self.generation += 1;
        self.debouncer.arm(self.generation, now);
        debug!(
            "Debounced reset armed for generation {} ({:?} window)",
            self.generation,
            self.debouncer.window()
        );
    }

    /// One host tick: fire a due reset, then render up to the chunk budget.
    pub fn update<S>(&mut self, surface: &mut S, now: Instant) -> Result<UpdateReport>
    where
        S: DisplaySurface + ?Sized,
    {
        let mut report = UpdateReport::default();

        if let Some(armed) = self.debouncer.poll(now) {
            if armed == self.generation {
                self.reset(surface)?;
                report.reset = true;
            } else {
                warn!(
                    "Dropping debounced reset for superseded generation {} (current {})",
                    armed, self.generation
                );
            }
        }

        for _ in 0..self.chunks_per_tick {
            let Some((chunk, tag)) = self.queue.pop_front() else {
                break;
            };
            if tag != self.generation || self.model_generation != self.generation {
                trace!(
                    "Discarding stale chunk {} (queued {}, model {}, current {})",
                    chunk.id,
                    tag,
                    self.model_generation,
                    self.generation
                );
                self.stats.chunks_discarded += 1;
                report.discarded += 1;
                continue;
            }
            self.render_chunk(chunk, surface)?;
            report.rendered += 1;
        }

        report.pending = self.queue.unprocessed_len();
        Ok(report)
    }

    /// Pan/zoom fast path: shows the previous frame warped into the new
    /// viewport, then queues every chunk for exact recomputation.
    pub fn viewport_changed<S>(&mut self, viewport: Viewport, surface: &mut S) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        if viewport == self.viewport {
            return Ok(());
        }
        let delta = viewport.delta_from(&self.viewport);
        let warped = self.displayed.warp(&delta)?;
        surface.clear()?;
        surface.blit(&warped, 0, 0)?;
        self.displayed = warped;
        self.viewport = viewport;
        self.invalidate_all();
        debug!("Viewport changed; showing warped preview");
        Ok(())
    }

    /// Adopts `viewport` without touching the surface.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Records `params` without scheduling anything.
    pub fn set_params(&mut self, params: &Params) {
        self.params = params.clone();
    }

    fn render_chunk<S>(&mut self, chunk: Chunk, surface: &mut S) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        let program = FieldProgram::new(&self.model, &self.viewport, self.program);
        let tile = self.dispatcher.execute(&program, chunk.rect);
        surface.clear_rect(chunk.rect)?;
        surface.blit(&tile, chunk.rect.x, chunk.rect.y)?;
        self.displayed.blit(&tile, chunk.rect.x, chunk.rect.y);
        self.stats.chunks_rendered += 1;
        trace!("Rendered chunk {} at {:?}", chunk.id, chunk.rect);
        Ok(())
    }
}
