// src/orchestrator/mod.rs

//! Orchestrates one host tick: diff the incoming parameter snapshot, redraw
//! the cheap full-frame view if needed, drive the chunked overlay and keep
//! the sample-point timeline current.
//!
//! The surfaces are borrowed as trait objects so tests can record exactly
//! what was drawn.

mod frame_pass;

pub use frame_pass::FramePass;

use anyhow::Result;
use std::time::Instant;

use crate::config::Config;
use crate::error::ConfigError;
use crate::field::FieldModel;
use crate::params::{ParamFlags, Params};
use crate::scheduler::{ChunkScheduler, UpdateReport};
use crate::surface::DisplaySurface;
use crate::transform::Viewport;

/// What one [`SimulationOrchestrator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Parameter groups that changed since the previous tick.
    pub dirty: ParamFlags,
    pub frame_redrawn: bool,
    /// `None` while the overlay is disabled.
    pub overlay: Option<UpdateReport>,
    pub timeline_updated: bool,
}

pub struct SimulationOrchestrator<'a> {
    config: Config,
    params: Params,
    model: FieldModel,
    viewport: Viewport,
    frame_pass: FramePass,
    overlay: ChunkScheduler,
    primary: &'a mut dyn DisplaySurface,
    overlay_surface: &'a mut dyn DisplaySurface,
    timeline: Vec<f64>,
    started: bool,
}

impl<'a> SimulationOrchestrator<'a> {
    /// Prepares every component from `config.params`. Nothing is drawn until
    /// the first [`SimulationOrchestrator::tick`].
    pub fn new(
        config: &Config,
        primary: &'a mut dyn DisplaySurface,
        overlay_surface: &'a mut dyn DisplaySurface,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = config.params.clone();
        let model = FieldModel::new(&params, &config.limits)?;
        Ok(Self {
            viewport: config.viewport(&params)?,
            frame_pass: FramePass::new(config),
            overlay: ChunkScheduler::new(config, &params)?,
            timeline: Vec::new(),
            config: config.clone(),
            params,
            model,
            primary,
            overlay_surface,
            started: false,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn model(&self) -> &FieldModel {
        &self.model
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlay(&self) -> &ChunkScheduler {
        &self.overlay
    }

    /// Latest timeline trace of the sample point.
    pub fn timeline(&self) -> &[f64] {
        &self.timeline
    }

    /// Applies `params` and does this tick's bounded amount of drawing.
    pub fn tick(&mut self, params: Params, now: Instant) -> Result<TickReport> {
        params.validate_timeline()?;
        let dirty = if self.started {
            params.diff(&self.params)
        } else {
            ParamFlags::all()
        };
        log::trace!("Orchestrator: tick with dirty set {:?}", dirty);

        if dirty.intersects(ParamFlags::FIELD) {
            self.model = FieldModel::new(&params, &self.config.limits)?;
        }
        if dirty.intersects(ParamFlags::VIEWPORT) {
            self.viewport = self.config.viewport(&params)?;
        }

        let frame_redrawn = dirty.intersects(ParamFlags::FIELD | ParamFlags::VIEWPORT);
        if frame_redrawn {
            self.frame_pass.render(&self.model, &self.viewport, &mut *self.primary)?;
        }

        let overlay = self.drive_overlay(&params, dirty, now)?;

        let timeline_updated = dirty.intersects(ParamFlags::TIMELINE);
        if timeline_updated {
            let t = &self.config.timeline;
            self.timeline = self.model.timeline_trace(
                params.sample_point,
                t.min_time,
                t.max_time,
                t.samples,
                params.timeline_gain,
                params.simulation.display_mode,
            );
        }

        self.params = params;
        self.started = true;
        Ok(TickReport {
            dirty,
            frame_redrawn,
            overlay,
            timeline_updated,
        })
    }

    fn drive_overlay(&mut self, params: &Params, dirty: ParamFlags, now: Instant) -> Result<Option<UpdateReport>> {
        let surface = &mut *self.overlay_surface;
        if !params.max_intensity_overlay {
            if dirty.contains(ParamFlags::OVERLAY_TOGGLE) {
                log::info!("Orchestrator: overlay disabled");
                surface.clear()?;
                self.overlay.invalidate_all();
            }
            return Ok(None);
        }

        if dirty.contains(ParamFlags::OVERLAY_TOGGLE) {
            log::info!("Orchestrator: overlay enabled");
            self.overlay.set_params(params);
            self.overlay.set_viewport(self.viewport);
            self.overlay.reset(surface)?;
        } else {
            if dirty.intersects(ParamFlags::VIEWPORT) {
                self.overlay.viewport_changed(self.viewport, surface)?;
            }
            let program = self.config.scheduler.program;
            if dirty.intersects(program.dependencies()) {
                self.overlay.debounced_reset(params, now);
            } else if dirty.intersects(ParamFlags::FIELD) {
                // Keep the snapshot current for the next reset.
                self.overlay.set_params(params);
            }
        }
        Ok(Some(self.overlay.update(surface, now)?))
    }
}
