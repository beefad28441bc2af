// src/orchestrator/frame_pass.rs

//! Cheap full-raster pressure view, redrawn whenever its inputs change.

use anyhow::Result;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::field::{FieldModel, FieldProgram, ProgramKind};
use crate::raster::{Raster, Rect};
use crate::surface::DisplaySurface;
use crate::transform::Viewport;

/// Renders the pressure program once per `downsample × downsample` block
/// and replicates each sample over its block.
#[derive(Debug, Clone)]
pub struct FramePass {
    width: u32,
    height: u32,
    downsample: u32,
    dispatcher: Dispatcher,
}

impl FramePass {
    pub fn new(config: &Config) -> Self {
        Self {
            width: config.raster.width,
            height: config.raster.height,
            downsample: config.frame_pass.downsample.max(1),
            dispatcher: config.dispatcher(),
        }
    }

    /// Computes the full-resolution frame without drawing it.
    pub fn compute(&self, model: &FieldModel, viewport: &Viewport) -> Raster {
        let f = self.downsample;
        let coarse_region = Rect::new(0, 0, self.width.div_ceil(f), self.height.div_ceil(f));
        let program = FieldProgram::new(model, viewport, ProgramKind::Pressure).with_stride(f);
        let coarse = self.dispatcher.execute(&program, coarse_region);
        if f == 1 {
            return coarse;
        }
        coarse.upscale(f, self.width, self.height)
    }

    /// Replaces the whole surface with a freshly computed frame.
    pub fn render<S>(&self, model: &FieldModel, viewport: &Viewport, surface: &mut S) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        let frame = self.compute(model, viewport);
        surface.clear()?;
        surface.blit(&frame, 0, 0)?;
        log::debug!(
            "Frame pass: {}x{} at 1/{} resolution",
            self.width,
            self.height,
            self.downsample
        );
        Ok(())
    }
}
