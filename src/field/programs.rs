// src/field/programs.rs

//! Per-pixel programs handed to the dispatcher.

use serde::{Deserialize, Serialize};

use super::FieldModel;
use crate::color::{map_to_color, Rgba, MAX_INTENSITY};
use crate::dispatch::Kernel;
use crate::params::ParamFlags;
use crate::transform::{Affine, Point, Viewport};

/// Which quantity a [`FieldProgram`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    /// Instantaneous field at the snapshot time, through the display mapper.
    Pressure,
    /// Peak intensity over the whole pulse passage, amber.
    #[default]
    MaxIntensity,
}

impl ProgramKind {
    /// Parameter groups whose change invalidates this program's output.
    pub fn dependencies(self) -> ParamFlags {
        match self {
            ProgramKind::Pressure => ParamFlags::FIELD,
            // Scans all times and skips directivity, dispersion and the
            // display mapper.
            ProgramKind::MaxIntensity => {
                ParamFlags::FIELD
                    - ParamFlags::TIME
                    - ParamFlags::DISPLAY_MODE
                    - ParamFlags::DEPTH_DISPERSION
                    - ParamFlags::DIRECTIVITY
            }
        }
    }
}

/// Maps raster pixels to world points and evaluates one program there.
///
/// Pixels are sampled at their centers. `stride` scales raster coordinates
/// before the lookup so a reduced-resolution pass can cover the full view.
pub struct FieldProgram<'a> {
    model: &'a FieldModel,
    raster_to_world: Affine,
    kind: ProgramKind,
    stride: u32,
}

impl<'a> FieldProgram<'a> {
    pub fn new(model: &'a FieldModel, viewport: &Viewport, kind: ProgramKind) -> Self {
        Self {
            model,
            raster_to_world: viewport.raster_to_world(),
            kind,
            stride: 1,
        }
    }

    /// Evaluates pixel `(x, y)` at the center of the `stride × stride` block
    /// starting at `(x · stride, y · stride)`.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride.max(1);
        self
    }

    fn world(&self, x: u32, y: u32) -> Point {
        let s = f64::from(self.stride);
        let raster = Point::new(
            f64::from(x) * s + 0.5 * s,
            f64::from(y) * s + 0.5 * s,
        );
        self.raster_to_world.apply(raster)
    }
}

impl Kernel for FieldProgram<'_> {
    fn eval(&self, x: u32, y: u32) -> Rgba {
        let world = self.world(x, y);
        let sim = self.model.simulation();
        match self.kind {
            ProgramKind::Pressure => {
                let value = self.model.evaluate(world, sim.time);
                map_to_color(value, sim.gain, sim.display_mode).into()
            }
            ProgramKind::MaxIntensity => MAX_INTENSITY
                .with_alpha(self.model.max_intensity_alpha(world))
                .into(),
        }
    }
}
