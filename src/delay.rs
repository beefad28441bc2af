// src/delay.rs

//! Transmit wave-timing models.
//!
//! Each transmit wave type is described by a virtual source. The delay of an
//! element is expressed as a path-length offset (meters) relative to the
//! array's reference point; dividing by the assumed transmit sound speed
//! turns it into a time offset.
//!
//! The strategy is selected once per parameter snapshot through
//! [`WaveType::delay_fn`], so the per-pixel loop calls a plain function
//! pointer instead of branching on the wave type.

use serde::{Deserialize, Serialize};

use crate::transform::Point;

/// Below this virtual-source distance from the origin the plane-wave
/// direction is undefined and falls back to straight ahead.
pub const DEGENERATE_DIRECTION_EPSILON: f64 = 1e-12;

/// Transmit wave type. The discriminants match the numeric codes used at
/// the evaluator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum WaveType {
    #[default]
    Focused = 0,
    Plane = 1,
    Diverging = 2,
}

impl WaveType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(WaveType::Focused),
            1 => Some(WaveType::Plane),
            2 => Some(WaveType::Diverging),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn delay_fn(self) -> DelayFn {
        match self {
            WaveType::Focused => focused_delay,
            WaveType::Plane => plane_delay,
            WaveType::Diverging => diverging_delay,
        }
    }
}

/// Delay strategy: `(virtual source, origin, element) -> path-length offset`.
pub type DelayFn = fn(&VirtualSource, Point, Point) -> f64;

/// A virtual source with its plane-wave azimuth precomputed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VirtualSource {
    pub position: Point,
    /// Direction from the origin to the source, measured from +z towards +x.
    pub azimuth: f64,
}

impl VirtualSource {
    pub fn new(position: Point, origin: Point) -> Self {
        Self {
            position,
            azimuth: direction_azimuth(position, origin),
        }
    }
}

/// Azimuth of `position - origin`, or 0 when the two coincide.
pub fn direction_azimuth(position: Point, origin: Point) -> f64 {
    let (dx, dz) = (position.x - origin.x, position.z - origin.z);
    if dx.hypot(dz) < DEGENERATE_DIRECTION_EPSILON {
        return 0.0;
    }
    dx.atan2(dz)
}

/// Extra travel distance from a point source to `element` relative to the
/// distance from the source to `origin`.
pub fn focused_wave_distance(virtual_source: Point, origin: Point, element: Point) -> f64 {
    virtual_source.distance(element) - virtual_source.distance(origin)
}

/// Signed projection of `element - origin` onto the wavefront normal. This
/// is the far-field limit of [`focused_wave_distance`] for a source at
/// infinity in the direction `azimuth`.
pub fn plane_wave_distance(azimuth: f64, origin: Point, element: Point) -> f64 {
    let (sin, cos) = azimuth.sin_cos();
    -((element.x - origin.x) * sin + (element.z - origin.z) * cos)
}

/// Negated focused distance against the source mirrored through the
/// origin, placing the apparent source behind the array.
pub fn diverging_wave_distance(virtual_source: Point, origin: Point, element: Point) -> f64 {
    -focused_wave_distance(virtual_source.mirror_through(origin), origin, element)
}

fn focused_delay(source: &VirtualSource, origin: Point, element: Point) -> f64 {
    focused_wave_distance(source.position, origin, element)
}

fn plane_delay(source: &VirtualSource, origin: Point, element: Point) -> f64 {
    plane_wave_distance(source.azimuth, origin, element)
}

fn diverging_delay(source: &VirtualSource, origin: Point, element: Point) -> f64 {
    diverging_wave_distance(source.position, origin, element)
}

/// Delay of `element` for the given wave type.
pub fn delay(wave_type: WaveType, source: &VirtualSource, origin: Point, element: Point) -> f64 {
    (wave_type.delay_fn())(source, origin, element)
}
