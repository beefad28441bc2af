// src/field/mod.rs

//! Delay-and-sum pressure field evaluator.
//!
//! A [`FieldModel`] is built once per parameter snapshot. Construction
//! validates the snapshot and precomputes everything that does not depend on
//! the evaluation point: the element layout, apodization weights, virtual
//! sources and the transmit delay of every (source, element) pair. The
//! per-point methods then only do the receive-side work.

mod programs;

pub use programs::{FieldProgram, ProgramKind};

use log::debug;
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::apodization::ApodizationWeights;
use crate::color::{gain_factor, map_to_sample, DisplayMode};
use crate::config::Limits;
use crate::delay::VirtualSource;
use crate::error::ConfigError;
use crate::params::{DirectivityModel, Params, SimulationParams};
use crate::probe::{ArrayGeometry, Element};
use crate::pulse::pulse;
use crate::transform::Point;

/// Empirical scale applied after dividing by the active element count.
pub const FIELD_NORMALIZATION: f64 = 3.0;

/// Depth-dispersion slope `k` in `1 / (k · d · s + (1 - s))`.
pub const DEPTH_DISPERSION_COEFFICIENT: f64 = 350.0;

/// Distances below this (meters) are clamped before depth attenuation.
pub const DEPTH_DISPERSION_FLOOR: f64 = 1e-3;

/// Empirical scale of the maximum-intensity accumulator.
pub const MAX_INTENSITY_NORMALIZATION: f64 = 50.0;

/// Divisor from peak intensity to overlay alpha.
pub const MAX_INTENSITY_DIVISOR: f64 = 10.0;

/// Time samples scanned per point by the maximum-intensity program.
pub const MAX_INTENSITY_TIME_STEPS: usize = 100;

/// Half-width of the scan margin, in pulse durations.
pub const MAX_INTENSITY_MARGIN: f64 = 0.75;

/// `|x|` below which `sin(x) / x` is taken to be 1.
const SINC_EPSILON: f64 = 1e-9;

/// Everything the evaluator needs for one parameter snapshot.
#[derive(Debug, Clone)]
pub struct FieldModel {
    geometry: ArrayGeometry,
    weights: ApodizationWeights,
    sources: Vec<VirtualSource>,
    active_sources: usize,
    /// Transmit delays in seconds, `source_capacity × element_capacity`,
    /// row-major by source.
    transmit_delays: Vec<f64>,
    sim: SimulationParams,
}

impl FieldModel {
    /// Builds the model for `params` using Tukey apodization.
    pub fn new(params: &Params, limits: &Limits) -> Result<Self, ConfigError> {
        let geometry = ArrayGeometry::linear(&params.probe, limits.max_elements)?;
        let weights = ApodizationWeights::tukey(
            geometry.active_count(),
            params.tukey_ratio,
            limits.max_elements,
        )?;
        Self::from_parts(geometry, weights, params, limits)
    }

    /// Builds the model from an explicit geometry and weight set.
    pub fn from_parts(
        geometry: ArrayGeometry,
        weights: ApodizationWeights,
        params: &Params,
        limits: &Limits,
    ) -> Result<Self, ConfigError> {
        if weights.active_count() != geometry.active_count() {
            return Err(ConfigError::LengthMismatch {
                what: "apodization weights",
                expected: geometry.active_count(),
                actual: weights.active_count(),
            });
        }
        if weights.padded().len() != geometry.capacity() {
            return Err(ConfigError::LengthMismatch {
                what: "apodization capacity",
                expected: geometry.capacity(),
                actual: weights.padded().len(),
            });
        }
        let active_sources = params.virtual_sources.len();
        if active_sources > limits.max_virtual_sources {
            return Err(ConfigError::CapacityExceeded {
                what: "virtual sources",
                count: active_sources,
                capacity: limits.max_virtual_sources,
            });
        }
        for source in &params.virtual_sources {
            ConfigError::check_finite("virtual_sources.x", source.x)?;
            ConfigError::check_finite("virtual_sources.z", source.z)?;
        }
        let sim = params.simulation;
        validate_simulation(&sim)?;

        let origin = geometry.center();
        let mut sources: Vec<VirtualSource> = params
            .virtual_sources
            .iter()
            .map(|&p| VirtualSource::new(p, origin))
            .collect();
        sources.resize(limits.max_virtual_sources, VirtualSource::default());

        let delay_fn = params.wave_type.delay_fn();
        let capacity = geometry.capacity();
        let mut transmit_delays = vec![0.0; sources.len() * capacity];
        for (i, source) in sources.iter().take(active_sources).enumerate() {
            let row = &mut transmit_delays[i * capacity..(i + 1) * capacity];
            for (slot, element) in row.iter_mut().zip(geometry.active()) {
                *slot = delay_fn(source, origin, element.position) / sim.sound_speed_assumed_tx;
            }
        }

        debug!(
            "field model: {} elements, {} sources, {:?} wave",
            geometry.active_count(),
            active_sources,
            params.wave_type
        );

        Ok(Self {
            geometry,
            weights,
            sources,
            active_sources,
            transmit_delays,
            sim,
        })
    }

    pub fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    pub fn weights(&self) -> &ApodizationWeights {
        &self.weights
    }

    pub fn simulation(&self) -> &SimulationParams {
        &self.sim
    }

    /// Transmit delays (seconds) of the active elements for `source`, or
    /// `None` past the active sources.
    pub fn transmit_delays(&self, source: usize) -> Option<&[f64]> {
        if source >= self.active_sources {
            return None;
        }
        let start = source * self.geometry.capacity();
        self.transmit_delays.get(start..start + self.geometry.active_count())
    }

    /// Complex pressure at `point` and `time`.
    pub fn evaluate(&self, point: Point, time: f64) -> Complex64 {
        let sim = &self.sim;
        let wavelength = sim.wavelength();
        let active = self.geometry.active_count();
        let capacity = self.geometry.capacity();

        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..self.sources.len() {
            if i >= self.active_sources {
                break;
            }
            let delays = &self.transmit_delays[i * capacity..(i + 1) * capacity];
            for j in 0..capacity {
                if j >= active {
                    break;
                }
                let element = &self.geometry.padded()[j];
                let distance = element.position.distance(point);
                let receive_delay = distance / sim.sound_speed;
                let phase = (receive_delay - (time + delays[j])) * sim.center_frequency;
                let gain = self.weights.padded()[j]
                    * self.depth_attenuation(distance)
                    * self.directivity(element, point, wavelength);
                acc += pulse(phase, sim.pulse_length) * gain;
            }
        }
        acc * (FIELD_NORMALIZATION / active as f64)
    }

    /// Peak of `|p|²` over the window in which any pulse reaches `point`.
    ///
    /// Only apodization weights are applied here; directivity and depth
    /// dispersion are left out.
    pub fn max_intensity(&self, point: Point) -> f64 {
        let sim = &self.sim;
        let active = self.geometry.active_count();
        let capacity = self.geometry.capacity();
        let elements = self.geometry.active();

        // Receive path depends only on the element, so compute it once.
        let receive: Vec<f64> = elements
            .iter()
            .map(|e| e.position.distance(point) / sim.sound_speed)
            .collect();

        let (mut earliest, mut latest) = (f64::INFINITY, f64::NEG_INFINITY);
        for i in 0..self.active_sources {
            let delays = &self.transmit_delays[i * capacity..i * capacity + active];
            for (r, t0) in receive.iter().zip(delays) {
                let arrival = r - t0;
                earliest = earliest.min(arrival);
                latest = latest.max(arrival);
            }
        }
        if !earliest.is_finite() || !latest.is_finite() {
            return 0.0;
        }

        let margin = MAX_INTENSITY_MARGIN * sim.pulse_length / sim.center_frequency;
        let start = earliest - margin;
        let step = (latest + margin - start) / MAX_INTENSITY_TIME_STEPS as f64;
        let scale = MAX_INTENSITY_NORMALIZATION / active as f64;

        let mut peak: f64 = 0.0;
        for k in 0..MAX_INTENSITY_TIME_STEPS {
            let time = start + step * k as f64;
            let mut acc = Complex64::new(0.0, 0.0);
            for i in 0..self.active_sources {
                let delays = &self.transmit_delays[i * capacity..i * capacity + active];
                for ((r, t0), w) in receive.iter().zip(delays).zip(self.weights.active()) {
                    let phase = (r - (time + t0)) * sim.center_frequency;
                    acc += pulse(phase, sim.pulse_length) * *w;
                }
            }
            peak = peak.max((acc * scale).norm_sqr());
        }
        peak
    }

    /// Overlay alpha for [`FieldModel::max_intensity`] at the snapshot gain.
    pub fn max_intensity_alpha(&self, point: Point) -> f64 {
        self.max_intensity(point) / MAX_INTENSITY_DIVISOR * gain_factor(self.sim.gain)
    }

    /// Field at `point` over `samples` uniformly spaced times in
    /// `[t_min, t_max]`, mapped to scalars with `gain_db` and `mode`.
    pub fn timeline_trace(
        &self,
        point: Point,
        t_min: f64,
        t_max: f64,
        samples: usize,
        gain_db: f64,
        mode: DisplayMode,
    ) -> Vec<f64> {
        let step = if samples > 1 {
            (t_max - t_min) / (samples - 1) as f64
        } else {
            0.0
        };
        (0..samples)
            .map(|k| {
                let time = t_min + step * k as f64;
                map_to_sample(self.evaluate(point, time), gain_db, mode)
            })
            .collect()
    }

    /// Scalar samples of the field at `points`, at the snapshot time.
    pub fn sample_points(&self, points: &[Point], gain_db: f64, mode: DisplayMode) -> Vec<f64> {
        points
            .iter()
            .map(|&p| map_to_sample(self.evaluate(p, self.sim.time), gain_db, mode))
            .collect()
    }

    fn depth_attenuation(&self, distance: f64) -> f64 {
        let strength = self.sim.depth_dispersion_strength;
        let d = distance.max(DEPTH_DISPERSION_FLOOR);
        1.0 / (DEPTH_DISPERSION_COEFFICIENT * d * strength + (1.0 - strength))
    }

    fn directivity(&self, element: &Element, point: Point, wavelength: f64) -> f64 {
        if self.sim.directivity == DirectivityModel::None {
            return 1.0;
        }
        // Angle off the facing normal; broadside is 0.
        let (dx, dz) = (point.x - element.position.x, point.z - element.position.z);
        let angle = dx.atan2(dz) - element.normal_azimuth;
        let baffle = sinc(PI * element.width / wavelength * angle.sin());
        match self.sim.directivity {
            DirectivityModel::None => 1.0,
            DirectivityModel::RigidBaffle => baffle,
            DirectivityModel::SoftBaffle => baffle * angle.cos(),
        }
    }
}

/// `sin(x) / x` with the removable singularity filled in.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < SINC_EPSILON {
        1.0
    } else {
        x.sin() / x
    }
}

fn validate_simulation(sim: &SimulationParams) -> Result<(), ConfigError> {
    let positive = [
        ("simulation.sound_speed", sim.sound_speed),
        ("simulation.sound_speed_assumed_tx", sim.sound_speed_assumed_tx),
        ("simulation.center_frequency", sim.center_frequency),
        ("simulation.pulse_length", sim.pulse_length),
    ];
    for (name, value) in positive {
        if !(value > 0.0 && value.is_finite()) {
            return Err(ConfigError::InvalidParameter { name, value });
        }
    }
    ConfigError::check_finite("simulation.time", sim.time)?;
    ConfigError::check_finite("simulation.gain", sim.gain)?;
    let strength = sim.depth_dispersion_strength;
    if !(0.0..=1.0).contains(&strength) {
        return Err(ConfigError::InvalidParameter {
            name: "simulation.depth_dispersion_strength",
            value: strength,
        });
    }
    Ok(())
}
