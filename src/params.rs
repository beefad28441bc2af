// src/params.rs

//! Immutable parameter snapshots.
//!
//! The host builds a fresh [`Params`] whenever any user-facing value
//! changes and hands it to the core. What changed since the previous tick
//! is derived by diffing consecutive snapshots into a [`ParamFlags`] set;
//! nothing in the core reads parameters from shared mutable state.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::DisplayMode;
use crate::delay::WaveType;
use crate::error::ConfigError;
use crate::probe::ProbeParams;
use crate::transform::{Affine, Point};

/// Element directivity model. Discriminants match the evaluator codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DirectivityModel {
    /// Omnidirectional elements.
    #[default]
    None = 0,
    /// `sinc(π · w / λ · sin θ)`.
    RigidBaffle = 1,
    /// Rigid-baffle sinc times `cos θ`.
    SoftBaffle = 2,
}

/// Scalar simulation settings consumed read-only by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Seconds since transmit.
    pub time: f64,
    /// Propagation speed used on receive, m/s.
    pub sound_speed: f64,
    /// Speed the transmit delays were computed for, m/s.
    pub sound_speed_assumed_tx: f64,
    /// Hz.
    pub center_frequency: f64,
    /// In carrier wavelengths.
    pub pulse_length: f64,
    /// dB.
    pub gain: f64,
    pub display_mode: DisplayMode,
    /// 0 disables depth falloff, 1 is full `1/r`-like falloff.
    pub depth_dispersion_strength: f64,
    pub directivity: DirectivityModel,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            time: 0.0,
            sound_speed: 1540.0,
            sound_speed_assumed_tx: 1540.0,
            center_frequency: 3e6,
            pulse_length: 1.5,
            gain: 0.0,
            display_mode: DisplayMode::Phase,
            depth_dispersion_strength: 0.0,
            directivity: DirectivityModel::None,
        }
    }
}

impl SimulationParams {
    pub fn wavelength(&self) -> f64 {
        self.sound_speed / self.center_frequency
    }
}

/// A complete snapshot of every user-facing parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub probe: ProbeParams,
    pub tukey_ratio: f64,
    pub wave_type: WaveType,
    pub virtual_sources: Vec<Point>,
    /// Point whose time trace is plotted on the timeline.
    pub sample_point: Point,
    pub simulation: SimulationParams,
    /// Gain of the timeline trace, dB.
    pub timeline_gain: f64,
    /// Pan/zoom in world space.
    pub camera: Affine,
    pub max_intensity_overlay: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            probe: ProbeParams::default(),
            tukey_ratio: 0.0,
            wave_type: WaveType::Focused,
            virtual_sources: vec![Point::new(0.002, 0.01)],
            sample_point: Point::new(-0.004, 0.012),
            simulation: SimulationParams::default(),
            timeline_gain: 0.0,
            camera: Affine::IDENTITY,
            max_intensity_overlay: false,
        }
    }
}

bitflags! {
    /// Named parameter groups, used as a dirty set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParamFlags: u32 {
        const PROBE             = 1 << 0;
        const APODIZATION       = 1 << 1;
        const WAVE_TYPE         = 1 << 2;
        const VIRTUAL_SOURCE    = 1 << 3;
        const SAMPLE_POINT      = 1 << 4;
        const TIME              = 1 << 5;
        const SOUND_SPEED       = 1 << 6;
        const SOUND_SPEED_TX    = 1 << 7;
        const CENTER_FREQUENCY  = 1 << 8;
        const PULSE_LENGTH      = 1 << 9;
        const GAIN              = 1 << 10;
        const DISPLAY_MODE      = 1 << 11;
        const DEPTH_DISPERSION  = 1 << 12;
        const DIRECTIVITY       = 1 << 13;
        const TIMELINE_GAIN     = 1 << 14;
        const CAMERA            = 1 << 15;
        const OVERLAY_TOGGLE    = 1 << 16;

        /// Inputs that are derived once per snapshot rather than per pixel.
        const GEOMETRY = Self::PROBE.bits()
            | Self::APODIZATION.bits()
            | Self::WAVE_TYPE.bits()
            | Self::VIRTUAL_SOURCE.bits();

        /// Everything the rendered pressure field depends on.
        const FIELD = Self::GEOMETRY.bits()
            | Self::TIME.bits()
            | Self::SOUND_SPEED.bits()
            | Self::SOUND_SPEED_TX.bits()
            | Self::CENTER_FREQUENCY.bits()
            | Self::PULSE_LENGTH.bits()
            | Self::GAIN.bits()
            | Self::DISPLAY_MODE.bits()
            | Self::DEPTH_DISPERSION.bits()
            | Self::DIRECTIVITY.bits();

        const VIEWPORT = Self::CAMERA.bits();

        const TIMELINE = Self::FIELD.bits()
            | Self::SAMPLE_POINT.bits()
            | Self::TIMELINE_GAIN.bits();
    }
}

impl Params {
    /// Rejects a non-finite sample point or timeline gain. Everything else is
    /// checked when a field model is built from the snapshot.
    pub fn validate_timeline(&self) -> Result<(), ConfigError> {
        ConfigError::check_finite("sample_point.x", self.sample_point.x)?;
        ConfigError::check_finite("sample_point.z", self.sample_point.z)?;
        ConfigError::check_finite("timeline_gain", self.timeline_gain)
    }

    /// Which parameter groups differ between `previous` and `self`.
    pub fn diff(&self, previous: &Params) -> ParamFlags {
        let mut dirty = ParamFlags::empty();
        let (sim, old) = (&self.simulation, &previous.simulation);

        dirty.set(ParamFlags::PROBE, self.probe != previous.probe);
        dirty.set(ParamFlags::APODIZATION, self.tukey_ratio != previous.tukey_ratio);
        dirty.set(ParamFlags::WAVE_TYPE, self.wave_type != previous.wave_type);
        dirty.set(ParamFlags::VIRTUAL_SOURCE, self.virtual_sources != previous.virtual_sources);
        dirty.set(ParamFlags::SAMPLE_POINT, self.sample_point != previous.sample_point);
        dirty.set(ParamFlags::TIME, sim.time != old.time);
        dirty.set(ParamFlags::SOUND_SPEED, sim.sound_speed != old.sound_speed);
        dirty.set(
            ParamFlags::SOUND_SPEED_TX,
            sim.sound_speed_assumed_tx != old.sound_speed_assumed_tx,
        );
        dirty.set(ParamFlags::CENTER_FREQUENCY, sim.center_frequency != old.center_frequency);
        dirty.set(ParamFlags::PULSE_LENGTH, sim.pulse_length != old.pulse_length);
        dirty.set(ParamFlags::GAIN, sim.gain != old.gain);
        dirty.set(ParamFlags::DISPLAY_MODE, sim.display_mode != old.display_mode);
        dirty.set(
            ParamFlags::DEPTH_DISPERSION,
            sim.depth_dispersion_strength != old.depth_dispersion_strength,
        );
        dirty.set(ParamFlags::DIRECTIVITY, sim.directivity != old.directivity);
        dirty.set(ParamFlags::TIMELINE_GAIN, self.timeline_gain != previous.timeline_gain);
        dirty.set(ParamFlags::CAMERA, self.camera != previous.camera);
        dirty.set(
            ParamFlags::OVERLAY_TOGGLE,
            self.max_intensity_overlay != previous.max_intensity_overlay,
        );
        dirty
    }
}
