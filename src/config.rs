// src/config.rs

//! Defines the configuration structures for the simulator.
//!
//! Every section can be deserialized from a JSON file and falls back to its
//! defaults for missing fields, so a configuration file only needs to name
//! the values it changes. The process-wide [`CONFIG`] is loaded lazily from
//! the file named by `BEAMSIM_CONFIG`, or built from defaults when the
//! variable is unset.

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::field::ProgramKind;
use crate::params::Params;
use crate::transform::Viewport;

/// Environment variable naming the configuration file used by [`CONFIG`].
pub const CONFIG_ENV_VAR: &str = "BEAMSIM_CONFIG";

/// Global configuration, resolved on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match std::env::var_os(CONFIG_ENV_VAR) {
    Some(path) => Config::load(&path).unwrap_or_else(|e| {
        warn!("Falling back to default configuration: {:#}", e);
        Config::default()
    }),
    None => Config::default(),
});

// --- Top-Level Configuration Structure ---

/// The complete configuration of a simulator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub raster: RasterConfig,
    pub scheduler: SchedulerConfig,
    pub frame_pass: FramePassConfig,
    pub dispatch: DispatchConfig,
    pub limits: Limits,
    pub timeline: TimelineConfig,
    /// Parameter snapshot used before the host supplies one.
    pub params: Params,
}

impl Config {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks the structural settings. Parameter values are checked when a
    /// field model is built from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("raster.width", self.raster.width as f64),
            ("raster.height", self.raster.height as f64),
            ("scheduler.chunk_width", self.scheduler.chunk_width as f64),
            ("scheduler.chunk_height", self.scheduler.chunk_height as f64),
            ("scheduler.chunks_per_tick", self.scheduler.chunks_per_tick as f64),
            ("frame_pass.downsample", self.frame_pass.downsample as f64),
            ("limits.max_elements", self.limits.max_elements as f64),
        ];
        for (name, value) in positive {
            if value < 1.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !(self.raster.pixels_per_meter > 0.0 && self.raster.pixels_per_meter.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "raster.pixels_per_meter",
                value: self.raster.pixels_per_meter,
            });
        }
        if self.timeline.max_time <= self.timeline.min_time {
            return Err(ConfigError::InvalidParameter {
                name: "timeline.max_time",
                value: self.timeline.max_time,
            });
        }
        if self.params.probe.num_elements > self.limits.max_elements {
            return Err(ConfigError::CapacityExceeded {
                what: "probe elements",
                count: self.params.probe.num_elements,
                capacity: self.limits.max_elements,
            });
        }
        if self.params.virtual_sources.len() > self.limits.max_virtual_sources {
            return Err(ConfigError::CapacityExceeded {
                what: "virtual sources",
                count: self.params.virtual_sources.len(),
                capacity: self.limits.max_virtual_sources,
            });
        }
        Ok(())
    }

    /// Viewport of the configured raster with the camera of `params`.
    pub fn viewport(&self, params: &Params) -> Result<Viewport, ConfigError> {
        let base = Viewport::base_for_raster(self.raster.width, self.raster.pixels_per_meter);
        Viewport::new(base, params.camera)
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::with_threads(self.dispatch.threads)
    }
}

// --- Raster Configuration ---

/// Output raster size and the fixed world → raster scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub width: u32,
    pub height: u32,
    /// Pixels per meter of the base transform, before any zoom.
    pub pixels_per_meter: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            width: 512,
            height: 512,
            pixels_per_meter: 12_800.0,
        }
    }
}

// --- Scheduler Configuration ---

/// Settings of the chunked overlay renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub chunk_width: u32,
    pub chunk_height: u32,
    /// Chunks rendered per `update()` call.
    pub chunks_per_tick: usize,
    /// Quiet period before a debounced reset fires.
    pub debounce_ms: u64,
    pub program: ProgramKind,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            chunk_width: 128,
            chunk_height: 128,
            chunks_per_tick: 1,
            debounce_ms: 200,
            program: ProgramKind::MaxIntensity,
        }
    }
}

impl SchedulerConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// --- Frame Pass Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramePassConfig {
    /// One evaluation per `downsample × downsample` pixel block.
    pub downsample: u32,
}

impl Default for FramePassConfig {
    fn default() -> Self {
        FramePassConfig { downsample: 2 }
    }
}

// --- Dispatch Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker threads per dispatch; 1 runs serially.
    pub threads: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig { threads: 1 }
    }
}

// --- Capacity Limits ---

/// Fixed capacities of the padded evaluator buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_elements: usize,
    pub max_virtual_sources: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_elements: 256,
            max_virtual_sources: 1,
        }
    }
}

// --- Timeline Configuration ---

/// Time axis of the sample-point trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub samples: usize,
    /// Seconds.
    pub min_time: f64,
    /// Seconds.
    pub max_time: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            samples: 512,
            min_time: 0.0,
            max_time: 3e-5,
        }
    }
}
