// src/apodization.rs

//! Per-element amplitude weighting.

use crate::error::ConfigError;

/// Tukey (tapered cosine) window of `n` samples with taper ratio `ratio`,
/// normalized so that the mean weight is 1.
///
/// `ratio = 0` is a rectangular window and `ratio = 1` a Hann window; any
/// other value outside `[0, 1]` (NaN included) is rejected. The window is
/// sampled at `i / (n + 1)` for `i` in `1..=n`, so the end points are never
/// exactly zero and every element keeps some weight.
pub fn tukey(n: usize, ratio: f64) -> Result<Vec<f64>, ConfigError> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ConfigError::InvalidParameter {
            name: "tukey_ratio",
            value: ratio,
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    let r = ratio;
    let mut window: Vec<f64> = (1..=n)
        .map(|i| {
            let x = i as f64 / (n + 1) as f64;
            if x < r / 2.0 {
                0.5 * (1.0 + (2.0 * std::f64::consts::PI / r * (x - r / 2.0)).cos())
            } else if x < 1.0 - r / 2.0 {
                1.0
            } else {
                0.5 * (1.0 + (2.0 * std::f64::consts::PI / r * (x - 1.0 + r / 2.0)).cos())
            }
        })
        .collect();

    let mean = window.iter().sum::<f64>() / n as f64;
    if mean > 0.0 {
        window.iter_mut().for_each(|w| *w /= mean);
    }
    Ok(window)
}

/// Apodization weights laid out like the array geometry: `active` real
/// weights followed by zeros up to `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApodizationWeights {
    weights: Vec<f64>,
    active: usize,
}

impl ApodizationWeights {
    pub fn tukey(active: usize, ratio: f64, capacity: usize) -> Result<Self, ConfigError> {
        Self::from_window(tukey(active, ratio)?, capacity)
    }

    /// Wraps an explicit window, padding it to `capacity`.
    pub fn from_window(mut window: Vec<f64>, capacity: usize) -> Result<Self, ConfigError> {
        let active = window.len();
        if active > capacity {
            return Err(ConfigError::CapacityExceeded {
                what: "apodization weights",
                count: active,
                capacity,
            });
        }
        window.resize(capacity, 0.0);
        Ok(Self {
            weights: window,
            active,
        })
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &[f64] {
        &self.weights[..self.active]
    }

    pub fn padded(&self) -> &[f64] {
        &self.weights
    }
}
