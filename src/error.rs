// src/error.rs

//! Error taxonomy for the simulation core.
//!
//! Only configuration errors are represented here. They signal a caller bug
//! (a malformed snapshot, an anisotropic viewport queried for a scalar
//! length, mismatched buffer lengths) and abort the computation that hit
//! them. Numeric degeneracies such as a zero-length plane-wave direction or
//! a zero sinc argument are not errors; they are resolved where they occur
//! with fixed fallback values.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("transform is anisotropic (sx = {sx}, sy = {sy}); a scalar length is undefined")]
    AnisotropicScale { sx: f64, sy: f64 },
    #[error("transform has a shear component and cannot be inverted as scale + translation")]
    ShearedTransform,
    #[error("transform is singular")]
    SingularTransform,
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{what}: count {count} exceeds capacity {capacity}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        capacity: usize,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl ConfigError {
    /// `InvalidParameter` unless `value` is finite.
    pub fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidParameter { name, value })
        }
    }
}
