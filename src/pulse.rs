// src/pulse.rs

//! Gaussian-windowed carrier pulse.

use num_complex::Complex64;
use std::f64::consts::TAU;

/// Analytic pulse sample at `phase` (in carrier cycles) for a pulse of
/// `pulse_length` cycles.
///
/// The envelope is `exp(-(2 · phase / pulse_length)²)`; the real part is the
/// in-phase component `cos(2π · phase) · envelope` and the imaginary part the
/// quadrature component `sin(2π · phase) · envelope`. `pulse(0, L)` is exactly
/// `1 + 0i`.
#[inline]
pub fn pulse(phase: f64, pulse_length: f64) -> Complex64 {
    let envelope = (-(2.0 * phase / pulse_length).powi(2)).exp();
    let (sin, cos) = (TAU * phase).sin_cos();
    Complex64::new(cos * envelope, sin * envelope)
}
