// src/color.rs

//! Display mapping: complex pressure → color and alpha.
//!
//! The mapper works in unit floating-point color and leaves alpha
//! unclamped; saturation to the displayable range happens only when a
//! [`PixelColor`] is stored into a raster as [`Rgba`].

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// How a complex pressure value is presented. The discriminants match the
/// numeric codes used at the evaluator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum DisplayMode {
    Hidden = -1,
    /// Signed real part, two-tone.
    #[default]
    Phase = 0,
    /// Magnitude of the analytic signal.
    Envelope = 1,
    /// Squared magnitude.
    Intensity = 2,
}

impl DisplayMode {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(DisplayMode::Hidden),
            0 => Some(DisplayMode::Phase),
            1 => Some(DisplayMode::Envelope),
            2 => Some(DisplayMode::Intensity),
            _ => None,
        }
    }

    pub fn code(self) -> i8 {
        self as i8
    }
}

/// Unit-range RGB with an unclamped alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub alpha: f64,
}

impl PixelColor {
    pub const TRANSPARENT: PixelColor = PixelColor::rgb(0.0, 0.0, 0.0).with_alpha(0.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }
}

/// Positive-phase hue (theme pink, #FF195E).
pub const POSITIVE_PHASE: PixelColor = PixelColor::rgb(1.0, 0.098_039_215_686_274_51, 0.368_627_450_980_392_2);
/// Negative-phase hue (theme blue, #0085FF).
pub const NEGATIVE_PHASE: PixelColor = PixelColor::rgb(0.0, 0.521_568_627_450_980_4, 1.0);
/// Envelope and intensity are drawn as shades of a single neutral color.
pub const MAGNITUDE: PixelColor = PixelColor::rgb(0.0, 0.0, 0.0);
/// Maximum-intensity overlay hue.
pub const MAX_INTENSITY: PixelColor = PixelColor::rgb(1.0, 0.8, 0.0);

/// Linear amplitude factor for a gain in decibels.
#[inline]
pub fn gain_factor(gain_db: f64) -> f64 {
    10f64.powf(gain_db / 20.0)
}

/// Maps a complex pressure value to a color for `mode`.
pub fn map_to_color(value: Complex64, gain_db: f64, mode: DisplayMode) -> PixelColor {
    match mode {
        DisplayMode::Hidden => PixelColor::TRANSPARENT,
        DisplayMode::Phase => {
            let hue = if value.re > 0.0 {
                POSITIVE_PHASE
            } else {
                NEGATIVE_PHASE
            };
            hue.with_alpha(value.re.abs() * gain_factor(gain_db))
        }
        DisplayMode::Envelope => MAGNITUDE.with_alpha(value.norm() * gain_factor(gain_db)),
        DisplayMode::Intensity => MAGNITUDE.with_alpha(value.norm_sqr() * gain_factor(gain_db)),
    }
}

/// Maps a complex pressure value to a signed scalar for line plots.
pub fn map_to_sample(value: Complex64, gain_db: f64, mode: DisplayMode) -> f64 {
    let g = gain_factor(gain_db);
    match mode {
        DisplayMode::Hidden => 0.0,
        DisplayMode::Phase => value.re * g,
        DisplayMode::Envelope => value.norm() * g,
        DisplayMode::Intensity => value.norm_sqr() * g,
    }
}

/// 8-bit straight-alpha RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Straight-alpha "over" compositing of `self` on top of `below`.
    pub fn over(self, below: Rgba) -> Rgba {
        let a_top = f64::from(self.a) / 255.0;
        let a_below = f64::from(below.a) / 255.0;
        let a_out = a_top + a_below * (1.0 - a_top);
        if a_out <= 0.0 {
            return Rgba::TRANSPARENT;
        }
        let blend = |top: u8, bottom: u8| {
            let c = (f64::from(top) * a_top + f64::from(bottom) * a_below * (1.0 - a_top)) / a_out;
            unit_to_byte(c / 255.0)
        };
        Rgba::new(
            blend(self.r, below.r),
            blend(self.g, below.g),
            blend(self.b, below.b),
            unit_to_byte(a_out),
        )
    }
}

impl From<PixelColor> for Rgba {
    fn from(c: PixelColor) -> Self {
        Rgba::new(
            unit_to_byte(c.r),
            unit_to_byte(c.g),
            unit_to_byte(c.b),
            unit_to_byte(c.alpha),
        )
    }
}

/// Saturating conversion of a unit value to a byte. NaN maps to 0.
#[inline]
fn unit_to_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
