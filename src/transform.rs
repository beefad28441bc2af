// src/transform.rs

//! Affine transforms and the viewport that maps world coordinates (meters,
//! lateral `x` and depth `z`) onto raster coordinates (pixels, column and
//! row).
//!
//! Matrices are stored column-major as six numbers `[a, b, c, d, e, f]`,
//! representing
//!
//! ```text
//! | a  c  e |
//! | b  d  f |
//! | 0  0  1 |
//! ```
//!
//! The viewport is the composition of a fixed base transform (world →
//! raster, isotropic scale plus translation) and a user-controlled camera
//! transform (pan/zoom, expressed in world space). Several consumers convert
//! scalar lengths between the two spaces, which is only meaningful while
//! both transforms are isotropic; asking for a length on an anisotropic
//! camera is a [`ConfigError::AnisotropicScale`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ISOTROPY_TOLERANCE: f64 = 1e-9;

/// A 2D point. In world space the second coordinate is depth `z`; in raster
/// space it is the row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, z: 0.0 };

    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Point reflection of `self` through `center`.
    pub fn mirror_through(self, center: Point) -> Point {
        Point::new(2.0 * center.x - self.x, 2.0 * center.z - self.z)
    }
}

/// A 2×3 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine(pub [f64; 6]);

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub const fn scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Affine([sx, 0.0, 0.0, sy, tx, ty])
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::scale_translate(1.0, 1.0, tx, ty)
    }

    /// Uniform scale by `scale` around `anchor`, i.e. `T(anchor) · S · T(-anchor)`.
    pub fn scale_about(scale: f64, anchor: Point) -> Self {
        Affine::translation(anchor.x, anchor.z)
            .then_after(&Affine::scale_translate(scale, scale, 0.0, 0.0))
            .then_after(&Affine::translation(-anchor.x, -anchor.z))
    }

    /// Matrix product `self · rhs`: the result applies `rhs` first, then `self`.
    pub fn then_after(&self, rhs: &Affine) -> Affine {
        let [a0, a1, a2, a3, a4, a5] = self.0;
        let [b0, b1, b2, b3, b4, b5] = rhs.0;
        Affine([
            a0 * b0 + a2 * b1,
            a1 * b0 + a3 * b1,
            a0 * b2 + a2 * b3,
            a1 * b2 + a3 * b3,
            a0 * b4 + a2 * b5 + a4,
            a1 * b4 + a3 * b5 + a5,
        ])
    }

    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.z + e, b * p.x + d * p.z + f)
    }

    pub fn is_shear_free(&self) -> bool {
        self.0[1] == 0.0 && self.0[2] == 0.0
    }

    /// The common per-axis scale of a shear-free isotropic transform.
    pub fn isotropic_scale(&self) -> Result<f64, ConfigError> {
        if !self.is_shear_free() {
            return Err(ConfigError::ShearedTransform);
        }
        let (sx, sy) = (self.0[0], self.0[3]);
        let tolerance = ISOTROPY_TOLERANCE * sx.abs().max(sy.abs()).max(1.0);
        if (sx - sy).abs() > tolerance {
            return Err(ConfigError::AnisotropicScale { sx, sy });
        }
        Ok(sx)
    }

    /// Inverse of a scale + translation transform. Shear is rejected rather
    /// than silently dropped.
    pub fn invert_scale_translation(&self) -> Result<Affine, ConfigError> {
        if !self.is_shear_free() {
            return Err(ConfigError::ShearedTransform);
        }
        let [a, _, _, d, e, f] = self.0;
        if a == 0.0 || d == 0.0 || !a.is_finite() || !d.is_finite() {
            return Err(ConfigError::SingularTransform);
        }
        Ok(Affine([1.0 / a, 0.0, 0.0, 1.0 / d, -e / a, -f / d]))
    }
}

/// World ↔ raster mapping with pan/zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    base: Affine,
    inverse_base: Affine,
    camera: Affine,
    inverse_camera: Affine,
}

impl Viewport {
    /// `base` maps world → raster; `camera` is the pan/zoom in world space.
    pub fn new(base: Affine, camera: Affine) -> Result<Self, ConfigError> {
        Ok(Self {
            inverse_base: base.invert_scale_translation()?,
            inverse_camera: camera.invert_scale_translation()?,
            base,
            camera,
        })
    }

    /// Base transform for a raster: isotropic `pixels_per_meter`, with world
    /// `x = 0` at the horizontal center and `z = 0` at the top row.
    pub fn base_for_raster(width: u32, pixels_per_meter: f64) -> Affine {
        Affine::scale_translate(
            pixels_per_meter,
            pixels_per_meter,
            f64::from(width) / 2.0,
            0.0,
        )
    }

    pub fn base(&self) -> &Affine {
        &self.base
    }

    pub fn camera(&self) -> &Affine {
        &self.camera
    }

    pub fn to_raster(&self, world: Point) -> Point {
        self.base.apply(self.inverse_camera.apply(world))
    }

    pub fn to_world(&self, raster: Point) -> Point {
        self.camera.apply(self.inverse_base.apply(raster))
    }

    /// Raster → world as a single matrix.
    pub fn raster_to_world(&self) -> Affine {
        self.camera.then_after(&self.inverse_base)
    }

    /// World → raster as a single matrix.
    pub fn world_to_raster(&self) -> Affine {
        self.base.then_after(&self.inverse_camera)
    }

    /// Converts a world-space length into pixels.
    pub fn to_raster_length(&self, world_length: f64) -> Result<f64, ConfigError> {
        let camera_scale = self.camera.isotropic_scale()?;
        let base_scale = self.base.isotropic_scale()?;
        Ok(world_length / camera_scale.abs() * base_scale.abs())
    }

    /// Zooms by `scale_factor` keeping `anchor` (world space) fixed on screen.
    pub fn compose_pan_zoom(&self, scale_factor: f64, anchor: Point) -> Result<Viewport, ConfigError> {
        let camera = Affine::scale_about(scale_factor, anchor).then_after(&self.camera);
        Viewport::new(self.base, camera)
    }

    /// Raster → raster transform taking pixels of a frame drawn with `previous`
    /// onto where the same world points land under `self`.
    pub fn delta_from(&self, previous: &Viewport) -> Affine {
        self.world_to_raster().then_after(&previous.raster_to_world())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.z - b.z).abs() < 1e-9
    }

    #[test]
    fn world_raster_round_trip_under_zoom() {
        let base = Viewport::base_for_raster(512, 12_800.0);
        let vp = Viewport::new(base, Affine::IDENTITY)
            .unwrap()
            .compose_pan_zoom(0.5, Point::new(0.001, 0.01))
            .unwrap();
        let world = Point::new(-0.004, 0.02);
        assert!(approx(vp.to_world(vp.to_raster(world)), world));
    }

    #[test]
    fn zoom_keeps_anchor_fixed_on_screen() {
        let base = Viewport::base_for_raster(512, 12_800.0);
        let before = Viewport::new(base, Affine::IDENTITY).unwrap();
        let anchor = Point::new(0.003, 0.015);
        let after = before.compose_pan_zoom(2.0, anchor).unwrap();
        assert!(approx(before.to_raster(anchor), after.to_raster(anchor)));
    }

    #[test]
    fn raster_length_follows_zoom() {
        let base = Viewport::base_for_raster(100, 1000.0);
        let vp = Viewport::new(base, Affine::scale_translate(2.0, 2.0, 0.0, 0.0)).unwrap();
        assert!((vp.to_raster_length(0.01).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn raster_length_rejects_anisotropic_camera() {
        let base = Viewport::base_for_raster(100, 1000.0);
        let vp = Viewport::new(base, Affine::scale_translate(2.0, 3.0, 0.0, 0.0)).unwrap();
        assert_eq!(
            vp.to_raster_length(1.0),
            Err(ConfigError::AnisotropicScale { sx: 2.0, sy: 3.0 })
        );
    }

    #[test]
    fn sheared_camera_is_rejected() {
        let base = Viewport::base_for_raster(100, 1000.0);
        let sheared = Affine([1.0, 0.5, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(Viewport::new(base, sheared), Err(ConfigError::ShearedTransform));
    }

    #[test]
    fn delta_between_identical_viewports_is_identity() {
        let base = Viewport::base_for_raster(64, 1000.0);
        let vp = Viewport::new(base, Affine::translation(0.001, 0.0)).unwrap();
        let delta = vp.delta_from(&vp);
        for (got, want) in delta.0.iter().zip(Affine::IDENTITY.0.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn mirror_through_reflects_point() {
        let p = Point::new(0.002, 0.01).mirror_through(Point::new(0.0, 0.0));
        assert_eq!(p, Point::new(-0.002, -0.01));
    }
}
