// src/probe.rs

//! Transducer array geometry.
//!
//! Only linear arrays are modelled: `n` elements evenly spaced on the segment
//! between the probe's left and right end points, all facing the same way.
//! The derived buffers are zero-padded up to a fixed capacity so that the
//! evaluator can always iterate a fixed maximum and cut off at the active
//! count. Padded slots are inert: zero position, zero width.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transform::Point;

/// User-facing probe description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeParams {
    pub num_elements: usize,
    pub left: Point,
    pub right: Point,
}

impl Default for ProbeParams {
    fn default() -> Self {
        ProbeParams {
            num_elements: 64,
            left: Point::new(-0.003, 0.0),
            right: Point::new(0.003, 0.0),
        }
    }
}

/// A single transducer element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Element {
    pub position: Point,
    /// Azimuth of the facing normal, measured from the +z axis towards +x.
    pub normal_azimuth: f64,
    pub width: f64,
}

/// Element layout of an array, padded to `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGeometry {
    elements: Vec<Element>,
    active: usize,
    center: Point,
}

impl ArrayGeometry {
    pub fn linear(probe: &ProbeParams, capacity: usize) -> Result<Self, ConfigError> {
        let n = probe.num_elements;
        if n == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "probe.num_elements",
                value: 0.0,
            });
        }
        if n > capacity {
            return Err(ConfigError::CapacityExceeded {
                what: "probe elements",
                count: n,
                capacity,
            });
        }

        let (left, right) = (probe.left, probe.right);
        let coordinates = [
            ("probe.left.x", left.x),
            ("probe.left.z", left.z),
            ("probe.right.x", right.x),
            ("probe.right.z", right.z),
        ];
        for (name, value) in coordinates {
            ConfigError::check_finite(name, value)?;
        }
        let center = Point::new((left.x + right.x) / 2.0, (left.z + right.z) / 2.0);
        let length = left.distance(right);

        // Facing normal is the tangent rotated a quarter turn so that a
        // left-to-right probe along +x faces +z.
        let (tx, tz) = (right.x - left.x, right.z - left.z);
        let normal_azimuth = if length > 0.0 { (-tz).atan2(tx) } else { 0.0 };

        // Pitch-sized elements; a single element spans the whole aperture.
        let width = if n > 1 { length / (n - 1) as f64 } else { length };

        let mut elements = Vec::with_capacity(capacity);
        if n == 1 {
            elements.push(Element {
                position: center,
                normal_azimuth,
                width,
            });
        } else {
            let dx = tx / (n - 1) as f64;
            let dz = tz / (n - 1) as f64;
            elements.extend((0..n).map(|i| Element {
                position: Point::new(left.x + i as f64 * dx, left.z + i as f64 * dz),
                normal_azimuth,
                width,
            }));
        }
        elements.resize(capacity, Element::default());

        Ok(Self {
            elements,
            active: n,
            center,
        })
    }

    /// Number of elements that contribute to the field.
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// All slots, including the zero-padded tail.
    pub fn padded(&self) -> &[Element] {
        &self.elements
    }

    pub fn active(&self) -> &[Element] {
        &self.elements[..self.active]
    }

    /// Array reference point (the wave origin).
    pub fn center(&self) -> Point {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_probe_spaces_elements_evenly() {
        let probe = ProbeParams {
            num_elements: 4,
            left: Point::new(-0.003, 0.0),
            right: Point::new(0.003, 0.0),
        };
        let geometry = ArrayGeometry::linear(&probe, 8).unwrap();
        let xs: Vec<f64> = geometry.active().iter().map(|e| e.position.x).collect();
        assert_eq!(xs.len(), 4);
        assert!((xs[0] + 0.003).abs() < 1e-12);
        assert!((xs[1] + 0.001).abs() < 1e-12);
        assert!((xs[2] - 0.001).abs() < 1e-12);
        assert!((xs[3] - 0.003).abs() < 1e-12);
        assert!((geometry.active()[0].width - 0.002).abs() < 1e-12);
        assert_eq!(geometry.center(), Point::new(0.0, 0.0));
    }

    #[test]
    fn padding_is_inert() {
        let geometry = ArrayGeometry::linear(&ProbeParams::default(), 256).unwrap();
        assert_eq!(geometry.capacity(), 256);
        assert_eq!(geometry.active_count(), 64);
        assert!(geometry.padded()[64..].iter().all(|e| *e == Element::default()));
    }

    #[test]
    fn horizontal_probe_faces_down() {
        let geometry = ArrayGeometry::linear(&ProbeParams::default(), 64).unwrap();
        assert!(geometry.active()[0].normal_azimuth.abs() < 1e-12);
    }

    #[test]
    fn single_element_sits_at_center() {
        let probe = ProbeParams {
            num_elements: 1,
            ..ProbeParams::default()
        };
        let geometry = ArrayGeometry::linear(&probe, 4).unwrap();
        assert_eq!(geometry.active()[0].position, Point::new(0.0, 0.0));
        assert!((geometry.active()[0].width - 0.006).abs() < 1e-12);
    }

    #[test]
    fn over_capacity_is_rejected() {
        let probe = ProbeParams {
            num_elements: 300,
            ..ProbeParams::default()
        };
        assert!(matches!(
            ArrayGeometry::linear(&probe, 256),
            Err(ConfigError::CapacityExceeded { count: 300, capacity: 256, .. })
        ));
    }
}
