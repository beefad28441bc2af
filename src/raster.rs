// src/raster.rs

//! Owned RGBA pixel buffers and the rectangle type used to address them.
//!
//! Rasters are row-major with the origin at the top-left. All copy
//! operations clip against the destination bounds.

use crate::color::Rgba;
use crate::error::ConfigError;
use crate::transform::{Affine, Point};

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles, if any.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Rect::new(x, y, right - x, bottom - y))
    }
}

/// A width × height grid of [`Rgba`] pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<Rgba>,
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, pixel: Rgba) -> Self {
        Self {
            width,
            height,
            data: vec![pixel; width as usize * height as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<Rgba>) -> Result<Self, ConfigError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(ConfigError::LengthMismatch {
                what: "raster data",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.data[self.index(x, y)])
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Rgba) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data[i] = pixel;
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, pixel: Rgba) {
        let Some(clip) = rect.intersect(&self.bounds()) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            let start = self.index(clip.x, y);
            self.data[start..start + clip.width as usize].fill(pixel);
        }
    }

    /// Copies `src` onto `self` with its top-left corner at `(x, y)`,
    /// replacing the covered pixels.
    pub fn blit(&mut self, src: &Raster, x: u32, y: u32) {
        let target = Rect::new(x, y, src.width, src.height);
        let Some(clip) = target.intersect(&self.bounds()) else {
            return;
        };
        let w = clip.width as usize;
        for row in 0..clip.height {
            let src_start = src.index(clip.x - x, clip.y - y + row);
            let dst_start = self.index(clip.x, clip.y + row);
            self.data[dst_start..dst_start + w].copy_from_slice(&src.data[src_start..src_start + w]);
        }
    }

    /// Resamples `self` through `delta`, a raster → raster transform taking
    /// old pixel positions to new ones. Nearest-neighbour; pixels whose
    /// source falls outside `self` are transparent.
    pub fn warp(&self, delta: &Affine) -> Result<Raster, ConfigError> {
        let inverse = delta.invert_scale_translation()?;
        let mut out = Raster::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let src = inverse.apply(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
                let (sx, sy) = (src.x.floor(), src.z.floor());
                if sx < 0.0 || sy < 0.0 {
                    continue;
                }
                if let Some(pixel) = self.get(sx as u32, sy as u32) {
                    let i = out.index(x, y);
                    out.data[i] = pixel;
                }
            }
        }
        Ok(out)
    }

    /// Nearest-neighbour enlargement by `factor`, cropped to
    /// `width × height`.
    pub fn upscale(&self, factor: u32, width: u32, height: u32) -> Raster {
        let factor = factor.max(1);
        let mut out = Raster::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if let Some(pixel) = self.get(x / factor, y / factor) {
                    let i = out.index(x, y);
                    out.data[i] = pixel;
                }
            }
        }
        out
    }

    /// `self` composited over `below`, pixel by pixel.
    pub fn over(&self, below: &Raster) -> Result<Raster, ConfigError> {
        if self.data.len() != below.data.len() {
            return Err(ConfigError::LengthMismatch {
                what: "composited raster",
                expected: below.data.len(),
                actual: self.data.len(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&below.data)
            .map(|(top, bottom)| top.over(*bottom))
            .collect();
        Raster::from_data(self.width, self.height, data)
    }

    /// Tightly packed RGBA8 bytes, row-major.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|p| p.to_array()).collect()
    }
}
