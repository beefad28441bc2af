// src/surface/mod.rs

//! DisplaySurface trait - the two drawing primitives the renderer needs.
//!
//! Everything drawn by the simulation reaches the screen as either a blit of
//! an already computed sub-raster or a clear of a rectangle. Hosts implement
//! this trait over whatever they present with; [`MemorySurface`] keeps the
//! pixels in an owned [`Raster`] for headless use.

pub mod mock;

use anyhow::Result;

use crate::raster::{Raster, Rect};

pub trait DisplaySurface {
    /// Size of the surface in pixels, `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Replaces the pixels under `image` with its contents, top-left corner
    /// at `(x, y)`. Parts outside the surface are dropped.
    fn blit(&mut self, image: &Raster, x: u32, y: u32) -> Result<()>;

    /// Sets every pixel in `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect) -> Result<()>;

    /// Clears the whole surface.
    fn clear(&mut self) -> Result<()> {
        let (width, height) = self.size();
        self.clear_rect(Rect::new(0, 0, width, height))
    }
}

/// In-memory surface backed by a [`Raster`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySurface {
    raster: Raster,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: Raster::new(width, height),
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }
}

impl DisplaySurface for MemorySurface {
    fn size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }

    fn blit(&mut self, image: &Raster, x: u32, y: u32) -> Result<()> {
        self.raster.blit(image, x, y);
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<()> {
        self.raster.fill_rect(rect, crate::color::Rgba::TRANSPARENT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn blit_then_clear() {
        let mut surface = MemorySurface::new(4, 4);
        let red = Rgba::new(255, 0, 0, 255);
        surface.blit(&Raster::filled(2, 2, red), 1, 1).unwrap();
        assert_eq!(surface.raster().get(2, 2), Some(red));

        surface.clear_rect(Rect::new(2, 2, 2, 2)).unwrap();
        assert_eq!(surface.raster().get(2, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(surface.raster().get(1, 1), Some(red));

        surface.clear().unwrap();
        assert!(surface.raster().pixels().iter().all(|p| *p == Rgba::TRANSPARENT));
    }
}
