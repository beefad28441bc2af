// src/surface/mock.rs

use crate::raster::{Raster, Rect};
use crate::surface::{DisplaySurface, MemorySurface};
use anyhow::Result;

/// One recorded call on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Blit { rect: Rect },
    Clear { rect: Rect },
}

/// Surface that records every call and also applies it to an in-memory
/// raster so tests can check both the call sequence and the result.
pub struct RecordingSurface {
    inner: MemorySurface,
    calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: MemorySurface::new(width, height),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Rectangles of every blit so far, in order.
    pub fn blits(&self) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Blit { rect } => Some(*rect),
                SurfaceCall::Clear { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn raster(&self) -> &Raster {
        self.inner.raster()
    }
}

impl DisplaySurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn blit(&mut self, image: &Raster, x: u32, y: u32) -> Result<()> {
        self.calls.push(SurfaceCall::Blit {
            rect: Rect::new(x, y, image.width(), image.height()),
        });
        self.inner.blit(image, x, y)
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<()> {
        self.calls.push(SurfaceCall::Clear { rect });
        self.inner.clear_rect(rect)
    }
}
