// src/dispatch.rs

//! Applies a pure per-pixel kernel across a raster region.
//!
//! The dispatcher is the only place pixels are computed. Callers describe
//! the work as a [`Kernel`] plus a target [`Rect`] and receive a populated
//! [`Raster`] of that size. Whether the rows are computed serially or split
//! into horizontal stripes across scoped worker threads is invisible to the
//! caller; both produce identical output.

use crate::color::Rgba;
use crate::raster::{Raster, Rect};

/// A pure function from absolute pixel coordinates to a color.
pub trait Kernel: Sync {
    fn eval(&self, x: u32, y: u32) -> Rgba;
}

impl<F> Kernel for F
where
    F: Fn(u32, u32) -> Rgba + Sync,
{
    fn eval(&self, x: u32, y: u32) -> Rgba {
        self(x, y)
    }
}

/// A horizontal stripe of rows `[start_y, end_y)`, relative to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stripe {
    pub start_y: u32,
    pub end_y: u32,
}

/// Execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatcher {
    #[default]
    Serial,
    /// Rows split evenly across `threads` scoped threads.
    Striped { threads: usize },
}

impl Dispatcher {
    pub fn with_threads(threads: usize) -> Self {
        if threads <= 1 {
            Dispatcher::Serial
        } else {
            Dispatcher::Striped { threads }
        }
    }

    pub fn threads(&self) -> usize {
        match *self {
            Dispatcher::Serial => 1,
            Dispatcher::Striped { threads } => threads.max(1),
        }
    }

    /// Evaluates `kernel` at every pixel of `region`. Pixel `(i, j)` of the
    /// result holds `kernel.eval(region.x + i, region.y + j)`.
    pub fn execute<K>(&self, kernel: &K, region: Rect) -> Raster
    where
        K: Kernel + ?Sized,
    {
        let mut out = Raster::new(region.width, region.height);
        if region.is_empty() {
            return out;
        }
        let threads = self.threads().min(region.height as usize);
        if threads <= 1 {
            execute_stripe(
                kernel,
                out.pixels_mut(),
                region,
                Stripe {
                    start_y: 0,
                    end_y: region.height,
                },
            );
            return out;
        }

        let rows_per_thread = region.height as usize / threads;
        let remainder = region.height as usize % threads;
        let width = region.width as usize;

        // Disjoint row slices per thread.
        let mut stripes = Vec::with_capacity(threads);
        let mut remaining = out.pixels_mut();
        let mut start_y = 0usize;
        for i in 0..threads {
            let rows = rows_per_thread + usize::from(i < remainder);
            let (chunk, rest) = remaining.split_at_mut(rows * width);
            stripes.push((
                chunk,
                Stripe {
                    start_y: start_y as u32,
                    end_y: (start_y + rows) as u32,
                },
            ));
            remaining = rest;
            start_y += rows;
        }

        std::thread::scope(|s| {
            for (chunk, stripe) in stripes {
                s.spawn(move || execute_stripe(kernel, chunk, region, stripe));
            }
        });
        out
    }
}

/// Fills `target` (exactly the rows of `stripe`) for `region`.
fn execute_stripe<K>(kernel: &K, target: &mut [Rgba], region: Rect, stripe: Stripe)
where
    K: Kernel + ?Sized,
{
    let width = region.width as usize;
    for (row, y) in (stripe.start_y..stripe.end_y).enumerate() {
        let line = &mut target[row * width..(row + 1) * width];
        for (x, pixel) in line.iter_mut().enumerate() {
            *pixel = kernel.eval(region.x + x as u32, region.y + y);
        }
    }
}
