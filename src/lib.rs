// src/lib.rs

//! Delay-and-sum simulation of the transmit pressure field of a linear
//! ultrasound array, with incremental chunked rendering.
//!
//! The numeric core (`probe`, `delay`, `apodization`, `pulse`, `field`) is
//! pure and parameterised by immutable [`params::Params`] snapshots. The
//! rendering side (`dispatch`, `raster`, `surface`, `scheduler`,
//! `orchestrator`) turns those snapshots into pixels a bounded amount of work
//! at a time.

pub mod apodization;
pub mod color;
pub mod config;
pub mod delay;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod orchestrator;
pub mod params;
pub mod probe;
pub mod pulse;
pub mod raster;
pub mod scheduler;
pub mod surface;
pub mod transform;
