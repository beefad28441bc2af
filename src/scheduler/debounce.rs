// src/scheduler/debounce.rs

//! Trailing-edge debounce keyed by generation.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    generation: u64,
    deadline: Instant,
}

/// Fires once `window` has passed since the most recent [`Debouncer::arm`].
///
/// Time is supplied by the caller, so the debouncer never reads a clock.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    armed: Option<Armed>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cancels any pending fire and schedules one for `generation` at
    /// `now + window`.
    pub fn arm(&mut self, generation: u64, now: Instant) {
        self.armed = Some(Armed {
            generation,
            deadline: now + self.window,
        });
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.deadline)
    }

    /// Returns the armed generation once its deadline has passed, disarming.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.armed {
            Some(armed) if now >= armed.deadline => {
                self.armed = None;
                Some(armed.generation)
            }
            _ => None,
        }
    }
}
