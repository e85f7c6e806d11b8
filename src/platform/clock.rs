// src/platform/clock.rs

//! Deterministic frame clock.

use crate::error::FusionError;
use crate::platform::platform_trait::FrameClock;

/// Smallest step between two simulated frames, so timestamps stay strictly
/// increasing whatever the jitter pattern.
const MIN_FRAME_STEP_MS: f64 = 0.001;

/// A frame clock that advances by a fixed period per frame, optionally
/// offset by a repeating jitter pattern. Never sleeps.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    now: f64,
    period_ms: f64,
    jitter_ms: Vec<f64>,
    frames: u64,
    frame_limit: Option<u64>,
}

impl SimulatedClock {
    /// A clock presenting `refresh_hz` frames per second, starting at 0 ms.
    pub fn new(refresh_hz: f64) -> Self {
        let period_ms = if refresh_hz > 0.0 && refresh_hz.is_finite() {
            1000.0 / refresh_hz
        } else {
            0.0
        };
        SimulatedClock {
            now: 0.0,
            period_ms,
            jitter_ms: Vec::new(),
            frames: 0,
            frame_limit: None,
        }
    }

    pub fn starting_at(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    /// Offsets successive frames by `jitter_ms[i % len]`.
    pub fn with_jitter(mut self, jitter_ms: Vec<f64>) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Stops delivering frames after `limit` of them.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames
    }
}

impl FrameClock for SimulatedClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn next_frame(&mut self) -> Result<f64, FusionError> {
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            return Err(FusionError::ClockStopped);
        }
        let jitter = if self.jitter_ms.is_empty() {
            0.0
        } else {
            self.jitter_ms[self.frames as usize % self.jitter_ms.len()]
        };
        self.now += (self.period_ms + jitter).max(MIN_FRAME_STEP_MS);
        self.frames += 1;
        Ok(self.now)
    }
}
