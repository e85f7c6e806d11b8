// src/refresh.rs

//! Refresh Estimator.
//!
//! Estimates the host's frame rate by timing two consecutive frame callbacks
//! from a recorded start time, averaging over both intervals to damp
//! single-frame jitter. There is no fixed-duration wait: the probe only ever
//! suspends on the host's frame clock, so it works on variable-refresh
//! displays.
//!
//! This is a one-shot measurement per text block.

use crate::error::FusionError;
use crate::platform::FrameClock;
use log::{debug, warn};

/// Number of frame callbacks the probe waits for.
pub const PROBE_FRAMES: u32 = 2;

/// Result of one refresh probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshEstimate {
    /// Estimated refresh rate, rounded to whole hertz. Zero if the probe saw no
    /// time pass.
    pub hz: u32,
    /// Time between the start mark and the last probed frame.
    pub elapsed_ms: f64,
    /// Timestamp of the last probed frame.
    pub finished_at: f64,
}

/// Converts the time spanned by [`PROBE_FRAMES`] frames into hertz.
pub fn hz_from_elapsed(elapsed_ms: f64) -> u32 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0;
    }
    let per_frame = elapsed_ms / PROBE_FRAMES as f64;
    (1000.0 / per_frame).round().min(u32::MAX as f64) as u32
}

/// Frame-driven probe state machine.
///
/// Feed it frame timestamps with [`RefreshProbe::on_frame`]; it resolves on the
/// second one. Useful when the caller owns the frame loop.
#[derive(Debug, Clone)]
pub struct RefreshProbe {
    started_at: f64,
    frames_seen: u32,
    result: Option<RefreshEstimate>,
}

impl RefreshProbe {
    pub fn start(now: f64) -> Self {
        RefreshProbe {
            started_at: now,
            frames_seen: 0,
            result: None,
        }
    }

    /// Records a frame callback. Returns the estimate once resolved; later
    /// calls keep returning the same estimate.
    pub fn on_frame(&mut self, timestamp: f64) -> Option<RefreshEstimate> {
        if self.result.is_some() {
            return self.result;
        }
        self.frames_seen += 1;
        if self.frames_seen < PROBE_FRAMES {
            return None;
        }
        let elapsed_ms = timestamp - self.started_at;
        let hz = hz_from_elapsed(elapsed_ms);
        if hz == 0 {
            warn!(
                "RefreshProbe: degenerate probe ({} ms over {} frames)",
                elapsed_ms, PROBE_FRAMES
            );
        }
        self.result = Some(RefreshEstimate {
            hz,
            elapsed_ms,
            finished_at: timestamp,
        });
        self.result
    }

    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }
}

/// Runs a probe to completion against `clock`.
pub fn estimate_refresh<C: FrameClock + ?Sized>(
    clock: &mut C,
) -> Result<RefreshEstimate, FusionError> {
    let mut probe = RefreshProbe::start(clock.now());
    loop {
        let ts = clock.next_frame()?;
        if let Some(estimate) = probe.on_frame(ts) {
            debug!(
                "estimate_refresh: {} Hz ({:.3} ms over {} frames)",
                estimate.hz, estimate.elapsed_ms, PROBE_FRAMES
            );
            return Ok(estimate);
        }
    }
}
