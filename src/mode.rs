// src/mode.rs

//! Mode Selector.
//!
//! One decision per text block, taken once the refresh probe resolves:
//! `Probing -> Fusing | Static`, both terminal. Re-deciding mid-animation
//! would mean rebuilding buffers under the viewer's eyes, so the decision is
//! never revisited.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Alternate the two glyph subsets every swap interval.
    Fusing,
    /// Paint the whole text once, opaque, and do nothing else.
    Static,
}

/// Why Static was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Twice the measured refresh rate is below the configured safe rate.
    RefreshTooLow,
    /// The host reported a reduced-motion preference.
    ReducedMotion,
    /// The probe measured no elapsed time, so there is no cadence to swap at.
    NoCadence,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::RefreshTooLow => f.write_str("refresh rate too low for safe fusion"),
            FallbackReason::ReducedMotion => f.write_str("reduced motion preferred"),
            FallbackReason::NoCadence => f.write_str("no measurable frame cadence"),
        }
    }
}

/// The outcome of mode selection for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDecision {
    pub mode: Mode,
    pub refresh_hz: u32,
    /// `2 * refresh_hz`: the swap frequency fusion would run at.
    pub safe_hz: f64,
    pub reason: Option<FallbackReason>,
}

impl ModeDecision {
    pub fn is_fusing(&self) -> bool {
        self.mode == Mode::Fusing
    }
}

/// Chooses Fusing iff `2 * refresh_hz >= min_safe_hz` and reduced motion is
/// not preferred. A zero measured rate always selects Static.
pub fn select_mode(refresh_hz: u32, min_safe_hz: f64, reduced_motion: bool) -> ModeDecision {
    let safe_hz = 2.0 * refresh_hz as f64;
    let reason = if reduced_motion {
        Some(FallbackReason::ReducedMotion)
    } else if refresh_hz == 0 {
        Some(FallbackReason::NoCadence)
    } else if safe_hz < min_safe_hz {
        Some(FallbackReason::RefreshTooLow)
    } else {
        None
    };
    ModeDecision {
        mode: if reason.is_some() {
            Mode::Static
        } else {
            Mode::Fusing
        },
        refresh_hz,
        safe_hz,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_fuse_exactly_at_the_boundary() {
        let d = select_mode(60, 120.0, false);
        assert_eq!(d.mode, Mode::Fusing);
        assert_eq!(d.safe_hz, 120.0);
        assert_eq!(d.reason, None);
    }

    #[test]
    fn it_should_fall_back_one_hertz_below_the_boundary() {
        let d = select_mode(59, 120.0, false);
        assert_eq!(d.mode, Mode::Static);
        assert_eq!(d.reason, Some(FallbackReason::RefreshTooLow));
    }

    #[test]
    fn reduced_motion_always_wins() {
        let d = select_mode(60, 120.0, true);
        assert_eq!(d.mode, Mode::Static);
        assert_eq!(d.reason, Some(FallbackReason::ReducedMotion));
        assert!(!select_mode(240, 0.0, true).is_fusing());
    }

    #[test]
    fn zero_refresh_never_fuses() {
        let d = select_mode(0, 0.0, false);
        assert_eq!(d.mode, Mode::Static);
        assert_eq!(d.reason, Some(FallbackReason::NoCadence));
    }

    #[test]
    fn high_refresh_displays_fuse() {
        assert!(select_mode(144, 120.0, false).is_fusing());
        assert!(select_mode(240, 400.0, false).is_fusing());
    }
}
