// src/engine.rs

//! Per-block entry point.
//!
//! `activate` runs the strict per-block sequence: layout, paint both buffers,
//! probe the refresh rate, decide the mode, then either paint the static
//! fallback or hand back a ready-to-tick [`FusionHandle`]. The swap loop can
//! never start before both buffers are fully painted.

use crate::compositor::{paint_static, FusionBuffers};
use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::layout::layout;
use crate::mode::{select_mode, Mode, ModeDecision};
use crate::platform::{FrameClock, Host, RasterSurface};
use crate::refresh::estimate_refresh;
use crate::scheduler::{FrameRequest, FusionHandle};
use log::{debug, info, warn};

/// A block that fell back to a single static composite. Nothing runs after
/// activation.
#[derive(Debug)]
pub struct StaticBlock<S> {
    output: S,
    decision: ModeDecision,
    glyph_count: usize,
}

impl<S> StaticBlock<S> {
    pub fn output(&self) -> &S {
        &self.output
    }

    pub fn decision(&self) -> &ModeDecision {
        &self.decision
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    pub fn into_output(self) -> S {
        self.output
    }
}

/// The activated state of one text block.
#[derive(Debug)]
pub enum Activation<S> {
    Fusing(FusionHandle<S>),
    Static(StaticBlock<S>),
}

impl<S: RasterSurface> Activation<S> {
    /// The per-block result: `true` if fusion is active.
    pub fn is_fusing(&self) -> bool {
        matches!(self, Activation::Fusing(_))
    }

    pub fn decision(&self) -> &ModeDecision {
        match self {
            Activation::Fusing(h) => h.decision(),
            Activation::Static(s) => s.decision(),
        }
    }

    /// The visible surface.
    pub fn output(&self) -> &S {
        match self {
            Activation::Fusing(h) => h.output(),
            Activation::Static(s) => s.output(),
        }
    }

    /// Ticks the swap loop. Static blocks never request frames.
    pub fn tick(&mut self, now: f64) -> FrameRequest {
        match self {
            Activation::Fusing(h) => h.tick(now),
            Activation::Static(_) => FrameRequest::Stopped,
        }
    }

    pub fn stop(&self) {
        if let Activation::Fusing(h) = self {
            h.stop();
        }
    }

    /// Whether this block still wants frames.
    pub fn is_live(&self) -> bool {
        match self {
            Activation::Fusing(h) => !h.is_stopped(),
            Activation::Static(_) => false,
        }
    }

    /// Stops any loop and returns the output surface for re-activation.
    pub fn into_output(self) -> S {
        match self {
            Activation::Fusing(h) => h.into_output(),
            Activation::Static(s) => s.into_output(),
        }
    }
}

/// Activates fused rendering of `text` on `output`.
///
/// Errors only on environment capability failures (surface allocation, font
/// selection, a dead frame clock). Low refresh rates and reduced-motion
/// preferences produce `Activation::Static`, not an error.
pub fn activate<H, C>(
    host: &mut H,
    clock: &mut C,
    mut output: H::Surface,
    text: &str,
    config: &FusionConfig,
) -> Result<Activation<H::Surface>, FusionError>
where
    H: Host,
    C: FrameClock + ?Sized,
{
    config.validate()?;
    output.set_font(&config.font)?;

    let (width, height) = (output.width(), output.height());
    let glyphs = layout(text, width as f32, config, &output);
    debug!("activate: {} glyphs on {}x{} surface", glyphs.len(), width, height);

    let buffers = FusionBuffers::build(host, width, height, &glyphs, config)?;

    let estimate = estimate_refresh(clock)?;
    let decision = select_mode(
        estimate.hz,
        config.min_safe_hz,
        host.prefers_reduced_motion(),
    );

    match decision.mode {
        Mode::Fusing => Ok(Activation::Fusing(FusionHandle::new(
            buffers,
            output,
            decision,
            estimate.finished_at,
        ))),
        Mode::Static => {
            drop(buffers);
            paint_static(&mut output, &glyphs, config)?;
            match decision.reason {
                Some(reason) => warn!(
                    "activate: static fallback at {} Hz (min safe {} Hz): {}",
                    decision.refresh_hz, config.min_safe_hz, reason
                ),
                None => info!("activate: static fallback"),
            }
            Ok(Activation::Static(StaticBlock {
                output,
                decision,
                glyph_count: glyphs.len(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontSpec;
    use crate::mode::FallbackReason;
    use crate::platform::mock::{MockHost, ScriptedClock, SurfaceCall};
    use test_log::test;

    fn example_config() -> FusionConfig {
        FusionConfig {
            margin_x: 10.0,
            margin_y: 10.0,
            line_height: 20.0,
            glyph_gap: 2.0,
            min_safe_hz: 120.0,
            ..FusionConfig::default()
        }
    }

    fn clock_at(hz: f64) -> ScriptedClock {
        ScriptedClock::periodic(0.0, 1000.0 / hz, 64)
    }

    #[test]
    fn it_should_fuse_on_a_60hz_display() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        let mut clock = clock_at(60.0);

        let mut activation =
            activate(&mut host, &mut clock, output, "AB\nC", &example_config()).unwrap();

        assert!(activation.is_fusing());
        assert_eq!(activation.decision().refresh_hz, 60);
        // The probe consumed exactly two frames.
        assert_eq!(clock.remaining(), 62);
        // Nothing is painted on the output until the first tick.
        assert!(activation.output().painted.is_empty());

        let first = clock.next_frame().unwrap();
        assert_eq!(activation.tick(first), FrameRequest::Continue);
        let visible = activation.output().painted_text();
        assert!(visible == vec!["B"] || visible == vec!["A", "C"]);
    }

    #[test]
    fn it_should_fall_back_to_static_on_a_slow_display() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        let mut clock = clock_at(59.0);

        let mut activation =
            activate(&mut host, &mut clock, output, "AB\nC", &example_config()).unwrap();

        assert!(!activation.is_fusing());
        assert_eq!(
            activation.decision().reason,
            Some(FallbackReason::RefreshTooLow)
        );
        assert_eq!(activation.output().painted_text(), vec!["A", "B", "C"]);
        assert_eq!(activation.tick(1_000.0), FrameRequest::Stopped);
        assert!(!activation.is_live());
    }

    #[test]
    fn reduced_motion_selects_static_even_when_fast() {
        let mut host = MockHost::new(10.0);
        host.reduced_motion = true;
        let output = host.create_surface(200, 60).unwrap();
        let mut clock = clock_at(144.0);

        let activation =
            activate(&mut host, &mut clock, output, "hello", &example_config()).unwrap();
        assert!(!activation.is_fusing());
        assert_eq!(
            activation.decision().reason,
            Some(FallbackReason::ReducedMotion)
        );
    }

    #[test]
    fn buffers_are_painted_before_the_probe_starts() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        // A clock with no frames: the probe fails, but only after both buffers
        // were allocated.
        let mut clock = ScriptedClock::new(0.0, Vec::new());
        let err = activate(&mut host, &mut clock, output, "AB", &example_config()).unwrap_err();
        assert_eq!(err, FusionError::ClockStopped);
        assert_eq!(host.allocations.len(), 3);
    }

    #[test]
    fn capability_failures_surface_as_errors() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        let config = FusionConfig {
            font: FontSpec::new("missing", 16.0),
            ..example_config()
        };
        let err = activate(&mut host, &mut clock_at(60.0), output, "AB", &config).unwrap_err();
        assert!(matches!(err, FusionError::FontUnavailable { .. }));

        host.fail_allocation = Some(2);
        let output = host.create_surface(200, 60).unwrap();
        let err = activate(&mut host, &mut clock_at(60.0), output, "AB", &example_config())
            .unwrap_err();
        assert!(matches!(err, FusionError::SurfaceUnavailable { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        let config = FusionConfig {
            opacity: 2.0,
            ..example_config()
        };
        let err = activate(&mut host, &mut clock_at(60.0), output, "AB", &config).unwrap_err();
        assert!(matches!(err, FusionError::InvalidConfig(_)));
        assert_eq!(host.allocations.len(), 1);
    }

    #[test]
    fn static_fallback_uses_the_opaque_fill() {
        let mut host = MockHost::new(10.0);
        host.reduced_motion = true;
        let output = host.create_surface(200, 60).unwrap();
        let config = FusionConfig {
            opacity: 0.25,
            ..example_config()
        };
        let activation = activate(&mut host, &mut clock_at(60.0), output, "AB", &config).unwrap();
        assert!(activation
            .output()
            .calls
            .contains(&SurfaceCall::SetFillOpacity(1.0)));
        assert!(activation.output().painted.iter().all(|g| g.opacity == 1.0));
    }

    #[test]
    fn into_output_allows_manual_reactivation() {
        let mut host = MockHost::new(10.0);
        let output = host.create_surface(200, 60).unwrap();
        let mut clock = clock_at(60.0);
        let first = activate(&mut host, &mut clock, output, "AB", &example_config()).unwrap();
        assert!(first.is_fusing());

        let output = first.into_output();
        let mut slow_clock = clock_at(30.0);
        let second =
            activate(&mut host, &mut slow_clock, output, "AB", &example_config()).unwrap();
        assert!(!second.is_fusing());
        assert_eq!(second.decision().refresh_hz, 30);
    }
}
