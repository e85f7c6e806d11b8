// src/scheduler.rs

//! Fusion Scheduler / swap loop.
//!
//! Each frame tick: toggle which buffer is visible if a swap interval has
//! elapsed, clear the output, copy the visible buffer onto it, and ask for the
//! next frame. The schedule itself is a plain value ([`ScheduleState`]) with a
//! pure step function so cadence can be tested with synthetic timestamps.
//!
//! The loop never ends by itself. It ends when the host stops delivering
//! frames or when its [`StopHandle`] is triggered.

use crate::compositor::{FusionBuffers, Parity};
use crate::error::FusionError;
use crate::mode::ModeDecision;
use crate::platform::{FrameClock, RasterSurface};
use log::{debug, info, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which buffer is visible and when it last changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    pub parity: Parity,
    pub last_swap: f64,
    /// Fixed for the lifetime of an active block.
    pub swap_interval_ms: f64,
}

impl ScheduleState {
    /// Swapping at twice the refresh rate: `1000 / (2 * hz)` ms.
    pub fn swap_interval_for(refresh_hz: u32) -> f64 {
        if refresh_hz == 0 {
            f64::INFINITY
        } else {
            1000.0 / (2.0 * refresh_hz as f64)
        }
    }

    pub fn new(refresh_hz: u32, started_at: f64) -> Self {
        ScheduleState {
            parity: Parity::A,
            last_swap: started_at,
            swap_interval_ms: Self::swap_interval_for(refresh_hz),
        }
    }

    /// Advances the schedule to `now`.
    ///
    /// At most one toggle happens per call, however late `now` is: a delayed
    /// frame that spans several intervals still flips parity only once.
    #[must_use]
    pub fn step(self, now: f64) -> ScheduleState {
        if now - self.last_swap >= self.swap_interval_ms {
            ScheduleState {
                parity: self.parity.toggled(),
                last_swap: now,
                ..self
            }
        } else {
            self
        }
    }
}

/// Cancels a fusing block's frame loop. Cheap to clone, safe to send to
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a tick asks of the host's frame scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// Invoke again on the next frame.
    Continue,
    /// Do not invoke again.
    Stopped,
}

/// A text block in Fusing mode: its two painted buffers, the visible output
/// surface, and the schedule driving them.
#[derive(Debug)]
pub struct FusionHandle<S> {
    buffers: FusionBuffers<S>,
    output: S,
    state: ScheduleState,
    decision: ModeDecision,
    stop: StopHandle,
    swaps: u64,
}

impl<S: RasterSurface> FusionHandle<S> {
    pub(crate) fn new(
        buffers: FusionBuffers<S>,
        output: S,
        decision: ModeDecision,
        started_at: f64,
    ) -> Self {
        let state = ScheduleState::new(decision.refresh_hz, started_at);
        info!(
            "FusionHandle: fusing at {} Hz refresh, swapping every {:.3} ms",
            decision.refresh_hz, state.swap_interval_ms
        );
        FusionHandle {
            buffers,
            output,
            state,
            decision,
            stop: StopHandle::new(),
            swaps: 0,
        }
    }

    /// Runs one frame of the swap loop at timestamp `now`.
    pub fn tick(&mut self, now: f64) -> FrameRequest {
        if self.stop.is_stopped() {
            return FrameRequest::Stopped;
        }
        let next = self.state.step(now);
        if next.parity != self.state.parity {
            self.swaps += 1;
            trace!("FusionHandle: swap to {:?} at {:.3}", next.parity, now);
        }
        self.state = next;

        self.output.clear();
        self.output.copy_from(self.buffers.target(self.state.parity));
        FrameRequest::Continue
    }

    /// Drives [`tick`](Self::tick) from `clock` until stopped or until the
    /// clock stops delivering frames.
    pub fn run<C: FrameClock + ?Sized>(&mut self, clock: &mut C) -> Result<(), FusionError> {
        loop {
            if self.stop.is_stopped() {
                debug!("FusionHandle: stopped after {} swaps", self.swaps);
                return Ok(());
            }
            let now = match clock.next_frame() {
                Ok(ts) => ts,
                Err(FusionError::ClockStopped) => {
                    info!("FusionHandle: frame clock ended after {} swaps", self.swaps);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            if self.tick(now) == FrameRequest::Stopped {
                return Ok(());
            }
        }
    }

    /// Stops further frame requests. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// A handle that stops this block from elsewhere (another thread, a UI
    /// callback).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn output(&self) -> &S {
        &self.output
    }

    pub fn buffer(&self, parity: Parity) -> &S {
        self.buffers.target(parity)
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn decision(&self) -> &ModeDecision {
        &self.decision
    }

    /// Number of parity toggles so far.
    pub fn swap_count(&self) -> u64 {
        self.swaps
    }

    /// Stops the loop and hands back the output surface, e.g. to activate it
    /// again after the display's refresh rate changed.
    pub fn into_output(self) -> S {
        self.stop.stop();
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::glyph::PositionedGlyph;
    use crate::mode::select_mode;
    use crate::platform::mock::{MockHost, RecordingSurface, ScriptedClock, SurfaceCall};
    use crate::platform::Host;
    use test_log::test;

    fn count_toggles(mut state: ScheduleState, timestamps: impl IntoIterator<Item = f64>) -> u64 {
        let mut toggles = 0;
        for now in timestamps {
            let next = state.step(now);
            if next.parity != state.parity {
                toggles += 1;
            }
            state = next;
        }
        toggles
    }

    fn handle(refresh_hz: u32) -> FusionHandle<RecordingSurface> {
        let config = FusionConfig::default();
        let glyphs = vec![
            PositionedGlyph::new("A", 10.0, 10.0),
            PositionedGlyph::new("B", 22.0, 10.0),
            PositionedGlyph::new("C", 10.0, 30.0),
        ];
        let mut host = MockHost::new(10.0);
        let buffers = FusionBuffers::build(&mut host, 100, 60, &glyphs, &config).unwrap();
        let output = host.create_surface(100, 60).unwrap();
        FusionHandle::new(buffers, output, select_mode(refresh_hz, 120.0, false), 0.0)
    }

    #[test]
    fn swap_interval_is_half_a_refresh_period() {
        assert_eq!(ScheduleState::swap_interval_for(125), 4.0);
        assert!((ScheduleState::swap_interval_for(60) - 8.333_333).abs() < 1e-3);
        assert!(ScheduleState::swap_interval_for(0).is_infinite());
    }

    #[test]
    fn step_toggles_on_greater_or_equal() {
        let state = ScheduleState {
            parity: Parity::A,
            last_swap: 0.0,
            swap_interval_ms: 8.0,
        };
        assert_eq!(state.step(7.999), state);
        let swapped = state.step(8.0);
        assert_eq!(swapped.parity, Parity::B);
        assert_eq!(swapped.last_swap, 8.0);
        assert_eq!(swapped.swap_interval_ms, 8.0);
    }

    #[test]
    fn it_should_toggle_floor_of_duration_over_interval_times() {
        // interval 8 ms (62.5 Hz refresh is not integral, so build by hand).
        let state = ScheduleState {
            parity: Parity::A,
            last_swap: 0.0,
            swap_interval_ms: 8.0,
        };
        for (delta, duration) in [(1.0, 1000.0), (2.0, 1000.0), (4.0, 333.0), (0.5, 97.0)] {
            let frames = (duration / delta) as usize;
            let toggles = count_toggles(state, (1..=frames).map(|i| i as f64 * delta));
            let expected = (duration / state.swap_interval_ms).floor() as i64;
            assert!(
                (toggles as i64 - expected).abs() <= 1,
                "delta {} duration {}: {} toggles, expected {}",
                delta,
                duration,
                toggles,
                expected
            );
        }
    }

    #[test]
    fn delayed_frame_toggles_only_once() {
        let state = ScheduleState::new(125, 0.0);
        let late = state.step(100.0);
        assert_eq!(late.parity, Parity::B);
        assert_eq!(late.last_swap, 100.0);
        assert_eq!(late.step(103.9).parity, Parity::B);
        assert_eq!(late.step(104.0).parity, Parity::A);
    }

    #[test]
    fn it_should_clear_then_copy_the_visible_buffer_each_tick() {
        let mut h = handle(125); // 4 ms interval
        assert_eq!(h.tick(2.0), FrameRequest::Continue);
        assert_eq!(h.output().painted_text(), vec!["A", "C"]);
        assert_eq!(h.tick(4.0), FrameRequest::Continue);
        assert_eq!(h.output().painted_text(), vec!["B"]);
        assert_eq!(h.tick(8.0), FrameRequest::Continue);
        assert_eq!(h.output().painted_text(), vec!["A", "C"]);

        let calls = &h.output().calls;
        assert_eq!(calls[0], SurfaceCall::Clear);
        assert!(matches!(calls[1], SurfaceCall::CopyFrom { .. }));
        assert_eq!(h.swap_count(), 2);
        // A and B are allocated first, so they carry ids 0 and 1.
        assert_eq!(h.output().copies(), vec![0, 1, 0]);
    }

    #[test]
    fn no_capture_ever_holds_both_subsets() {
        let mut h = handle(60);
        for i in 0..50 {
            h.tick(i as f64 * 1000.0 / 60.0);
            let visible = h.output().painted_text();
            assert!(visible == vec!["A", "C"] || visible == vec!["B"], "{:?}", visible);
        }
    }

    #[test]
    fn stopped_handle_never_paints_again() {
        let mut h = handle(125);
        h.tick(1.0);
        let stop = h.stop_handle();
        stop.stop();
        let calls_before = h.output().calls.len();
        assert_eq!(h.tick(50.0), FrameRequest::Stopped);
        assert_eq!(h.output().calls.len(), calls_before);
        assert!(h.is_stopped());
    }

    #[test]
    fn run_ends_when_the_clock_ends() {
        let mut h = handle(125);
        let mut clock = ScriptedClock::periodic(0.0, 4.0, 10);
        h.run(&mut clock).unwrap();
        assert_eq!(clock.remaining(), 0);
        assert_eq!(h.swap_count(), 10);
    }

    #[test]
    fn run_returns_immediately_when_already_stopped() {
        let mut h = handle(125);
        h.stop();
        let mut clock = ScriptedClock::periodic(0.0, 4.0, 10);
        h.run(&mut clock).unwrap();
        assert_eq!(clock.remaining(), 10);
    }

    #[test]
    fn into_output_stops_the_loop_and_returns_the_surface() {
        let h = handle(125);
        let stop = h.stop_handle();
        let output = h.into_output();
        assert!(stop.is_stopped());
        assert_eq!(output.id, 2);
    }
}
