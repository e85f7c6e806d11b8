//! Real-time frame clock driven by a dedicated vsync thread.
//!
//! The thread wakes at the target rate and publishes the frame timestamp in a
//! shared slot that always holds the most recent vsync. `next_frame` waits
//! for a vsync newer than the one current at the call, so a consumer that
//! fell behind never sees a stale frame. `now` reports the time of the most
//! recent vsync, like the timestamps handed to frame callbacks.
//!
//! A wakeup that misses its deadline resyncs the schedule to the present
//! instead of emitting catch-up frames.
//!
//! TODO: Replace thread::sleep() with platform vblank notifications
//! (CVDisplayLink on macOS, DRM vblank events on Linux).

use crate::error::FusionError;
use crate::platform::platform_trait::FrameClock;
use anyhow::{Context, Result};
use log::*;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The most recent vsync.
#[derive(Debug, Default)]
struct FrameSlot {
    latest_ms: f64,
    /// Number of vsyncs published so far.
    seq: u64,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<FrameSlot>,
    frame_ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FrameSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, timestamp_ms: f64) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        slot.latest_ms = timestamp_ms;
        slot.seq += 1;
        drop(slot);
        self.frame_ready.notify_all();
        true
    }

    fn close(&self) {
        self.lock().closed = true;
        self.frame_ready.notify_all();
    }
}

/// Next wakeup after `deadline`: one period later, or right away if that is
/// already in the past.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    (deadline + period).max(now)
}

pub struct VsyncClock {
    shared: Arc<Shared>,
    thread_handle: Option<JoinHandle<()>>,
}

impl VsyncClock {
    /// Spawns the vsync thread.
    ///
    /// # Arguments
    ///
    /// * `target_fps` - Frames per second to emit (e.g., 60)
    /// * `frame_limit` - Stop after this many frames; `None` runs until dropped
    pub fn spawn(target_fps: u32, frame_limit: Option<u64>) -> Result<Self> {
        anyhow::ensure!(target_fps > 0, "vsync target must be at least 1 FPS");
        let frame_duration = Duration::from_secs_f64(1.0 / target_fps as f64);
        let epoch = Instant::now();
        let shared = Arc::new(Shared::default());
        let producer = Arc::clone(&shared);

        let thread_handle = thread::Builder::new()
            .name("vsync".to_string())
            .spawn(move || {
                info!("VsyncClock: Started (target: {} FPS)", target_fps);
                let mut sent = 0u64;
                let mut deadline = epoch;
                while frame_limit.map_or(true, |limit| sent < limit) {
                    let now = Instant::now();
                    let next = next_deadline(deadline, frame_duration, now);
                    if next > deadline + frame_duration {
                        trace!("VsyncClock: missed deadline, resyncing");
                    }
                    deadline = next;
                    if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                        thread::sleep(wait);
                    }
                    let ts = epoch.elapsed().as_secs_f64() * 1000.0;
                    if !producer.publish(ts) {
                        info!("VsyncClock: Clock closed, exiting");
                        break;
                    }
                    sent += 1;
                }
                producer.close();
                debug!("VsyncClock: Thread exiting after {} frames", sent);
            })
            .context("Failed to spawn vsync thread")?;

        Ok(Self {
            shared,
            thread_handle: Some(thread_handle),
        })
    }
}

impl FrameClock for VsyncClock {
    fn now(&self) -> f64 {
        self.shared.lock().latest_ms
    }

    fn next_frame(&mut self) -> Result<f64, FusionError> {
        let mut slot = self.shared.lock();
        let seen = slot.seq;
        while slot.seq == seen && !slot.closed {
            slot = self
                .shared
                .frame_ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if slot.seq == seen {
            return Err(FusionError::ClockStopped);
        }
        Ok(slot.latest_ms)
    }
}

impl Drop for VsyncClock {
    fn drop(&mut self) {
        debug!("VsyncClock dropped");
        self.shared.close();
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("VsyncClock thread panicked: {:?}", e);
            }
        }
    }
}
