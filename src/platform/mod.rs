// src/platform/mod.rs
//
// This module re-exports the host capability contract and the hosts and
// frame clocks shipped with the crate.

pub mod clock;
pub mod headless;
pub mod platform_trait;
pub mod vsync_clock;

#[cfg(test)]
pub mod mock;

pub use clock::SimulatedClock;
pub use headless::HeadlessHost;
pub use platform_trait::{FrameClock, GlyphMeasure, Host, RasterSurface};
pub use vsync_clock::VsyncClock;
