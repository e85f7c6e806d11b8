// src/lib.rs

//! Temporal fusion text rendering.
//!
//! A block of text is laid out once, its glyphs are split by index parity into
//! two off-screen buffers, and the visible surface alternates between them
//! fast enough that a viewer perceives the whole text while any single frame
//! capture holds only half of it. Displays too slow for that, and users who
//! ask for reduced motion, get a plain static rendering instead.
//!
//! ```no_run
//! use fusion_veil::platform::{HeadlessHost, SimulatedClock};
//! use fusion_veil::rasterizer::headless_font_driver::HeadlessFontDriver;
//! use fusion_veil::{render_batch, FusionConfig};
//!
//! # fn main() -> Result<(), fusion_veil::FusionError> {
//! let mut host = HeadlessHost::new(HeadlessFontDriver::new());
//! let mut clock = SimulatedClock::new(60.0).with_frame_limit(120);
//! let mut batch = render_batch(&mut host, &mut clock, 320, &["AB\nC"], &FusionConfig::default())?;
//! batch.run(&mut clock)?;
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod glyph;
pub mod layout;
pub mod mode;
pub mod orchestrator;
pub mod platform;
pub mod rasterizer;
pub mod refresh;
pub mod scheduler;

pub use color::{Color, NamedColor, Rgba};
pub use config::{FontSpec, FusionConfig, FusionConfigPatch, Segmentation};
pub use engine::{activate, Activation, StaticBlock};
pub use error::FusionError;
pub use glyph::PositionedGlyph;
pub use mode::{select_mode, FallbackReason, Mode, ModeDecision};
pub use orchestrator::{render_batch, Batch};
pub use scheduler::{FrameRequest, FusionHandle, ScheduleState, StopHandle};
