// src/platform/mock.rs
//
// Test doubles for the host capability contract. Surfaces record every call
// and keep a symbolic model of what is currently painted on them, so tests can
// assert on "what a screenshot would see" without real pixels.

use crate::color::Rgba;
use crate::config::FontSpec;
use crate::error::FusionError;
use crate::platform::platform_trait::{FrameClock, GlyphMeasure, Host, RasterSurface};
use std::collections::VecDeque;

/// Measures every cluster with the same advance.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f32);

impl GlyphMeasure for FixedAdvance {
    fn advance_width(&self, _font: &FontSpec, _cluster: &str) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Clear,
    SetFont(String),
    SetFillColor(Rgba),
    SetFillOpacity(f32),
    FillGlyph { text: String, x: f32, y: f32 },
    CopyFrom { source: usize },
}

/// A glyph as it currently appears on a recording surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedGlyph {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Rgba,
    pub opacity: f32,
}

#[derive(Debug)]
pub struct RecordingSurface {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub advance: f32,
    pub calls: Vec<SurfaceCall>,
    pub painted: Vec<PaintedGlyph>,
    fill: Rgba,
    opacity: f32,
    font_loaded: bool,
}

impl RecordingSurface {
    pub fn new(id: usize, width: u32, height: u32, advance: f32) -> Self {
        RecordingSurface {
            id,
            width,
            height,
            advance,
            calls: Vec::new(),
            painted: Vec::new(),
            fill: Rgba::opaque(0, 0, 0),
            opacity: 1.0,
            font_loaded: false,
        }
    }

    pub fn painted_text(&self) -> Vec<&str> {
        self.painted.iter().map(|g| g.text.as_str()).collect()
    }

    pub fn copies(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::CopyFrom { source } => Some(*source),
                _ => None,
            })
            .collect()
    }
}

impl GlyphMeasure for RecordingSurface {
    fn advance_width(&self, _font: &FontSpec, _cluster: &str) -> f32 {
        self.advance
    }
}

impl RasterSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.calls.push(SurfaceCall::Clear);
        self.painted.clear();
    }

    fn set_font(&mut self, font: &FontSpec) -> Result<(), FusionError> {
        self.calls.push(SurfaceCall::SetFont(font.family.clone()));
        if font.family == "missing" {
            return Err(FusionError::FontUnavailable {
                family: font.family.clone(),
                reason: "not installed".to_string(),
            });
        }
        self.font_loaded = true;
        Ok(())
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.calls.push(SurfaceCall::SetFillColor(color));
        self.fill = color;
    }

    fn set_fill_opacity(&mut self, opacity: f32) {
        self.calls.push(SurfaceCall::SetFillOpacity(opacity));
        self.opacity = opacity;
    }

    fn fill_glyph(&mut self, cluster: &str, x: f32, y: f32) {
        assert!(self.font_loaded, "fill_glyph before set_font");
        self.calls.push(SurfaceCall::FillGlyph {
            text: cluster.to_string(),
            x,
            y,
        });
        self.painted.push(PaintedGlyph {
            text: cluster.to_string(),
            x,
            y,
            color: self.fill,
            opacity: self.opacity,
        });
    }

    fn copy_from(&mut self, source: &Self) {
        self.calls.push(SurfaceCall::CopyFrom { source: source.id });
        self.painted.extend(source.painted.iter().cloned());
    }
}

/// Hands out recording surfaces; can be told to refuse an allocation.
#[derive(Debug)]
pub struct MockHost {
    pub advance: f32,
    pub reduced_motion: bool,
    /// Zero-based index of the allocation that should fail, if any.
    pub fail_allocation: Option<usize>,
    pub allocations: Vec<(u32, u32)>,
}

impl MockHost {
    pub fn new(advance: f32) -> Self {
        MockHost {
            advance,
            reduced_motion: false,
            fail_allocation: None,
            allocations: Vec::new(),
        }
    }
}

impl Host for MockHost {
    type Surface = RecordingSurface;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<RecordingSurface, FusionError> {
        let index = self.allocations.len();
        self.allocations.push((width, height));
        if self.fail_allocation == Some(index) {
            return Err(FusionError::SurfaceUnavailable {
                width,
                height,
                reason: "mock refused allocation".to_string(),
            });
        }
        Ok(RecordingSurface::new(index, width, height, self.advance))
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

/// Replays a fixed list of frame timestamps.
#[derive(Debug)]
pub struct ScriptedClock {
    now: f64,
    frames: VecDeque<f64>,
}

impl ScriptedClock {
    pub fn new(start: f64, frames: impl IntoIterator<Item = f64>) -> Self {
        ScriptedClock {
            now: start,
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames every `period` ms after `start`, `count` of them.
    pub fn periodic(start: f64, period: f64, count: usize) -> Self {
        Self::new(start, (1..=count).map(|i| start + period * i as f64))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameClock for ScriptedClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn next_frame(&mut self) -> Result<f64, FusionError> {
        let ts = self.frames.pop_front().ok_or(FusionError::ClockStopped)?;
        self.now = ts;
        Ok(ts)
    }
}
