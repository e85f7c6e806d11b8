// src/platform/platform_trait.rs
//
// The capability contract the fusion engine requires from its host: raster
// surfaces that can measure and paint glyphs, surface allocation, a
// reduced-motion query, and a frame clock.

use crate::color::Rgba;
use crate::config::FontSpec;
use crate::error::FusionError;

/// Measures the horizontal advance of one visible unit of text.
///
/// Implementations may return non-finite or non-positive values for glyphs
/// they cannot measure; the layout engine treats those as zero width.
pub trait GlyphMeasure {
    fn advance_width(&self, font: &FontSpec, cluster: &str) -> f32;
}

/// A 2-D raster drawing surface.
///
/// Glyph origins use the top of the em box (baseline-at-top), the same
/// convention `GlyphMeasure` uses.
pub trait RasterSurface: GlyphMeasure {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Clears every pixel to transparent.
    fn clear(&mut self);

    /// Selects the face used by subsequent `fill_glyph` calls.
    ///
    /// Fails when the host cannot resolve the descriptor to a usable face.
    fn set_font(&mut self, font: &FontSpec) -> Result<(), FusionError>;

    fn set_fill_color(&mut self, color: Rgba);

    /// Global fill opacity in [0, 1], multiplied into every glyph drawn.
    fn set_fill_opacity(&mut self, opacity: f32);

    /// Paints `cluster` with its em box's top-left corner at `(x, y)`.
    fn fill_glyph(&mut self, cluster: &str, x: f32, y: f32);

    /// Composites `source` onto this surface at the origin.
    fn copy_from(&mut self, source: &Self);
}

/// The environment a text block is activated in.
pub trait Host {
    type Surface: RasterSurface;

    /// Allocates an off-screen (or visible) surface of the given pixel size.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, FusionError>;

    /// Whether the user asked the environment to minimise motion.
    fn prefers_reduced_motion(&self) -> bool;
}

/// Source of presentation frames.
///
/// All suspension in the engine happens inside `next_frame`; the engine never
/// waits for a fixed duration on its own.
pub trait FrameClock {
    /// Current monotonic time in milliseconds.
    fn now(&self) -> f64;

    /// Suspends until the next frame and returns its timestamp in
    /// milliseconds. Timestamps are monotonically increasing.
    fn next_frame(&mut self) -> Result<f64, FusionError>;
}
