//! Font loading, measurement and glyph rasterization primitives.
//!
//! This module defines the `FontDriver` trait: the thin layer between the
//! software rasterizer and whatever actually knows about glyph shapes (a
//! built-in bitmap face, a TrueType parser, ...).

use crate::config::FontSpec;
use anyhow::Result;

/// A rasterized glyph as coverage values.
///
/// `left`/`top` position the bitmap relative to the glyph origin, where the
/// origin is the top-left of the em box. `top` therefore already includes the
/// distance from the em top down to the glyph's highest ink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub top: i32,
    /// Row-major coverage, `width * height` bytes, 0 = empty, 255 = full.
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn coverage_at(&self, x: usize, y: usize) -> u8 {
        self.coverage[y * self.width + x]
    }
}

/// Font driver trait.
///
/// Implementors handle:
/// - Font loading from a descriptor
/// - Horizontal advance of a single character
/// - Glyph rasterization to coverage values
///
/// The `FontManager` uses this trait to implement shared caching.
pub trait FontDriver {
    /// Driver-specific loaded face.
    type Font;

    /// Load a face for the descriptor.
    ///
    /// # Returns
    /// The loaded face, or an error if the descriptor cannot be satisfied
    fn load_font(&self, spec: &FontSpec) -> Result<Self::Font>;

    /// Horizontal advance of `ch` in pixels at the face's size.
    fn advance_width(&self, font: &Self::Font, ch: char) -> f32;

    /// Rasterize `ch`, positioned relative to the top-left of the em box.
    fn rasterize_glyph(&self, font: &Self::Font, ch: char) -> GlyphBitmap;
}
