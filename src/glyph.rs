// src/glyph.rs

//! Defines `PositionedGlyph`, the unit the layout engine produces and the
//! compositor paints.

use std::fmt;

/// One visible unit of text with its top-left draw origin in surface-local
/// pixels.
///
/// The origin is the top of the em box, not the baseline: measuring and
/// painting both use that convention.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    /// The grapheme cluster (or single code point) drawn at this position.
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl PositionedGlyph {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        PositionedGlyph {
            text: text.into(),
            x,
            y,
        }
    }
}

impl fmt::Display for PositionedGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{},{}}}", self.text, self.x, self.y)
    }
}
