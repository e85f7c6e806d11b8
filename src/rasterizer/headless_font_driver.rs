//! Headless font driver: a built-in 5x7 bitmap face.
//!
//! Needs no system fonts, so it works in CI and in the demo binary. Glyphs
//! sit in an 8-row em cell (7 ink rows plus one descender row) scaled with
//! nearest-neighbour sampling to the requested pixel size. Lowercase letters
//! reuse the uppercase shapes. Characters outside the table render as a
//! hollow box.

use crate::config::FontSpec;
use crate::rasterizer::font_driver::{FontDriver, GlyphBitmap};
use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const CELL_COLUMNS: f32 = 5.0;
const CELL_ROWS: f32 = 8.0;
const INK_ROWS: usize = 7;

/// One row per entry, bit 4 is the leftmost column.
type Rows = [u8; INK_ROWS];

const MISSING_GLYPH: Rows = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

#[rustfmt::skip]
const GLYPH_ROWS: &[(char, Rows)] = &[
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('?', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('\'', [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00]),
    ('"', [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    (';', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('/', [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00]),
    ('=', [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F]),
    ('*', [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00]),
    ('#', [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A]),
    ('&', [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D]),
    ('@', [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E]),
];

static FACE: Lazy<HashMap<char, Rows>> = Lazy::new(|| GLYPH_ROWS.iter().copied().collect());

/// Combining diacritical marks take no horizontal space and draw nothing.
fn is_zero_width(ch: char) -> bool {
    ch.is_control() || ('\u{300}'..='\u{36F}').contains(&ch) || ch == '\u{200D}'
}

fn rows_for(ch: char) -> Rows {
    let upper = ch.to_ascii_uppercase();
    FACE.get(&upper).copied().unwrap_or(MISSING_GLYPH)
}

/// A loaded headless face: just the em size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessFace {
    pub size_px: f32,
}

impl HeadlessFace {
    fn scale(&self) -> f32 {
        self.size_px / CELL_ROWS
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessFontDriver;

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self
    }
}

impl FontDriver for HeadlessFontDriver {
    type Font = HeadlessFace;

    fn load_font(&self, spec: &FontSpec) -> Result<Self::Font> {
        if !spec.size_px.is_finite() || spec.size_px <= 0.0 {
            bail!("unusable em size {}", spec.size_px);
        }
        Ok(HeadlessFace {
            size_px: spec.size_px,
        })
    }

    fn advance_width(&self, font: &Self::Font, ch: char) -> f32 {
        if is_zero_width(ch) {
            0.0
        } else {
            CELL_COLUMNS * font.scale()
        }
    }

    fn rasterize_glyph(&self, font: &Self::Font, ch: char) -> GlyphBitmap {
        if is_zero_width(ch) {
            return GlyphBitmap::empty();
        }
        let scale = font.scale();
        let width = (CELL_COLUMNS * scale).round().max(1.0) as usize;
        let height = (INK_ROWS as f32 * scale).round().max(1.0) as usize;
        let rows = rows_for(ch);

        let mut coverage = vec![0u8; width * height];
        for py in 0..height {
            let row = ((py as f32 / scale) as usize).min(INK_ROWS - 1);
            for px in 0..width {
                let col = ((px as f32 / scale) as usize).min(CELL_COLUMNS as usize - 1);
                if rows[row] & (0x10 >> col) != 0 {
                    coverage[py * width + px] = 255;
                }
            }
        }

        GlyphBitmap {
            width,
            height,
            left: 0,
            top: 0,
            coverage,
        }
    }
}
