// src/layout.rs
//
// Glyph Layout Engine
//
// Turns a string into positioned glyphs with a simple cursor: explicit
// newlines and right-margin overflow both move the cursor to the next line.
// Layout is a pure function of (text, width, config, measurer) so it can be
// run once for sizing and again for painting with identical results.

use crate::config::{FusionConfig, Segmentation};
use crate::glyph::PositionedGlyph;
use crate::platform::GlyphMeasure;
use log::{trace, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Lays out `text` for a surface `surface_width` pixels wide.
///
/// Every visible unit (grapheme cluster or code point, per
/// `config.segmentation`) yields exactly one glyph, in source order. Newlines
/// yield none. A unit that would cross `surface_width - margin_x` wraps first,
/// unless the cursor is already at the left margin, in which case it is placed
/// there and allowed to overflow.
pub fn layout<M: GlyphMeasure + ?Sized>(
    text: &str,
    surface_width: f32,
    config: &FusionConfig,
    measure: &M,
) -> Vec<PositionedGlyph> {
    let right_edge = surface_width - config.margin_x;
    let mut glyphs = Vec::new();
    let mut x = config.margin_x;
    let mut y = config.margin_y;

    for unit in units(text, config.segmentation) {
        if is_newline(unit) {
            x = config.margin_x;
            y += config.line_height;
            continue;
        }

        let width = sanitize_width(unit, measure.advance_width(&config.font, unit));
        if x + width > right_edge && x > config.margin_x {
            x = config.margin_x;
            y += config.line_height;
        }

        trace!("layout: '{}' at ({}, {}) width {}", unit, x, y, width);
        glyphs.push(PositionedGlyph::new(unit, x, y));
        x += width + config.glyph_gap;
    }

    glyphs
}

/// Pixel height needed to show `glyphs` with the configured margins.
///
/// An empty layout still gets one blank line so the surface is never empty.
pub fn surface_height(glyphs: &[PositionedGlyph], config: &FusionConfig) -> u32 {
    let last_line_top = glyphs
        .iter()
        .map(|g| g.y)
        .fold(config.margin_y, f32::max);
    let height = last_line_top + config.line_height + config.margin_y;
    height.ceil().max(1.0) as u32
}

fn units(text: &str, segmentation: Segmentation) -> Box<dyn Iterator<Item = &str> + '_> {
    match segmentation {
        Segmentation::Grapheme => Box::new(text.graphemes(true)),
        Segmentation::CodePoint => {
            // "\r\n" stays one unit so it is a single newline here too.
            let mut rest = text;
            Box::new(std::iter::from_fn(move || {
                let c = rest.chars().next()?;
                let len = if rest.starts_with("\r\n") {
                    2
                } else {
                    c.len_utf8()
                };
                let (unit, tail) = rest.split_at(len);
                rest = tail;
                Some(unit)
            }))
        }
    }
}

fn is_newline(unit: &str) -> bool {
    unit == "\n" || unit == "\r\n"
}

fn sanitize_width(unit: &str, width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        if width != 0.0 {
            warn!(
                "layout: advance width {} for {:?} is not usable, treating as zero",
                width, unit
            );
        }
        0.0
    }
}
