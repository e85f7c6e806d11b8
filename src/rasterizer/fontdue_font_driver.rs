//! TrueType/OpenType font driver backed by `fontdue`.
//!
//! Faces are loaded from `FontSpec::path`; the family name is only used in
//! log and error messages.

use crate::config::FontSpec;
use crate::rasterizer::font_driver::{FontDriver, GlyphBitmap};
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;

/// A parsed face at a fixed pixel size.
pub struct FontdueFace {
    font: fontdue::Font,
    size_px: f32,
    ascent: f32,
}

impl std::fmt::Debug for FontdueFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueFace")
            .field("size_px", &self.size_px)
            .field("ascent", &self.ascent)
            .finish()
    }
}

/// Distance from the top of the em box down to the bitmap's first row.
///
/// fontdue measures `ymin` upward from the baseline, and the baseline sits
/// `ascent` below the em top.
fn top_below_em(ascent: f32, ymin: i32, height: usize) -> i32 {
    (ascent - (ymin as f32 + height as f32)).round() as i32
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FontdueFontDriver;

impl FontdueFontDriver {
    pub fn new() -> Self {
        Self
    }
}

impl FontDriver for FontdueFontDriver {
    type Font = FontdueFace;

    fn load_font(&self, spec: &FontSpec) -> Result<Self::Font> {
        let path = spec
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("no font file given for '{}'", spec.family))?;
        let data = fs::read(path)
            .with_context(|| format!("Failed to read font file {}", path.display()))?;
        let settings = fontdue::FontSettings {
            scale: spec.size_px,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(data, settings)
            .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

        let ascent = font
            .horizontal_line_metrics(spec.size_px)
            .map(|m| m.ascent)
            .unwrap_or(spec.size_px * 0.8);
        debug!(
            "FontdueFontDriver: loaded {} ({} glyphs, ascent {:.2})",
            path.display(),
            font.glyph_count(),
            ascent
        );
        Ok(FontdueFace {
            font,
            size_px: spec.size_px,
            ascent,
        })
    }

    fn advance_width(&self, font: &Self::Font, ch: char) -> f32 {
        font.font.metrics(ch, font.size_px).advance_width
    }

    fn rasterize_glyph(&self, font: &Self::Font, ch: char) -> GlyphBitmap {
        let (metrics, coverage) = font.font.rasterize(ch, font.size_px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            left: metrics.xmin,
            top: top_below_em(font.ascent, metrics.ymin, metrics.height),
            coverage,
        }
    }
}
