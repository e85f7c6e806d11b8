//! Shared font management and caching logic.
//!
//! The `FontManager` resolves font descriptors through a `FontDriver` and
//! caches loaded faces, advance widths and rasterized glyphs. Surfaces
//! allocated by the same host share one manager, so every glyph is measured
//! and rasterized once per face.

use super::font_driver::{FontDriver, GlyphBitmap};
use crate::config::FontSpec;
use crate::error::FusionError;
use log::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Hashable identity of a `FontSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    size_bits: u32,
    path: Option<PathBuf>,
}

impl From<&FontSpec> for FontKey {
    fn from(spec: &FontSpec) -> Self {
        FontKey {
            family: spec.family.clone(),
            size_bits: spec.size_px.to_bits(),
            path: spec.path.clone(),
        }
    }
}

/// Font manager with shared caching.
///
/// Caches:
/// - Loaded faces per descriptor
/// - Advance widths per (descriptor, char)
/// - Glyph bitmaps per (descriptor, char)
pub struct FontManager<D: FontDriver> {
    driver: D,
    fonts: RefCell<HashMap<FontKey, Rc<D::Font>>>,
    advances: RefCell<HashMap<(FontKey, char), f32>>,
    glyphs: RefCell<HashMap<(FontKey, char), Rc<GlyphBitmap>>>,
}

impl<D: FontDriver> FontManager<D> {
    pub fn new(driver: D) -> Self {
        FontManager {
            driver,
            fonts: RefCell::new(HashMap::new()),
            advances: RefCell::new(HashMap::new()),
            glyphs: RefCell::new(HashMap::new()),
        }
    }

    /// Loads (or returns the cached) face for `spec`.
    pub fn resolve(&self, spec: &FontSpec) -> Result<Rc<D::Font>, FusionError> {
        let key = FontKey::from(spec);
        if let Some(font) = self.fonts.borrow().get(&key) {
            return Ok(Rc::clone(font));
        }

        info!(
            "FontManager: Loading '{}' at {} px",
            spec.family, spec.size_px
        );
        let font = self
            .driver
            .load_font(spec)
            .map(Rc::new)
            .map_err(|e| FusionError::FontUnavailable {
                family: spec.family.clone(),
                reason: format!("{:#}", e),
            })?;
        self.fonts.borrow_mut().insert(key, Rc::clone(&font));
        Ok(font)
    }

    /// Advance of a cluster: the sum of its characters' advances.
    ///
    /// Returns NaN if the face cannot be loaded; callers treat that as an
    /// unmeasurable glyph.
    pub fn advance_width(&self, spec: &FontSpec, cluster: &str) -> f32 {
        let font = match self.resolve(spec) {
            Ok(font) => font,
            Err(e) => {
                warn!("FontManager: cannot measure {:?}: {}", cluster, e);
                return f32::NAN;
            }
        };
        let key = FontKey::from(spec);
        cluster
            .chars()
            .map(|ch| {
                let cache_key = (key.clone(), ch);
                if let Some(&w) = self.advances.borrow().get(&cache_key) {
                    return w;
                }
                let w = self.driver.advance_width(&font, ch);
                trace!("FontManager: advance of '{}' (U+{:X}) = {}", ch, ch as u32, w);
                self.advances.borrow_mut().insert(cache_key, w);
                w
            })
            .sum()
    }

    /// Rasterized bitmap for one character.
    pub fn glyph(&self, spec: &FontSpec, ch: char) -> Result<Rc<GlyphBitmap>, FusionError> {
        let key = (FontKey::from(spec), ch);
        if let Some(bitmap) = self.glyphs.borrow().get(&key) {
            return Ok(Rc::clone(bitmap));
        }
        let font = self.resolve(spec)?;
        let bitmap = Rc::new(self.driver.rasterize_glyph(&font, ch));
        debug!(
            "FontManager: rasterized '{}' (U+{:X}) {}x{}",
            ch, ch as u32, bitmap.width, bitmap.height
        );
        self.glyphs.borrow_mut().insert(key, Rc::clone(&bitmap));
        Ok(bitmap)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}
