//! Software rasterizer.
//!
//! `PixelSurface` is an in-memory RGBA8 raster surface: glyph coverage from a
//! `FontDriver` is composited with straight-alpha source-over blending, and
//! surfaces composite onto each other the same way. A finished frame can be
//! exported as an `image::RgbaImage` or written out as a PNG.

pub mod font_driver;
pub mod font_manager;
pub mod fontdue_font_driver;
pub mod headless_font_driver;

use crate::color::Rgba;
use crate::config::FontSpec;
use crate::error::FusionError;
use crate::platform::{GlyphMeasure, RasterSurface};
use crate::rasterizer::font_driver::FontDriver;
use crate::rasterizer::font_manager::FontManager;
use anyhow::{Context, Result};
use log::{trace, warn};
use std::path::Path;
use std::rc::Rc;

const BYTES_PER_PIXEL: usize = 4;

pub struct PixelSurface<D: FontDriver> {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    fonts: Rc<FontManager<D>>,
    font: Option<FontSpec>,
    fill: Rgba,
    opacity: f32,
}

impl<D: FontDriver> std::fmt::Debug for PixelSurface<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("font", &self.font)
            .field("fill", &self.fill)
            .field("opacity", &self.opacity)
            .finish()
    }
}

impl<D: FontDriver> PixelSurface<D> {
    /// A transparent surface. Callers are expected to have validated the size.
    pub fn new(width: u32, height: u32, fonts: Rc<FontManager<D>>) -> Self {
        PixelSurface {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            fonts,
            font: None,
            fill: Rgba::opaque(0, 0, 0),
            opacity: 1.0,
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// The pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut bytes = [0u8; BYTES_PER_PIXEL];
        bytes.copy_from_slice(&self.pixels[i..i + BYTES_PER_PIXEL]);
        Some(Rgba::from_bytes(bytes))
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.to_bytes());
    }

    /// Raw row-major RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of pixels with any alpha.
    pub fn inked_pixels(&self) -> usize {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .filter(|px| px[3] != 0)
            .count()
    }

    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let image = self
            .to_image()
            .context("Surface buffer does not match its dimensions")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn blend_coverage(&mut self, x: i64, y: i64, coverage: u8) {
        if coverage == 0 || x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let i = self.offset(x, y);
        let mut bytes = [0u8; BYTES_PER_PIXEL];
        bytes.copy_from_slice(&self.pixels[i..i + BYTES_PER_PIXEL]);
        let dst = Rgba::from_bytes(bytes);
        let amount = (coverage as f32 / 255.0) * self.opacity;
        self.put_pixel(x, y, dst.blend_over(self.fill, amount));
    }
}

impl<D: FontDriver> GlyphMeasure for PixelSurface<D> {
    fn advance_width(&self, font: &FontSpec, cluster: &str) -> f32 {
        self.fonts.advance_width(font, cluster)
    }
}

impl<D: FontDriver> RasterSurface for PixelSurface<D> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn set_font(&mut self, font: &FontSpec) -> Result<(), FusionError> {
        self.fonts.resolve(font)?;
        self.font = Some(font.clone());
        Ok(())
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.fill = color;
    }

    fn set_fill_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn fill_glyph(&mut self, cluster: &str, x: f32, y: f32) {
        let Some(font) = self.font.clone() else {
            warn!("PixelSurface: fill_glyph({:?}) with no font selected", cluster);
            return;
        };
        let origin_y = y.round() as i64;
        let mut pen_x = x;
        for ch in cluster.chars() {
            let bitmap = match self.fonts.glyph(&font, ch) {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    warn!("PixelSurface: cannot draw '{}': {}", ch, e);
                    return;
                }
            };
            let left = pen_x.round() as i64 + bitmap.left as i64;
            let top = origin_y + bitmap.top as i64;
            for by in 0..bitmap.height {
                for bx in 0..bitmap.width {
                    let coverage = bitmap.coverage_at(bx, by);
                    self.blend_coverage(left + bx as i64, top + by as i64, coverage);
                }
            }
            pen_x += self.fonts.advance_width(&font, &ch.to_string());
        }
        trace!("PixelSurface: filled {:?} at ({}, {})", cluster, x, y);
    }

    fn copy_from(&mut self, source: &Self) {
        let width = self.width.min(source.width);
        let height = self.height.min(source.height);
        for y in 0..height {
            for x in 0..width {
                let src = source.pixel(x, y).unwrap_or(Rgba::TRANSPARENT);
                if src.a == 0 {
                    continue;
                }
                let dst = self.pixel(x, y).unwrap_or(Rgba::TRANSPARENT);
                self.put_pixel(x, y, dst.blend_over(src, 1.0));
            }
        }
    }
}
