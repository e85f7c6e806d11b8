// src/platform/headless.rs
//
// In-memory host: software surfaces, no window, no compositor.

use crate::error::FusionError;
use crate::platform::platform_trait::Host;
use crate::rasterizer::font_driver::FontDriver;
use crate::rasterizer::font_manager::FontManager;
use crate::rasterizer::headless_font_driver::HeadlessFontDriver;
use crate::rasterizer::PixelSurface;
use log::*;
use std::env;
use std::rc::Rc;

/// Largest width or height `HeadlessHost` will allocate by default.
pub const MAX_SURFACE_DIMENSION: u32 = 16384;

/// Largest `width * height` `HeadlessHost` will allocate by default
/// (64 MiB of RGBA8).
pub const MAX_SURFACE_PIXELS: u64 = 4096 * 4096;

/// Environment variable consulted by [`HeadlessHost::from_env`].
pub const REDUCED_MOTION_ENV: &str = "FUSION_VEIL_REDUCED_MOTION";

/// Interprets the value of [`REDUCED_MOTION_ENV`].
pub fn reduced_motion_from(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

/// Host that allocates [`PixelSurface`]s. All surfaces share one font cache.
pub struct HeadlessHost<D: FontDriver> {
    fonts: Rc<FontManager<D>>,
    reduced_motion: bool,
    max_dimension: u32,
    max_pixels: u64,
}

impl<D: FontDriver> HeadlessHost<D> {
    pub fn new(driver: D) -> Self {
        HeadlessHost {
            fonts: Rc::new(FontManager::new(driver)),
            reduced_motion: false,
            max_dimension: MAX_SURFACE_DIMENSION,
            max_pixels: MAX_SURFACE_PIXELS,
        }
    }

    /// Like `new`, with the reduced-motion preference taken from
    /// `FUSION_VEIL_REDUCED_MOTION`.
    pub fn from_env(driver: D) -> Self {
        let value = env::var(REDUCED_MOTION_ENV).ok();
        let reduced_motion = reduced_motion_from(value.as_deref());
        if reduced_motion {
            info!("HeadlessHost: reduced motion requested via {}", REDUCED_MOTION_ENV);
        }
        Self::new(driver).with_reduced_motion(reduced_motion)
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn fonts(&self) -> &Rc<FontManager<D>> {
        &self.fonts
    }
}

impl Default for HeadlessHost<HeadlessFontDriver> {
    fn default() -> Self {
        Self::new(HeadlessFontDriver::new())
    }
}

impl<D: FontDriver> Host for HeadlessHost<D> {
    type Surface = PixelSurface<D>;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, FusionError> {
        let reason = if width == 0 || height == 0 {
            Some("zero-sized surface".to_string())
        } else if width > self.max_dimension || height > self.max_dimension {
            Some(format!("exceeds {} px per side", self.max_dimension))
        } else if width as u64 * height as u64 > self.max_pixels {
            Some(format!("exceeds {} px in total", self.max_pixels))
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!(
                "HeadlessHost: refusing {}x{} surface: {}",
                width, height, reason
            );
            return Err(FusionError::SurfaceUnavailable {
                width,
                height,
                reason,
            });
        }
        trace!("HeadlessHost: allocating {}x{} surface", width, height);
        Ok(PixelSurface::new(width, height, Rc::clone(&self.fonts)))
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}
