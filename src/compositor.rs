// src/compositor.rs

//! Buffer Compositor.
//!
//! Splits a laid-out text block into two glyph subsets by index parity and
//! paints each subset into its own render target, once. The interleave is
//! positional only (never by word or line), so neither target holds a run of
//! adjacent glyphs long enough to read.
//!
//! Targets are never repainted after [`FusionBuffers::build`]; the swap loop
//! only reads them.

use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::glyph::PositionedGlyph;
use crate::platform::{Host, RasterSurface};
use log::debug;

/// Which of the two render targets a glyph belongs to, or which one is
/// currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    /// Even glyph indices.
    #[default]
    A,
    /// Odd glyph indices.
    B,
}

impl Parity {
    pub fn of_index(index: usize) -> Parity {
        if index % 2 == 0 {
            Parity::A
        } else {
            Parity::B
        }
    }

    pub fn toggled(self) -> Parity {
        match self {
            Parity::A => Parity::B,
            Parity::B => Parity::A,
        }
    }
}

/// The glyphs assigned to `parity`, in source order.
pub fn subset(
    glyphs: &[PositionedGlyph],
    parity: Parity,
) -> impl Iterator<Item = &PositionedGlyph> + '_ {
    glyphs
        .iter()
        .enumerate()
        .filter(move |(i, _)| Parity::of_index(*i) == parity)
        .map(|(_, g)| g)
}

/// The pair of pre-rendered targets for one text block.
#[derive(Debug)]
pub struct FusionBuffers<S> {
    a: S,
    b: S,
}

impl<S: RasterSurface> FusionBuffers<S> {
    /// Allocates two `width` x `height` targets from `host` and paints the even
    /// subset into A and the odd subset into B.
    ///
    /// Either allocation or font selection failing aborts the build; nothing
    /// partially painted is returned.
    pub fn build<H>(
        host: &mut H,
        width: u32,
        height: u32,
        glyphs: &[PositionedGlyph],
        config: &FusionConfig,
    ) -> Result<Self, FusionError>
    where
        H: Host<Surface = S>,
    {
        let mut a = host.create_surface(width, height)?;
        let mut b = host.create_surface(width, height)?;
        paint_subset(&mut a, glyphs, Parity::A, config)?;
        paint_subset(&mut b, glyphs, Parity::B, config)?;
        debug!(
            "FusionBuffers: painted {} glyphs into A, {} into B ({}x{})",
            glyphs.len().div_ceil(2),
            glyphs.len() / 2,
            width,
            height
        );
        Ok(FusionBuffers { a, b })
    }

    pub fn target(&self, parity: Parity) -> &S {
        match parity {
            Parity::A => &self.a,
            Parity::B => &self.b,
        }
    }
}

fn paint_subset<S: RasterSurface>(
    target: &mut S,
    glyphs: &[PositionedGlyph],
    parity: Parity,
    config: &FusionConfig,
) -> Result<(), FusionError> {
    target.clear();
    target.set_font(&config.font)?;
    target.set_fill_color(config.color.to_rgba());
    target.set_fill_opacity(config.opacity);
    for glyph in subset(glyphs, parity) {
        target.fill_glyph(&glyph.text, glyph.x, glyph.y);
    }
    Ok(())
}

/// Paints the whole, un-split glyph sequence onto `surface` with the opaque
/// fallback fill. Used when fusion is unsafe or unwanted.
pub fn paint_static<S: RasterSurface>(
    surface: &mut S,
    glyphs: &[PositionedGlyph],
    config: &FusionConfig,
) -> Result<(), FusionError> {
    surface.clear();
    surface.set_font(&config.font)?;
    surface.set_fill_color(config.static_color.to_rgba());
    surface.set_fill_opacity(1.0);
    for glyph in glyphs {
        surface.fill_glyph(&glyph.text, glyph.x, glyph.y);
    }
    Ok(())
}
