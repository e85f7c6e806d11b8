// src/config.rs

//! Defines the configuration for a fused text block.
//!
//! `FusionConfig` is an immutable value: build it once, validate it, and hand
//! it to `activate`/`render_batch`. Callers that only care about a few fields
//! describe them in a `FusionConfigPatch`, which is merged over defaults field
//! by field. Configuration files are JSON patches.

use crate::color::Color;
use crate::error::FusionError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Describes the face glyphs are measured and painted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    /// Family name. Informational for drivers that load by path.
    pub family: String,
    /// Em size in pixels.
    pub size_px: f32,
    /// Optional font file for drivers that rasterize real outlines.
    pub path: Option<PathBuf>,
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec {
            family: "monospace".to_string(),
            size_px: 16.0,
            path: None,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        FontSpec {
            family: family.into(),
            size_px,
            path: None,
        }
    }
}

/// How the layout engine splits text into visible units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    /// Extended grapheme clusters: combining marks stay with their base.
    #[default]
    Grapheme,
    /// One unit per Unicode scalar value.
    CodePoint,
}

/// Complete configuration for one text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub font: FontSpec,
    /// Fill colour of both glyph subsets.
    pub color: Color,
    /// Fill opacity of both glyph subsets, in [0, 1].
    pub opacity: f32,
    /// Lowest swap frequency (Hz) considered safe to fuse.
    pub min_safe_hz: f64,
    pub margin_x: f32,
    pub margin_y: f32,
    pub line_height: f32,
    /// Horizontal gap added after every glyph advance.
    pub glyph_gap: f32,
    /// Fill used for the un-split static fallback; always painted opaque.
    /// Defaults to pure black, darker than the default fusion fill.
    pub static_color: Color,
    pub segmentation: Segmentation,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            font: FontSpec::default(),
            color: Color::Rgb(0x44, 0x44, 0x44),
            opacity: 1.0,
            min_safe_hz: 120.0,
            margin_x: 10.0,
            margin_y: 10.0,
            line_height: 20.0,
            glyph_gap: 2.0,
            static_color: Color::Rgb(0, 0, 0),
            segmentation: Segmentation::Grapheme,
        }
    }
}

/// A partial configuration; `None` fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfigPatch {
    pub font: Option<FontSpec>,
    pub color: Option<Color>,
    pub opacity: Option<f32>,
    pub min_safe_hz: Option<f64>,
    pub margin_x: Option<f32>,
    pub margin_y: Option<f32>,
    pub line_height: Option<f32>,
    pub glyph_gap: Option<f32>,
    pub static_color: Option<Color>,
    pub segmentation: Option<Segmentation>,
}

impl FusionConfig {
    /// Returns a copy of `self` with every field set in `patch` replaced.
    pub fn merged(&self, patch: &FusionConfigPatch) -> FusionConfig {
        let mut out = self.clone();
        if let Some(font) = &patch.font {
            out.font = font.clone();
        }
        if let Some(color) = patch.color {
            out.color = color;
        }
        if let Some(opacity) = patch.opacity {
            out.opacity = opacity;
        }
        if let Some(hz) = patch.min_safe_hz {
            out.min_safe_hz = hz;
        }
        if let Some(v) = patch.margin_x {
            out.margin_x = v;
        }
        if let Some(v) = patch.margin_y {
            out.margin_y = v;
        }
        if let Some(v) = patch.line_height {
            out.line_height = v;
        }
        if let Some(v) = patch.glyph_gap {
            out.glyph_gap = v;
        }
        if let Some(color) = patch.static_color {
            out.static_color = color;
        }
        if let Some(seg) = patch.segmentation {
            out.segmentation = seg;
        }
        out
    }

    /// Defaults with `patch` applied, validated.
    pub fn from_patch(patch: &FusionConfigPatch) -> Result<FusionConfig, FusionError> {
        let config = FusionConfig::default().merged(patch);
        config.validate()?;
        Ok(config)
    }

    /// Checks the value invariants: opacity in [0, 1], spatial fields finite
    /// and non-negative, a positive font size.
    pub fn validate(&self) -> Result<(), FusionError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(FusionError::InvalidConfig(format!(
                "opacity {} outside [0, 1]",
                self.opacity
            )));
        }
        let spatial = [
            ("margin_x", self.margin_x),
            ("margin_y", self.margin_y),
            ("line_height", self.line_height),
            ("glyph_gap", self.glyph_gap),
        ];
        for (name, value) in spatial {
            if !value.is_finite() || value < 0.0 {
                return Err(FusionError::InvalidConfig(format!(
                    "{} must be a finite value >= 0, got {}",
                    name, value
                )));
            }
        }
        if !self.font.size_px.is_finite() || self.font.size_px <= 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "font size must be positive, got {}",
                self.font.size_px
            )));
        }
        if !self.min_safe_hz.is_finite() || self.min_safe_hz < 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "min_safe_hz must be a finite value >= 0, got {}",
                self.min_safe_hz
            )));
        }
        Ok(())
    }

    /// Loads a JSON patch from `path` and merges it over defaults.
    pub fn load(path: &Path) -> Result<FusionConfig> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let patch: FusionConfigPatch = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        let config = FusionConfig::from_patch(&patch)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        log::info!("Loaded fusion config from {}", path.display());
        Ok(config)
    }
}
