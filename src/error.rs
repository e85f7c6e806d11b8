// src/error.rs

//! Error type for the fusion engine.
//!
//! Only environment capability failures are errors. Measurement anomalies are
//! absorbed by the layout engine and a degraded environment is reported through
//! the activation result, never through `Err`.

use std::fmt;

/// Error returned when the host cannot provide what a text block needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionError {
    /// The host refused to allocate a raster surface of the given size.
    SurfaceUnavailable {
        width: u32,
        height: u32,
        reason: String,
    },
    /// The font descriptor could not be resolved to a usable face.
    FontUnavailable { family: String, reason: String },
    /// A configuration value violates its invariant.
    InvalidConfig(String),
    /// The frame clock stopped delivering frames.
    ClockStopped,
    /// A block inside a batch failed; `index` is its position in the input.
    Block {
        index: usize,
        source: Box<FusionError>,
    },
}

impl fmt::Display for FusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionError::SurfaceUnavailable {
                width,
                height,
                reason,
            } => write!(f, "cannot allocate {}x{} surface: {}", width, height, reason),
            FusionError::FontUnavailable { family, reason } => {
                write!(f, "font '{}' unavailable: {}", family, reason)
            }
            FusionError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            FusionError::ClockStopped => write!(f, "frame clock stopped delivering frames"),
            FusionError::Block { index, source } => write!(f, "block {}: {}", index, source),
        }
    }
}

impl std::error::Error for FusionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FusionError::Block { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
