// src/color.rs

//! Colour types used for glyph fills.
//!
//! `Color` is what configuration speaks (`"#rrggbb"` or an ANSI colour name),
//! `Rgba` is what the rasterizer blends with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard ANSI named colors (indices 0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

const NAMED_COLORS: [(&str, NamedColor); 16] = [
    ("black", NamedColor::Black),
    ("red", NamedColor::Red),
    ("green", NamedColor::Green),
    ("yellow", NamedColor::Yellow),
    ("blue", NamedColor::Blue),
    ("magenta", NamedColor::Magenta),
    ("cyan", NamedColor::Cyan),
    ("white", NamedColor::White),
    ("bright_black", NamedColor::BrightBlack),
    ("bright_red", NamedColor::BrightRed),
    ("bright_green", NamedColor::BrightGreen),
    ("bright_yellow", NamedColor::BrightYellow),
    ("bright_blue", NamedColor::BrightBlue),
    ("bright_magenta", NamedColor::BrightMagenta),
    ("bright_cyan", NamedColor::BrightCyan),
    ("bright_white", NamedColor::BrightWhite),
];

impl NamedColor {
    /// Looks up a colour by its configuration name (`"bright_red"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, c)| c)
    }

    /// The configuration name of this colour.
    pub fn name(&self) -> &'static str {
        NAMED_COLORS[*self as usize].0
    }

    /// Common sRGB values for the ANSI palette.
    pub fn to_rgba(&self) -> Rgba {
        match self {
            NamedColor::Black => Rgba::opaque(0, 0, 0),
            NamedColor::Red => Rgba::opaque(205, 0, 0),
            NamedColor::Green => Rgba::opaque(0, 205, 0),
            NamedColor::Yellow => Rgba::opaque(205, 205, 0),
            NamedColor::Blue => Rgba::opaque(0, 0, 238),
            NamedColor::Magenta => Rgba::opaque(205, 0, 205),
            NamedColor::Cyan => Rgba::opaque(0, 205, 205),
            NamedColor::White => Rgba::opaque(229, 229, 229),
            NamedColor::BrightBlack => Rgba::opaque(127, 127, 127),
            NamedColor::BrightRed => Rgba::opaque(255, 0, 0),
            NamedColor::BrightGreen => Rgba::opaque(0, 255, 0),
            NamedColor::BrightYellow => Rgba::opaque(255, 255, 0),
            NamedColor::BrightBlue => Rgba::opaque(92, 92, 255),
            NamedColor::BrightMagenta => Rgba::opaque(255, 0, 255),
            NamedColor::BrightCyan => Rgba::opaque(0, 255, 255),
            NamedColor::BrightWhite => Rgba::opaque(255, 255, 255),
        }
    }
}

/// A fill colour as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    /// One of the 16 ANSI colours.
    Named(NamedColor),
    /// A true colour.
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Named(NamedColor::Black)
    }
}

impl Color {
    pub fn to_rgba(&self) -> Rgba {
        match self {
            Color::Named(named) => named.to_rgba(),
            Color::Rgb(r, g, b) => Rgba::opaque(*r, *g, *b),
        }
    }
}

/// Error for colour strings that are neither `#rrggbb` nor a known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised colour '{}'", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseColorError(s.to_string()));
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            return match (channel(0), channel(2), channel(4)) {
                (Ok(r), Ok(g), Ok(b)) => Ok(Color::Rgb(r, g, b)),
                _ => Err(ParseColorError(s.to_string())),
            };
        }
        NamedColor::from_name(trimmed)
            .map(Color::Named)
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(named) => f.write_str(named.name()),
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

/// RGBA color in 32-bit format (8 bits per channel, straight alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Composites `src` over `self`, with `src`'s alpha further scaled by
    /// `coverage` in [0, 1].
    pub fn blend_over(self, src: Rgba, coverage: f32) -> Rgba {
        let sa = (src.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return self;
        }
        let da = self.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Rgba::TRANSPARENT;
        }
        let mix = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            mix(src.r, self.r),
            mix(src.g, self.g),
            mix(src.b, self.b),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        )
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}
