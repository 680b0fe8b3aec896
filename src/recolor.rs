//! Tint colors and the alpha-mask recolor step.
//!
//! Recoloring keeps only the alpha channel of the source image and fills every
//! pixel with the tint, the equivalent of a "destination-in" composite of the
//! source over a solid tint layer.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::RecolorError;

// ============================================================================
// Tint
// ============================================================================

/// A solid RGB color substituted for an icon's visible pixels.
///
/// Serializes as a `[r, g, b]` array. Deserialization rejects channels outside
/// `0..=255` instead of clamping them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "[i64; 3]", into = "[u8; 3]")]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl TryFrom<[i64; 3]> for Tint {
    type Error = RecolorError;

    fn try_from(channels: [i64; 3]) -> Result<Self, Self::Error> {
        let mut out = [0u8; 3];
        for (channel, (&value, slot)) in channels.iter().zip(out.iter_mut()).enumerate() {
            *slot = u8::try_from(value)
                .map_err(|_| RecolorError::ChannelOutOfRange { channel, value })?;
        }
        Ok(Self::new(out[0], out[1], out[2]))
    }
}

impl From<Tint> for [u8; 3] {
    fn from(tint: Tint) -> Self {
        tint.channels()
    }
}

impl From<[u8; 3]> for Tint {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Srgb<u8>> for Tint {
    fn from(rgb: Srgb<u8>) -> Self {
        Self::new(rgb.red, rgb.green, rgb.blue)
    }
}

impl From<Tint> for Srgb<u8> {
    fn from(tint: Tint) -> Self {
        Srgb::new(tint.r, tint.g, tint.b)
    }
}

/// Parses CSS hex notation: `#rrggbb`, `#rgb`, with or without the `#`.
impl FromStr for Tint {
    type Err = RecolorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Srgb::<u8>::from_str(s.trim())
            .map(Tint::from)
            .map_err(|_| RecolorError::InvalidHex(s.to_string()))
    }
}

impl fmt::Display for Tint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ============================================================================
// Recolor
// ============================================================================

/// Replaces every pixel's color with `tint`, keeping the source alpha.
///
/// Fully transparent pixels stay transparent. The result depends only on the
/// source alpha channel, so recoloring an already tinted image with the same
/// tint returns identical pixels.
pub fn recolor(source: &RgbaImage, tint: Tint) -> Result<RgbaImage, RecolorError> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(RecolorError::EmptyBuffer { width, height });
    }

    let expected = width as usize * height as usize * 4;
    let actual = source.as_raw().len();
    if actual != expected {
        return Err(RecolorError::BufferSize { expected, actual });
    }

    let mut result = source.clone();
    for pixel in result.pixels_mut() {
        let a = pixel.0[3];
        pixel.0 = [tint.r, tint.g, tint.b, a];
    }

    Ok(result)
}
