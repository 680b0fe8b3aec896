//! Icon types: a decoded image with its tint and sheet position.

use image::RgbaImage;

use crate::codec;
use crate::error::{DecodeError, RecolorError};
use crate::recolor::{self, Tint};

/// A rectangle defined in pixel coordinates.
///
/// Used for the region an icon occupies on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the sheet
    pub x: u32,
    /// Y offset from the top edge of the sheet
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A single icon on the sheet.
///
/// Holds the decoded RGBA pixels together with the encoded bytes they came
/// from, so that saving a project writes back exactly what was loaded. The
/// position is only meaningful once the icon has been placed in a
/// [`Grid`](crate::Grid).
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pixels: RgbaImage,
    encoded: Vec<u8>,
    tint: Tint,
    x: u32,
    y: u32,
}

impl Icon {
    /// Decodes an icon from encoded image bytes (PNG, JPEG, SVG, ...).
    ///
    /// The bytes are kept verbatim for persistence.
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Result<Self, DecodeError> {
        let encoded = bytes.into();
        let pixels = codec::decode(&encoded)?;
        Ok(Self {
            pixels,
            encoded,
            tint: Tint::BLACK,
            x: 0,
            y: 0,
        })
    }

    /// Builds an icon from an in-memory buffer, encoding it as PNG.
    pub fn from_pixels(pixels: RgbaImage) -> Result<Self, DecodeError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(DecodeError::Empty {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        let encoded = codec::encode_png(&pixels)?;
        Ok(Self {
            pixels,
            encoded,
            tint: Tint::BLACK,
            x: 0,
            y: 0,
        })
    }

    /// Restores an icon from persisted parts without touching its pixels.
    pub(crate) fn restore(
        encoded: Vec<u8>,
        tint: Tint,
        x: u32,
        y: u32,
    ) -> Result<Self, DecodeError> {
        let mut icon = Self::decode(encoded)?;
        icon.tint = tint;
        icon.x = x;
        icon.y = y;
        Ok(icon)
    }

    /// Returns a copy of this icon recolored with `tint`.
    ///
    /// Every visible pixel becomes `tint` at its original alpha. Geometry and
    /// position are unchanged.
    pub fn recolor(&self, tint: Tint) -> Result<Self, RecolorError> {
        let mut icon = self.clone();
        icon.set_tint(tint)?;
        Ok(icon)
    }

    /// Recolors this icon in place.
    ///
    /// Leaves the icon untouched on error.
    pub fn set_tint(&mut self, tint: Tint) -> Result<(), RecolorError> {
        let pixels = recolor::recolor(&self.pixels, tint)?;
        let encoded =
            codec::encode_png(&pixels).map_err(|e| RecolorError::Encode(e.to_string()))?;
        self.pixels = pixels;
        self.encoded = encoded;
        self.tint = tint;
        Ok(())
    }

    /// Encodes the current pixel buffer as PNG.
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        codec::encode_png(&self.pixels)
    }

    /// The bytes persisted for this icon.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.width(), self.height())
    }

    /// The assigned `(x, y)` offset on the sheet.
    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// The region this icon occupies on the sheet.
    pub fn bounds(&self) -> RectPx {
        RectPx::new(self.x, self.y, self.width(), self.height())
    }

    pub(crate) fn set_position(&mut self, x: u32, y: u32) {
        self.x = x;
        self.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn half_transparent(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgba([20, 40, 60, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn rect_px_right_edge() {
        let rect = RectPx::new(10, 20, 100, 200);
        assert_eq!(rect.right(), 110);
    }

    #[test]
    fn decode_reads_geometry_and_keeps_bytes() {
        let png = codec::encode_png(&half_transparent(6, 4)).unwrap();
        let icon = Icon::decode(png.clone()).unwrap();

        assert_eq!(icon.size(), SizePx::new(6, 4));
        assert_eq!(icon.encoded(), png.as_slice());
        assert_eq!(icon.tint(), Tint::BLACK);
        assert_eq!(icon.position(), (0, 0));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Icon::decode(b"nope".to_vec()).is_err());
    }

    #[test]
    fn from_pixels_rejects_empty_buffer() {
        assert!(matches!(
            Icon::from_pixels(RgbaImage::new(0, 0)),
            Err(DecodeError::Empty { .. })
        ));
    }

    #[test]
    fn recolor_returns_new_icon() {
        let icon = Icon::from_pixels(half_transparent(4, 2)).unwrap();
        let red = icon.recolor(Tint::new(255, 0, 0)).unwrap();

        assert_eq!(red.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(red.pixels().get_pixel(1, 0)[3], 0);
        assert_eq!(red.size(), icon.size());
        assert_eq!(red.tint(), Tint::new(255, 0, 0));

        // The source is untouched
        assert_eq!(icon.pixels().get_pixel(0, 0).0, [20, 40, 60, 255]);
        assert_eq!(icon.tint(), Tint::BLACK);
    }

    #[test]
    fn set_tint_updates_encoded_bytes() {
        let mut icon = Icon::from_pixels(half_transparent(4, 2)).unwrap();
        let before = icon.encoded().to_vec();
        icon.set_tint(Tint::new(0, 0, 255)).unwrap();

        assert_ne!(icon.encoded(), before.as_slice());
        let reloaded = Icon::decode(icon.encoded().to_vec()).unwrap();
        assert_eq!(reloaded.pixels(), icon.pixels());
    }

    #[test]
    fn encode_is_lossless() {
        let icon = Icon::from_pixels(half_transparent(5, 3)).unwrap();
        let decoded = codec::decode(&icon.encode().unwrap()).unwrap();
        assert_eq!(&decoded, icon.pixels());
    }
}
