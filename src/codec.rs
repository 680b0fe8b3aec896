//! The image codec the rest of the crate goes through.
//!
//! Only two operations are exposed: turning encoded bytes into RGBA pixels and
//! turning RGBA pixels into PNG bytes.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::DecodeError;
use crate::svg;

/// Decodes raster or SVG bytes into an RGBA buffer with positive dimensions.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let pixels = if svg::looks_like_svg(bytes) {
        svg::rasterize(bytes)?
    } else {
        image::load_from_memory(bytes)?.to_rgba8()
    };

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(DecodeError::Empty {
            width: pixels.width(),
            height: pixels.height(),
        });
    }

    Ok(pixels)
}

/// Encodes an RGBA buffer as PNG.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, DecodeError> {
    let mut out = Cursor::new(Vec::new());
    pixels
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| DecodeError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_roundtrip_preserves_alpha() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(2, 0, Rgba([5, 6, 7, 99]));

        let bytes = encode_png(&img).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(DecodeError::Image(_))
        ));
    }

    #[test]
    fn svg_is_rasterized() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="4"><rect width="8" height="4" fill="#000"/></svg>"##;
        let decoded = decode(svg).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }
}
