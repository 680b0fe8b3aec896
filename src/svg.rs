//! SVG rasterization using resvg/usvg.
//!
//! Vector icons are rendered once, at their intrinsic size, and from then on
//! behave like any other raster icon.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::DecodeError;

/// Returns true if the bytes look like an SVG document rather than a raster image.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let text = &text[start..];

    if text.starts_with(b"<svg") {
        return true;
    }

    // XML prolog or doctype followed by an <svg> root somewhere in the header
    (text.starts_with(b"<?xml") || text.starts_with(b"<!DOCTYPE svg"))
        && text
            .windows(4)
            .take(1024)
            .any(|window| window == b"<svg")
}

/// Rasterizes an SVG document at its intrinsic size.
pub fn rasterize(svg_data: &[u8]) -> Result<RgbaImage, DecodeError> {
    let opts = Options::default();
    let tree = Tree::from_data(svg_data, &opts).map_err(|e| DecodeError::Svg(e.to_string()))?;

    let svg_size = tree.size();
    let width = svg_size.width().ceil() as u32;
    let height = svg_size.height().ceil() as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or(DecodeError::Empty { width, height })?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let height = pixmap.height();

    RgbaImage::from_fn(width, height, |x, y| match pixmap.pixel(x, y) {
        // tiny_skia uses premultiplied alpha
        Some(pixel) => unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()),
        None => Rgba([0, 0, 0, 0]),
    })
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let a_f = a as f32 / 255.0;
    Rgba([
        (r as f32 / a_f).round().min(255.0) as u8,
        (g as f32 / a_f).round().min(255.0) as u8,
        (b as f32 / a_f).round().min(255.0) as u8,
        a,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="16"><rect x="0" y="0" width="12" height="16" fill="#00ff00"/></svg>"##;

    #[test]
    fn detects_svg_documents() {
        assert!(looks_like_svg(SQUARE_SVG.as_bytes()));
        assert!(looks_like_svg(b"  \n<svg></svg>"));
        assert!(looks_like_svg(
            br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#
        ));
        assert!(!looks_like_svg(b"\x89PNG\r\n\x1a\n"));
        assert!(!looks_like_svg(b"<?xml version=\"1.0\"?><html/>"));
    }

    #[test]
    fn rasterizes_at_intrinsic_size() {
        let img = rasterize(SQUARE_SVG.as_bytes()).unwrap();
        assert_eq!(img.dimensions(), (24, 16));

        // Left half is filled, right half transparent
        assert_eq!(img.get_pixel(2, 8).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(20, 8)[3], 0);
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(matches!(
            rasterize(b"<svg"),
            Err(DecodeError::Svg(_))
        ));
    }

    #[test]
    fn unpremultiply_restores_color() {
        assert_eq!(unpremultiply(0, 0, 0, 0).0, [0, 0, 0, 0]);
        assert_eq!(unpremultiply(128, 0, 0, 128).0, [255, 0, 0, 128]);
    }
}
