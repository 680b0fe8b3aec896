//! Flattens a grid into one sheet image and its stylesheet.

use std::fmt;

use image::{Rgba, RgbaImage};
use log::debug;

use crate::error::{Error, PackingError};
use crate::grid::Grid;

// ============================================================================
// Stylesheet
// ============================================================================

/// One `.icon-N` rule pointing at an icon's region of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    /// Class name without the leading dot, e.g. `icon-3`.
    pub class: String,
    pub x: u32,
    pub y: u32,
}

impl CssRule {
    /// The `background-position` value: the icon offset, negated.
    pub fn background_position(&self) -> String {
        format!("{} {}", negated_px(self.x), negated_px(self.y))
    }
}

fn negated_px(v: u32) -> String {
    if v == 0 {
        "0px".to_string()
    } else {
        format!("-{}px", v)
    }
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".{} {{", self.class)?;
        writeln!(f, "    background-position: {};", self.background_position())?;
        writeln!(f, "}}")
    }
}

/// Background-position rules, one per icon, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
}

impl Stylesheet {
    /// Builds the rules for `grid`. The N in `icon-N` is the icon's
    /// row-major index, the same order the project is serialized in.
    pub fn for_grid(grid: &Grid) -> Self {
        let rules = grid
            .iter()
            .enumerate()
            .map(|(index, icon)| {
                let (x, y) = icon.position();
                CssRule {
                    class: format!("icon-{}", index),
                    x,
                    y,
                }
            })
            .collect();
        Self { rules }
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// A rendered sprite sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub image: RgbaImage,
    pub stylesheet: Stylesheet,
}

/// Renders every icon of `grid` onto one transparent canvas.
///
/// Icons are recolored with their stored tint in parallel, then composited
/// one after another in row-major order.
pub fn render(grid: &Grid) -> Result<Sheet, Error> {
    if grid.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let width = grid.sheet_width();
    let height = grid.sheet_height();

    // The last row starts at the y cursor
    let last_row = grid.rows().last().map(|row| row.height()).unwrap_or(0);
    if grid.cursor().y_cursor.checked_add(last_row) != Some(height) {
        return Err(PackingError::InvariantViolation(format!(
            "sheet height {} does not match y cursor {} plus last row {}",
            height,
            grid.cursor().y_cursor,
            last_row
        ))
        .into());
    }

    let tinted = grid.tinted_pixels()?;

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for (icon, pixels) in grid.iter().zip(&tinted) {
        let (x, y) = icon.position();
        composite_over(&mut canvas, pixels, x, y);
    }

    debug!("rendered {} icons onto a {}x{} sheet", tinted.len(), width, height);
    Ok(Sheet {
        image: canvas,
        stylesheet: Stylesheet::for_grid(grid),
    })
}

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination). Pixels falling
/// outside the destination are dropped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for sy in 0..src.height() {
        for sx in 0..src.width() {
            let (Some(dx), Some(dy)) = (x.checked_add(sx), y.checked_add(sy)) else {
                continue;
            };
            if dx >= dest.width() || dy >= dest.height() {
                continue;
            }

            let blended = alpha_blend(*src.get_pixel(sx, sy), *dest.get_pixel(dx, dy));
            dest.put_pixel(dx, dy, blended);
        }
    }
}

/// Source-over for straight (non-premultiplied) alpha.
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match (src[3], dst[3]) {
        (0, _) => return dst,
        (255, _) | (_, 0) => return src,
        _ => {}
    }

    let src_weight = f32::from(src[3]) / 255.0;
    let dst_weight = f32::from(dst[3]) / 255.0 * (1.0 - src_weight);
    let coverage = src_weight + dst_weight;

    let mix = |s: u8, d: u8| {
        ((f32::from(s) * src_weight + f32::from(d) * dst_weight) / coverage).round() as u8
    };

    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (coverage * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::Icon;
    use crate::packer::{Cursor, SheetConfig};
    use crate::recolor::Tint;

    fn icon(width: u32, height: u32) -> Icon {
        // Opaque left column, transparent elsewhere
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x == 0 {
                Rgba([50, 60, 70, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        Icon::from_pixels(img).unwrap()
    }

    #[test]
    fn sheet_has_budget_width_and_summed_height() {
        let grid = Grid::from_icons(SheetConfig::default(), (0..3).map(|_| icon(400, 40))).unwrap();
        let sheet = render(&grid).unwrap();
        assert_eq!(sheet.image.dimensions(), (1000, 80));
    }

    #[test]
    fn icons_are_tinted_and_placed() {
        let mut grid =
            Grid::from_icons(SheetConfig::default(), (0..3).map(|_| icon(400, 40))).unwrap();
        grid.recolor(0, 1, Tint::new(255, 0, 0)).unwrap();

        let sheet = render(&grid).unwrap();

        // Untinted icons render black
        assert_eq!(sheet.image.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(sheet.image.get_pixel(400, 5).0, [255, 0, 0, 255]);
        assert_eq!(sheet.image.get_pixel(0, 40).0, [0, 0, 0, 255]);

        // Transparent source pixels and unused canvas stay transparent
        assert_eq!(sheet.image.get_pixel(1, 0)[3], 0);
        assert_eq!(sheet.image.get_pixel(900, 60)[3], 0);
    }

    #[test]
    fn stale_y_cursor_fails_the_height_check() {
        let grid = Grid::from_icons(
            SheetConfig::new().with_max_width(10),
            vec![icon(8, 10), icon(8, 20)],
        )
        .unwrap();
        let stale = Cursor {
            y_cursor: 0,
            ..grid.cursor()
        };
        let broken = Grid::from_parts(grid.config(), grid.rows().to_vec(), stale);

        assert!(matches!(
            render(&broken),
            Err(Error::Packing(PackingError::InvariantViolation(_)))
        ));
        assert!(render(&grid).is_ok());
    }

    #[test]
    fn half_transparent_source_mixes_with_destination() {
        let blended = alpha_blend(Rgba([255, 0, 0, 128]), Rgba([0, 0, 255, 255]));
        assert_eq!(blended.0, [128, 0, 127, 255]);
    }

    #[test]
    fn rendering_does_not_mutate_the_grid() {
        let grid = Grid::from_icons(SheetConfig::default(), vec![icon(3, 3)]).unwrap();
        let before = grid.clone();
        render(&grid).unwrap();
        assert_eq!(grid, before);
    }

    #[test]
    fn render_is_stable_after_tinting() {
        let mut grid =
            Grid::from_icons(SheetConfig::default(), vec![icon(3, 3), icon(4, 2)]).unwrap();
        grid.recolor(0, 0, Tint::new(1, 2, 3)).unwrap();

        let first = render(&grid).unwrap();
        grid.recolor(0, 0, Tint::new(1, 2, 3)).unwrap();
        let second = render(&grid).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_grid_cannot_be_rendered() {
        assert!(matches!(render(&Grid::new()), Err(Error::EmptyGrid)));
    }

    #[test]
    fn css_rules_follow_row_major_order() {
        let grid = Grid::from_icons(SheetConfig::default(), (0..3).map(|_| icon(400, 40))).unwrap();
        let css = Stylesheet::for_grid(&grid);

        let classes: Vec<_> = css.rules.iter().map(|r| r.class.as_str()).collect();
        assert_eq!(classes, ["icon-0", "icon-1", "icon-2"]);
        assert_eq!(css.rules[1].background_position(), "-400px 0px");
        assert_eq!(css.rules[2].background_position(), "0px -40px");
    }

    #[test]
    fn css_text_format() {
        let css = Stylesheet {
            rules: vec![
                CssRule { class: "icon-0".into(), x: 0, y: 0 },
                CssRule { class: "icon-1".into(), x: 16, y: 8 },
            ],
        };
        assert_eq!(
            css.to_string(),
            ".icon-0 {\n    background-position: 0px 0px;\n}\n\n\
             .icon-1 {\n    background-position: -16px -8px;\n}\n\n"
        );
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_onto_transparent_keeps_source() {
        let mut dest = RgbaImage::new(4, 4);
        let src = RgbaImage::from_pixel(2, 2, Rgba([10, 200, 30, 77]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(3, 3).0, [10, 200, 30, 77]);
        assert_eq!(dest.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }
}
