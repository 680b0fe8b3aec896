//! Serializable project snapshot.
//!
//! A [`Project`] captures a whole [`Grid`] in a JSON-friendly form: the
//! row/column matrix of icon records plus the packing cursor. Loading a
//! project restores every position and cursor verbatim; the packer is not
//! re-run.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "grid": [
//!     [
//!       { "image": "iVBORw0KGgo...", "width": 400, "height": 40, "x": 0, "y": 0, "color": [255, 0, 0] }
//!     ]
//!   ],
//!   "xIndex": 1,
//!   "yIndex": 0,
//!   "xCursor": 400,
//!   "yCursor": 0,
//!   "maxWidth": 1000,
//!   "oversize": "reject"
//! }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::grid::{Grid, Row};
use crate::icon::Icon;
use crate::packer::{Cursor, DEFAULT_MAX_WIDTH, OversizePolicy, SheetConfig};
use crate::recolor::Tint;

// ============================================================================
// Icon Record
// ============================================================================

/// One persisted icon.
///
/// All fields are required. `image` holds the encoded image bytes as base64
/// text; a `data:<mime>;base64,` prefix is accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconRecord {
    #[serde(alias = "base64")]
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    #[cfg_attr(feature = "jsonschema", schemars(with = "[u8; 3]"))]
    pub color: Tint,
}

impl IconRecord {
    pub fn from_icon(icon: &Icon) -> Self {
        let (x, y) = icon.position();
        Self {
            image: STANDARD.encode(icon.encoded()),
            width: icon.width(),
            height: icon.height(),
            x,
            y,
            color: icon.tint(),
        }
    }

    /// Decodes the record back into an icon, checking the stored geometry.
    pub fn to_icon(&self) -> Result<Icon, String> {
        let text = match self.image.split_once(";base64,") {
            Some((_, payload)) => payload,
            None => self.image.as_str(),
        };
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| format!("invalid base64 image: {}", e))?;

        let icon = Icon::restore(bytes, self.color, self.x, self.y).map_err(|e| e.to_string())?;
        if (icon.width(), icon.height()) != (self.width, self.height) {
            return Err(format!(
                "image is {}x{} but the record says {}x{}",
                icon.width(),
                icon.height(),
                self.width,
                self.height
            ));
        }
        Ok(icon)
    }
}

// ============================================================================
// Project
// ============================================================================

/// A serializable snapshot of a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Project {
    /// Icon records in row-major order.
    pub grid: Vec<Vec<IconRecord>>,
    pub x_index: u32,
    pub y_index: u32,
    pub x_cursor: u32,
    pub y_cursor: u32,

    /// Width budget the grid was packed with.
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Oversize policy the grid was packed with.
    #[serde(default)]
    pub oversize: OversizePolicy,
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

impl Default for Project {
    fn default() -> Self {
        Self::from_grid(&Grid::new())
    }
}

impl Project {
    /// Snapshots `grid`.
    pub fn from_grid(grid: &Grid) -> Self {
        let cursor = grid.cursor();
        Self {
            grid: grid
                .rows()
                .iter()
                .map(|row| row.icons().iter().map(IconRecord::from_icon).collect())
                .collect(),
            x_index: cursor.x_index,
            y_index: cursor.y_index,
            x_cursor: cursor.x_cursor,
            y_cursor: cursor.y_cursor,
            max_width: grid.config().max_width,
            oversize: grid.config().oversize,
        }
    }

    /// Rebuilds the grid with the stored packing settings.
    pub fn to_grid(&self) -> Result<Grid, PersistenceError> {
        self.to_grid_with(SheetConfig::default())
    }

    /// Rebuilds the grid.
    ///
    /// The stored width and oversize policy replace those of `config`, so the
    /// grid keeps the settings it was packed under.
    ///
    /// Icons are decoded in parallel. Positions, tints and cursors are taken
    /// as stored.
    pub fn to_grid_with(&self, config: SheetConfig) -> Result<Grid, PersistenceError> {
        if let Some(r) = self.grid.iter().position(Vec::is_empty) {
            return Err(PersistenceError::EmptyRow(r));
        }

        let rows = self
            .grid
            .par_iter()
            .enumerate()
            .map(|(r, records)| {
                records
                    .iter()
                    .enumerate()
                    .map(|(c, record)| {
                        record.to_icon().map_err(|reason| PersistenceError::Record {
                            row: r,
                            col: c,
                            reason,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Row::from_icons)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cursor = Cursor {
            x_cursor: self.x_cursor,
            y_cursor: self.y_cursor,
            x_index: self.x_index,
            y_index: self.y_index,
        };

        let config = config
            .with_max_width(self.max_width)
            .with_oversize(self.oversize);
        let grid = Grid::from_parts(config, rows, cursor);
        info!("loaded project with {} icons in {} rows", grid.len(), grid.rows().len());
        Ok(grid)
    }

    /// Serializes the project to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the project to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a project from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use image::{Rgba, RgbaImage};

    fn icon(width: u32, height: u32, shade: u8) -> Icon {
        Icon::from_pixels(RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 200]))).unwrap()
    }

    fn sample_grid() -> Grid {
        let mut grid = Grid::from_icons(
            SheetConfig::default(),
            vec![icon(400, 40, 1), icon(400, 30, 2), icon(400, 20, 3)],
        )
        .unwrap();
        grid.recolor(1, 0, Tint::new(0, 0, 255)).unwrap();
        grid
    }

    #[test]
    fn roundtrip_restores_everything() {
        let grid = sample_grid();
        let json = Project::from_grid(&grid).to_json().unwrap();
        let restored = Project::from_json(&json).unwrap().to_grid().unwrap();

        assert_eq!(restored, grid);
        assert_eq!(restored.cursor(), grid.cursor());
        for (a, b) in restored.iter().zip(grid.iter()) {
            assert_eq!(a.encoded(), b.encoded());
            assert_eq!(a.position(), b.position());
            assert_eq!(a.tint(), b.tint());
        }
    }

    #[test]
    fn empty_grid_roundtrip() {
        let project = Project::from_grid(&Grid::new());
        assert!(project.grid.is_empty());
        assert_eq!(
            (project.x_cursor, project.y_cursor, project.x_index, project.y_index),
            (0, 0, 0, 0)
        );
        assert_eq!(project.to_grid().unwrap(), Grid::new());
    }

    #[test]
    fn json_format_uses_camel_case() {
        let json = Project::from_grid(&sample_grid()).to_json_pretty().unwrap();
        assert!(json.contains("\"xCursor\""));
        assert!(json.contains("\"yIndex\""));
        assert!(json.contains("\"color\": ["));
        assert!(json.contains("\"image\""));
    }

    #[test]
    fn positions_are_not_recomputed() {
        let mut project = Project::from_grid(&sample_grid());
        project.grid[0][1].x = 512;
        project.x_cursor = 7;

        let grid = project.to_grid().unwrap();
        assert_eq!(grid.get(0, 1).unwrap().position(), (512, 0));
        assert_eq!(grid.cursor().x_cursor, 7);
    }

    #[test]
    fn accepts_legacy_data_uri_records() {
        let png = codec::encode_png(&RgbaImage::from_pixel(2, 3, Rgba([0, 0, 0, 255]))).unwrap();
        let json = format!(
            r#"{{"grid":[[{{"base64":"data:image/png;base64,{}","width":2,"height":3,"x":0,"y":0,"color":[1,2,3]}}]],
               "xIndex":1,"yIndex":0,"xCursor":2,"yCursor":0}}"#,
            STANDARD.encode(png)
        );

        let grid = Project::from_json(&json).unwrap().to_grid().unwrap();
        assert_eq!(grid.config(), SheetConfig::default());
        assert_eq!(grid.get(0, 0).unwrap().tint(), Tint::new(1, 2, 3));
    }

    #[test]
    fn rejects_malformed_records() {
        // Missing field
        assert!(Project::from_json(
            r#"{"grid":[[{"image":"","width":1,"height":1,"x":0,"y":0}]],"xIndex":0,"yIndex":0,"xCursor":0,"yCursor":0}"#
        )
        .is_err());

        // Negative coordinate
        assert!(Project::from_json(
            r#"{"grid":[],"xIndex":0,"yIndex":0,"xCursor":-5,"yCursor":0}"#
        )
        .is_err());

        // Color channel out of range
        assert!(Project::from_json(
            r#"{"grid":[[{"image":"","width":1,"height":1,"x":0,"y":0,"color":[0,0,999]}]],"xIndex":0,"yIndex":0,"xCursor":0,"yCursor":0}"#
        )
        .is_err());
    }

    #[test]
    fn rejects_undecodable_images_and_bad_geometry() {
        let mut project = Project::from_grid(&sample_grid());
        project.grid[1][0].image = "!!!".into();
        assert!(matches!(
            project.to_grid(),
            Err(PersistenceError::Record { row: 1, col: 0, .. })
        ));

        let mut project = Project::from_grid(&sample_grid());
        project.grid[0][0].width = 17;
        assert!(matches!(
            project.to_grid(),
            Err(PersistenceError::Record { row: 0, col: 0, .. })
        ));
    }

    #[test]
    fn expanded_grid_stays_editable_after_reload() {
        let config = SheetConfig::new()
            .with_max_width(100)
            .with_oversize(OversizePolicy::ExpandSheet);
        let icons = vec![icon(60, 10, 1), icon(250, 10, 2), icon(20, 10, 3)];
        let grid = Grid::from_icons(config, icons).unwrap();

        let json = Project::from_grid(&grid).to_json().unwrap();
        assert!(json.contains("\"oversize\":\"expand-sheet\""));

        let mut restored = Project::from_json(&json)
            .unwrap()
            .to_grid_with(SheetConfig::default())
            .unwrap();
        assert_eq!(restored.config(), config);
        restored.check_invariants().unwrap();

        restored.remove(0, 0).unwrap();
        assert_eq!(restored.get(0, 0).unwrap().width(), 250);
        assert_eq!(restored.get(1, 0).unwrap().position(), (0, 10));
        restored.check_invariants().unwrap();
    }

    #[test]
    fn rejects_empty_rows() {
        let mut project = Project::from_grid(&sample_grid());
        project.grid.push(Vec::new());
        assert!(matches!(project.to_grid(), Err(PersistenceError::EmptyRow(2))));
    }
}
