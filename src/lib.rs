//! iconsheet: icon sprite sheet packing and recoloring
//!
//! This crate packs independently sized icons into a single sprite sheet,
//! recolors icons by using their alpha channel as a mask, and saves the whole
//! layout as a project that reloads exactly.
//!
//! # Example
//!
//! ```
//! use iconsheet::{Grid, Icon, SheetConfig, Tint, compositor};
//! use image::{Rgba, RgbaImage};
//!
//! let mut grid = Grid::with_config(SheetConfig::default());
//! let glyph = RgbaImage::from_pixel(400, 40, Rgba([0, 0, 0, 255]));
//!
//! for _ in 0..3 {
//!     grid.place(Icon::from_pixels(glyph.clone()).unwrap()).unwrap();
//! }
//! grid.recolor(1, 0, Tint::new(255, 0, 0)).unwrap();
//!
//! // Row 0 holds two icons, the third wrapped onto row 1
//! assert_eq!(grid.get(1, 0).unwrap().position(), (0, 40));
//!
//! let sheet = compositor::render(&grid).unwrap();
//! assert_eq!(sheet.image.dimensions(), (1000, 80));
//! assert_eq!(sheet.stylesheet.rules[2].background_position(), "0px -40px");
//! ```
//!
//! # Projects
//!
//! A [`Project`] is the serializable form of a [`Grid`]. Positions and
//! cursors are stored, not recomputed:
//!
//! ```
//! use iconsheet::{Grid, Project};
//!
//! let json = Project::from_grid(&Grid::new()).to_json().unwrap();
//! let grid = Project::from_json(&json).unwrap().to_grid().unwrap();
//! assert!(grid.is_empty());
//! ```

pub mod bundle;
pub mod codec;
pub mod compositor;
mod error;
mod grid;
mod icon;
mod packer;
mod project;
mod recolor;
mod session;
mod svg;

pub use compositor::{CssRule, Sheet, Stylesheet};
pub use error::{DecodeError, Error, PackingError, PersistenceError, RecolorError, Result};
pub use grid::{BatchMode, BatchReport, Grid, GridPos, Row};
pub use icon::{Icon, RectPx, SizePx};
pub use packer::{Cursor, DEFAULT_MAX_WIDTH, OversizePolicy, Packer, Placement, SheetConfig};
pub use project::{IconRecord, Project};
pub use recolor::{Tint, recolor};
pub use session::Session;
