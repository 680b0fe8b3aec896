//! A project session: the one owner of a live grid.

use std::path::Path;

use log::{info, warn};

use crate::bundle::{self, ArchiveReader, ArchiveWriter};
use crate::compositor::{self, Sheet, Stylesheet};
use crate::error::{Error, PackingError, PersistenceError};
use crate::grid::{BatchMode, BatchReport, Grid, GridPos};
use crate::icon::Icon;
use crate::packer::SheetConfig;
use crate::project::Project;
use crate::recolor::Tint;

/// Holds the grid being edited.
///
/// All structural edits go through `&mut self`. Loading a project builds the
/// new grid completely before swapping it in, so a failed load leaves the
/// current grid as it was.
///
/// # Example
///
/// ```
/// use iconsheet::{Session, SheetConfig, Tint};
/// use image::{Rgba, RgbaImage};
///
/// let mut session = Session::new(SheetConfig::default());
/// let png = iconsheet::codec::encode_png(&RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]))).unwrap();
///
/// let pos = session.add(png).unwrap();
/// session.recolor(pos.row, pos.col, Tint::new(255, 0, 0)).unwrap();
///
/// let sheet = session.render().unwrap();
/// assert_eq!(sheet.image.get_pixel(0, 0).0, [255, 0, 0, 255]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    grid: Grid,
    config: SheetConfig,
}

impl Session {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            grid: Grid::with_config(config),
            config,
        }
    }

    /// Returns the live grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> SheetConfig {
        self.config
    }

    // ---- Editing ----

    /// Decodes and places a new icon.
    pub fn add(&mut self, bytes: impl Into<Vec<u8>>) -> Result<GridPos, Error> {
        self.grid.add_encoded(bytes)
    }

    /// Places an already decoded icon.
    pub fn add_icon(&mut self, icon: Icon) -> Result<GridPos, PackingError> {
        self.grid.place(icon)
    }

    /// Adds several images at once. See [`Grid::extend_encoded`].
    pub fn add_many(
        &mut self,
        inputs: Vec<Vec<u8>>,
        mode: BatchMode,
    ) -> Result<BatchReport, Error> {
        self.grid.extend_encoded(inputs, mode)
    }

    /// Removes an icon and reflows the rest.
    pub fn remove(&mut self, row: usize, col: usize) -> Result<Icon, PackingError> {
        self.grid.remove(row, col)
    }

    pub fn recolor(&mut self, row: usize, col: usize, tint: Tint) -> Result<(), Error> {
        self.grid.recolor(row, col, tint)
    }

    /// Discards every icon.
    pub fn clear(&mut self) {
        self.grid = Grid::with_config(self.config);
    }

    // ---- Output ----

    pub fn render(&self) -> Result<Sheet, Error> {
        compositor::render(&self.grid)
    }

    pub fn stylesheet(&self) -> Stylesheet {
        Stylesheet::for_grid(&self.grid)
    }

    pub fn project(&self) -> Project {
        Project::from_grid(&self.grid)
    }

    // ---- Persistence ----

    /// Replaces the live grid with the one described by `project`.
    pub fn load_project(&mut self, project: &Project) -> Result<(), PersistenceError> {
        let grid = project.to_grid_with(self.config)?;
        self.replace(grid);
        Ok(())
    }

    /// Replaces the live grid with the project stored in `archive`.
    pub fn open<A: ArchiveReader>(&mut self, archive: &mut A) -> Result<(), PersistenceError> {
        let grid = bundle::open(archive, self.config)?;
        self.replace(grid);
        Ok(())
    }

    pub fn open_path(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let grid = bundle::open_path(path.as_ref(), self.config).inspect_err(|e| {
            warn!("could not open {}: {}", path.as_ref().display(), e);
        })?;
        self.replace(grid);
        Ok(())
    }

    pub fn export<A: ArchiveWriter>(&self, archive: &mut A) -> Result<(), Error> {
        bundle::export(&self.grid, archive)
    }

    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        bundle::export_to_path(&self.grid, path)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        bundle::save_snapshot(&self.grid, path)
    }

    /// Restores the grid from a snapshot file.
    pub fn recover(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let grid = bundle::recover_snapshot(path, self.config)?;
        self.replace(grid);
        Ok(())
    }

    fn replace(&mut self, grid: Grid) {
        info!("session now holds {} icons", grid.len());
        self.grid = grid;
    }
}
