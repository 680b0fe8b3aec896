//! The row-major icon grid and its packing session.

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{Error, PackingError, RecolorError};
use crate::icon::Icon;
use crate::packer::{Cursor, OversizePolicy, Packer, SheetConfig};
use crate::recolor::Tint;

/// Row/column coordinate of an icon in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

// ============================================================================
// Row
// ============================================================================

/// An append-only row of icons with a cached height.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    icons: Vec<Icon>,
    height: u32,
}

impl Row {
    fn push(&mut self, icon: Icon) {
        self.height = self.height.max(icon.height());
        self.icons.push(icon);
    }

    pub(crate) fn from_icons(icons: Vec<Icon>) -> Self {
        let height = icons.iter().map(Icon::height).max().unwrap_or(0);
        Self { icons, height }
    }

    /// The maximum height of the icons in this row.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// The x offset just past the last icon.
    fn end(&self) -> u32 {
        self.icons.last().map(|icon| icon.bounds().right()).unwrap_or(0)
    }
}

// ============================================================================
// Batch insertion
// ============================================================================

/// How [`Grid::extend_encoded`] treats inputs that cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Skip failing inputs and report them.
    #[default]
    Lenient,
    /// Fail the whole batch before placing anything.
    Strict,
}

/// Result of a batch insertion.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Where each accepted input was placed, in input order.
    pub placed: Vec<(usize, GridPos)>,
    /// Inputs that were skipped, by input index.
    pub skipped: Vec<(usize, Error)>,
}

// ============================================================================
// Grid
// ============================================================================

/// Icons laid out in rows, packed greedily left to right, top to bottom.
///
/// The grid owns its icons. Structural operations take `&mut self`, so one
/// owner serializes all placements and removals.
///
/// # Example
///
/// ```
/// use iconsheet::{Grid, Icon};
/// use image::{Rgba, RgbaImage};
///
/// let mut grid = Grid::new();
/// let icon = Icon::from_pixels(RgbaImage::from_pixel(400, 40, Rgba([0, 0, 0, 255]))).unwrap();
///
/// for _ in 0..3 {
///     grid.place(icon.clone()).unwrap();
/// }
///
/// assert_eq!(grid.rows().len(), 2);
/// assert_eq!(grid.get(1, 0).unwrap().position(), (0, 40));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Row>,
    cursor: Cursor,
    packer: Packer,
}

impl Grid {
    /// Creates the canonical empty grid with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SheetConfig) -> Self {
        Self {
            rows: Vec::new(),
            cursor: Cursor::default(),
            packer: Packer::new(config),
        }
    }

    /// Packs `icons` in order into a fresh grid.
    pub fn from_icons(
        config: SheetConfig,
        icons: impl IntoIterator<Item = Icon>,
    ) -> Result<Self, PackingError> {
        let mut grid = Self::with_config(config);
        for icon in icons {
            grid.place(icon)?;
        }
        Ok(grid)
    }

    /// Rebuilds a grid from persisted rows and cursor, trusting the stored
    /// positions.
    pub(crate) fn from_parts(config: SheetConfig, rows: Vec<Row>, cursor: Cursor) -> Self {
        Self {
            rows,
            cursor,
            packer: Packer::new(config),
        }
    }

    pub fn config(&self) -> SheetConfig {
        self.packer.config()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Icon> {
        self.rows.get(row)?.icons.get(col)
    }

    /// Iterates over all icons in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Icon> {
        self.rows.iter().flat_map(|row| row.icons.iter())
    }

    /// Iterates over all icons in row-major order together with their cell.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, &Icon)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.icons
                .iter()
                .enumerate()
                .map(move |(c, icon)| (GridPos::new(r, c), icon))
        })
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total height of the sheet: the sum of all row heights.
    pub fn sheet_height(&self) -> u32 {
        self.rows.iter().map(Row::height).sum()
    }

    /// Width of the sheet.
    ///
    /// This is the configured width budget unless an oversize icon was let
    /// through, in which case the sheet is as wide as that icon.
    pub fn sheet_width(&self) -> u32 {
        self.rows
            .iter()
            .map(Row::end)
            .fold(self.config().max_width, u32::max)
    }

    // ---- Structural operations ----

    /// Places `icon` after the last icon, opening a new row on overflow.
    pub fn place(&mut self, mut icon: Icon) -> Result<GridPos, PackingError> {
        let (row_height, row_len) = self
            .rows
            .last()
            .map(|row| (row.height, row.len()))
            .unwrap_or((0, 0));

        let placement = self
            .packer
            .step(self.cursor, row_height, row_len, icon.size())?;

        icon.set_position(placement.x, placement.y);
        if placement.new_row || self.rows.is_empty() {
            self.rows.push(Row::default());
        }

        let row = self.rows.len() - 1;
        self.rows[row].push(icon);
        self.cursor = placement.cursor;

        let pos = GridPos::new(row, self.rows[row].len() - 1);
        debug!(
            "placed icon at row {}, col {} ({}, {})",
            pos.row, pos.col, placement.x, placement.y
        );
        Ok(pos)
    }

    /// Decodes and places one encoded image.
    pub fn add_encoded(&mut self, bytes: impl Into<Vec<u8>>) -> Result<GridPos, Error> {
        let icon = Icon::decode(bytes)?;
        Ok(self.place(icon)?)
    }

    /// Decodes many images in parallel and places them in input order.
    ///
    /// In [`BatchMode::Strict`] the first failing input aborts the batch and
    /// the grid is left unchanged.
    pub fn extend_encoded(
        &mut self,
        inputs: Vec<Vec<u8>>,
        mode: BatchMode,
    ) -> Result<BatchReport, Error> {
        let decoded: Vec<_> = inputs.into_par_iter().map(|bytes| Icon::decode(bytes)).collect();

        let mut report = BatchReport::default();
        let mut accepted = Vec::with_capacity(decoded.len());
        for (index, result) in decoded.into_iter().enumerate() {
            let checked = result
                .map_err(Error::from)
                .and_then(|icon| self.check_fits(&icon).map(|_| icon).map_err(Error::from));

            match (checked, mode) {
                (Ok(icon), _) => accepted.push((index, icon)),
                (Err(err), BatchMode::Strict) => return Err(err),
                (Err(err), BatchMode::Lenient) => {
                    warn!("skipping icon {}: {}", index, err);
                    report.skipped.push((index, err));
                }
            }
        }

        for (index, icon) in accepted {
            let pos = self.place(icon)?;
            report.placed.push((index, pos));
        }

        Ok(report)
    }

    /// Removes the icon at `(row, col)` and repacks everything after it.
    ///
    /// All remaining icons are placed again, in row-major order, through a
    /// fresh packer. Removing the last icon yields the empty grid.
    pub fn remove(&mut self, row: usize, col: usize) -> Result<Icon, PackingError> {
        if self.get(row, col).is_none() {
            return Err(PackingError::NoSuchCell { row, col });
        }

        let remaining: Vec<Icon> = self
            .cells()
            .filter(|(pos, _)| *pos != GridPos::new(row, col))
            .map(|(_, icon)| icon.clone())
            .collect();

        let reflowed = Self::from_icons(self.config(), remaining)?;
        reflowed.check_invariants()?;
        debug!(
            "removed icon at row {}, col {}; reflowed {} icons into {} rows",
            row,
            col,
            reflowed.len(),
            reflowed.rows.len()
        );

        let mut previous = std::mem::replace(self, reflowed);
        Ok(previous.rows[row].icons.remove(col))
    }

    /// Recolors the icon at `(row, col)` in place.
    pub fn recolor(&mut self, row: usize, col: usize, tint: Tint) -> Result<(), Error> {
        let icon = self
            .rows
            .get_mut(row)
            .and_then(|r| r.icons.get_mut(col))
            .ok_or(PackingError::NoSuchCell { row, col })?;
        icon.set_tint(tint)?;
        Ok(())
    }

    /// Recolors every icon with its stored tint, in parallel, without
    /// touching the grid. Results are in row-major order.
    pub fn tinted_pixels(&self) -> Result<Vec<image::RgbaImage>, RecolorError> {
        let icons: Vec<&Icon> = self.iter().collect();
        icons
            .par_iter()
            .map(|icon| crate::recolor::recolor(icon.pixels(), icon.tint()))
            .collect()
    }

    fn check_fits(&self, icon: &Icon) -> Result<(), PackingError> {
        let config = self.config();
        if icon.width() > config.max_width && config.oversize == OversizePolicy::Reject {
            return Err(PackingError::IconTooWide {
                width: icon.width(),
                max_width: config.max_width,
            });
        }
        Ok(())
    }

    /// Verifies the layout invariants of a packed grid.
    ///
    /// Every row is non-empty, every icon's `y` is the sum of the heights of
    /// the rows above it, every icon's `x` is the sum of the widths before it
    /// in its row, and no icon crosses the width budget unless it sits alone
    /// in its row under [`OversizePolicy::ExpandSheet`].
    pub fn check_invariants(&self) -> Result<(), PackingError> {
        let config = self.config();
        let violation = |msg: String| Err(PackingError::InvariantViolation(msg));

        let mut top = 0u32;
        for (r, row) in self.rows.iter().enumerate() {
            if row.is_empty() {
                return violation(format!("row {} is empty", r));
            }

            let mut left = 0u32;
            for (c, icon) in row.icons.iter().enumerate() {
                let (x, y) = icon.position();
                if y != top {
                    return violation(format!(
                        "icon ({}, {}) has y={}, expected {}",
                        r, c, y, top
                    ));
                }
                if x != left {
                    return violation(format!(
                        "icon ({}, {}) has x={}, expected {}",
                        r, c, x, left
                    ));
                }

                let right = icon.bounds().right();
                let alone = row.len() == 1 && config.oversize == OversizePolicy::ExpandSheet;
                if right > config.max_width && !alone {
                    return violation(format!(
                        "icon ({}, {}) ends at {} past the {}px budget",
                        r, c, right, config.max_width
                    ));
                }
                left = right;
            }

            if r + 1 == self.rows.len() {
                if self.cursor.y_cursor != top {
                    return violation(format!(
                        "y cursor is {}, last row starts at {}",
                        self.cursor.y_cursor, top
                    ));
                }
                if self.cursor.x_cursor != left {
                    return violation(format!(
                        "x cursor is {}, last row ends at {}",
                        self.cursor.x_cursor, left
                    ));
                }
            }
            top += row.height;
        }

        if self.rows.is_empty() && self.cursor != Cursor::default() {
            return violation("empty grid with a non-zero cursor".into());
        }

        Ok(())
    }
}
