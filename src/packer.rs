//! Greedy row packing over an explicit cursor value.
//!
//! [`Packer::step`] is a pure function: it takes the current [`Cursor`], the
//! height of the row being filled and the size of the next icon, and returns
//! where that icon goes together with the advanced cursor. The stateful
//! [`Grid`](crate::Grid) feeds it one icon at a time.

use serde::{Deserialize, Serialize};

use crate::error::PackingError;
use crate::icon::SizePx;

/// Default sheet width budget in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1000;

// ============================================================================
// Configuration
// ============================================================================

/// What to do with an icon that is wider than the sheet on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum OversizePolicy {
    /// Refuse the icon with [`PackingError::IconTooWide`].
    #[default]
    Reject,
    /// Give the icon a row of its own and widen the sheet to fit it.
    ExpandSheet,
}

/// Sheet layout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SheetConfig {
    /// Width budget of the sheet in pixels.
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    #[serde(default)]
    pub oversize: OversizePolicy,
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            oversize: OversizePolicy::default(),
        }
    }
}

impl SheetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_oversize(mut self, oversize: OversizePolicy) -> Self {
        self.oversize = oversize;
        self
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Where the next icon would start.
///
/// `x_cursor`/`y_cursor` are pixel offsets, `x_index`/`y_index` the
/// column/row counters. `x_index` is reset to zero when a row is opened by an
/// overflow and only counts icons appended to a row that still had room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Cursor {
    pub x_cursor: u32,
    pub y_cursor: u32,
    pub x_index: u32,
    pub y_index: u32,
}

/// Outcome of a single packing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The cursor after the icon was placed.
    pub cursor: Cursor,
    pub x: u32,
    pub y: u32,
    /// True if the current row was closed and the icon starts a new one.
    pub new_row: bool,
}

// ============================================================================
// Packer
// ============================================================================

/// Greedy row packer.
///
/// Icons are never reordered and never split across rows. A row is closed
/// when the next icon does not fit; its height is the maximum height of its
/// icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packer {
    config: SheetConfig,
}

impl Packer {
    pub fn new(config: SheetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> SheetConfig {
        self.config
    }

    /// Computes the placement of an icon of `size`.
    ///
    /// `row_height` is the cached max height of the row currently being
    /// filled, `row_len` its number of icons.
    pub fn step(
        &self,
        cursor: Cursor,
        row_height: u32,
        row_len: usize,
        size: SizePx,
    ) -> Result<Placement, PackingError> {
        let max_width = self.config.max_width;
        if size.width > max_width && self.config.oversize == OversizePolicy::Reject {
            return Err(PackingError::IconTooWide {
                width: size.width,
                max_width,
            });
        }

        let end = cursor
            .x_cursor
            .checked_add(size.width)
            .ok_or_else(|| PackingError::InvariantViolation("x cursor overflow".into()))?;

        // Fits in the current row, or the row is still empty and must not be
        // left without icons.
        if end <= max_width || row_len == 0 {
            let next = Cursor {
                x_cursor: end,
                x_index: cursor.x_index + 1,
                ..cursor
            };
            return Ok(Placement {
                cursor: next,
                x: cursor.x_cursor,
                y: cursor.y_cursor,
                new_row: false,
            });
        }

        let y_cursor = cursor
            .y_cursor
            .checked_add(row_height)
            .ok_or_else(|| PackingError::InvariantViolation("y cursor overflow".into()))?;

        let next = Cursor {
            x_cursor: size.width,
            y_cursor,
            x_index: 0,
            y_index: cursor.y_index + 1,
        };

        Ok(Placement {
            cursor: next,
            x: next.x_cursor - size.width,
            y: y_cursor,
            new_row: true,
        })
    }
}
