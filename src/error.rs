//! Error types for decoding, recoloring, packing and persistence.
//!
//! Each failure kind has its own enum so callers can decide the scope of a
//! failure: decode and recolor errors concern a single icon, packing errors
//! abort a structural operation, persistence errors abort a load.

use thiserror::Error as ThisError;

/// An encoded image could not be turned into pixels.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    #[error("unsupported or malformed image data: {0}")]
    Image(#[from] image::ImageError),

    #[error("malformed SVG document: {0}")]
    Svg(String),

    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// A pixel buffer could not be recolored.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RecolorError {
    #[error("pixel buffer is empty ({width}x{height})")]
    EmptyBuffer { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("tint channel {channel} out of range: {value}")]
    ChannelOutOfRange { channel: usize, value: i64 },

    #[error("invalid tint {0:?}")]
    InvalidHex(String),

    #[error("failed to encode recolored image: {0}")]
    Encode(String),
}

/// The packer was asked to do something it cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PackingError {
    #[error("packing invariant violated: {0}")]
    InvariantViolation(String),

    #[error("icon is {width}px wide but the sheet is limited to {max_width}px")]
    IconTooWide { width: u32, max_width: u32 },

    #[error("no icon at row {row}, column {col}")]
    NoSuchCell { row: usize, col: usize },
}

/// A persisted project or bundle could not be read or written.
#[derive(Debug, ThisError)]
pub enum PersistenceError {
    #[error("could not open project: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not open project: icon at row {row}, column {col}: {reason}")]
    Record {
        row: usize,
        col: usize,
        reason: String,
    },

    #[error("could not open project: row {0} is empty")]
    EmptyRow(usize),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive member {0:?} is missing")]
    MissingMember(String),

    #[error("invalid archive member name {0:?}")]
    InvalidMember(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error returned by operations that span several stages.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Recolor(#[from] RecolorError),

    #[error(transparent)]
    Packing(#[from] PackingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("cannot render an empty grid")]
    EmptyGrid,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
