//! Project bundles: a zip archive with the project, its stylesheet and the
//! rendered sheet.
//!
//! Only [`PROJECT_MEMBER`] is read back when a bundle is opened; the
//! stylesheet and sheet image are derived artifacts for external consumers.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::info;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::codec;
use crate::compositor;
use crate::error::{Error, PersistenceError};
use crate::grid::Grid;
use crate::packer::SheetConfig;
use crate::project::Project;

/// Structured project data.
pub const PROJECT_MEMBER: &str = "project.json";
/// Generated background-position rules.
pub const STYLESHEET_MEMBER: &str = "icons.css";
/// The flattened sprite sheet.
pub const SHEET_MEMBER: &str = "icons.png";

// ============================================================================
// Archive Traits
// ============================================================================

/// Read access to named archive members.
pub trait ArchiveReader {
    fn read_member(&mut self, name: &str) -> Result<Vec<u8>, PersistenceError>;
}

/// Write access to named archive members.
pub trait ArchiveWriter {
    fn write_member(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

impl<R: Read + Seek> ArchiveReader for ZipArchive<R> {
    fn read_member(&mut self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        let mut file = self.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => PersistenceError::MissingMember(name.to_string()),
            other => PersistenceError::Archive(other),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipWriter<W> {
    fn write_member(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        // zip-slip prevention
        if name.is_empty()
            || name.contains("..")
            || name.starts_with('/')
            || name.starts_with('\\')
        {
            return Err(PersistenceError::InvalidMember(name.to_string()));
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        self.start_file(name, options)?;
        self.write_all(bytes)?;
        Ok(())
    }
}

// ============================================================================
// Export / Open
// ============================================================================

/// Writes the project, stylesheet and rendered sheet for `grid`.
pub fn export<A: ArchiveWriter>(grid: &Grid, archive: &mut A) -> Result<(), Error> {
    let sheet = compositor::render(grid)?;
    let json = Project::from_grid(grid)
        .to_json()
        .map_err(PersistenceError::from)?;
    let png = codec::encode_png(&sheet.image)?;

    archive.write_member(PROJECT_MEMBER, json.as_bytes())?;
    archive.write_member(STYLESHEET_MEMBER, sheet.stylesheet.to_string().as_bytes())?;
    archive.write_member(SHEET_MEMBER, &png)?;

    info!(
        "exported {} icons on a {}x{} sheet",
        grid.len(),
        sheet.image.width(),
        sheet.image.height()
    );
    Ok(())
}

/// Reads the project member and rebuilds its grid.
pub fn open<A: ArchiveReader>(
    archive: &mut A,
    config: SheetConfig,
) -> Result<Grid, PersistenceError> {
    let bytes = archive.read_member(PROJECT_MEMBER)?;
    let project: Project = serde_json::from_slice(&bytes)?;
    project.to_grid_with(config)
}

/// Exports `grid` as a zip bundle at `path`.
///
/// The archive is built in memory and then swapped in over `path`, so a failed
/// export leaves any existing bundle untouched.
pub fn export_to_path(grid: &Grid, path: impl AsRef<Path>) -> Result<(), Error> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    export(grid, &mut zip)?;
    let bytes = zip.finish().map_err(PersistenceError::from)?.into_inner();
    atomic_write(path.as_ref(), &bytes)?;
    Ok(())
}

/// Opens the zip bundle at `path`.
pub fn open_path(path: impl AsRef<Path>, config: SheetConfig) -> Result<Grid, PersistenceError> {
    let file = File::open(path.as_ref())?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    open(&mut zip, config)
}

// ============================================================================
// Snapshots
// ============================================================================

/// Writes a bare project JSON file, for autosave and crash recovery.
pub fn save_snapshot(grid: &Grid, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec(&Project::from_grid(grid))?;
    atomic_write(path.as_ref(), &json)
}

/// Reads a project JSON file written by [`save_snapshot`].
pub fn recover_snapshot(
    path: impl AsRef<Path>,
    config: SheetConfig,
) -> Result<Grid, PersistenceError> {
    let file = File::open(path.as_ref())?;
    let project: Project = serde_json::from_reader(BufReader::new(file))?;
    project.to_grid_with(config)
}

// ============================================================================
// File Helpers
// ============================================================================

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let temp_path = temp_sibling(path);

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    let result = written.and_then(|()| fs::rename(&temp_path, path));

    if let Err(e) = result {
        // Best effort cleanup
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
