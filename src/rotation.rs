//! Session log rotation
//!
//! Runs once at startup, before anything is logged. The previous session's
//! `00A-latest.log` is copied to a path derived from its last-modified time,
//! then replaced with an empty file for the new session.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{LogError, Result};
use crate::fault;

/// File name of the current session log inside `full/`
pub const LATEST_LOG_NAME: &str = "00A-latest.log";

/// Archive path for a session log last modified at `modified`
///
/// Layout: `<full>/<yyyy>/<Month>/<dd EEE>/<HH-mm-ss  yyyy-MM-dd>.log`
pub fn archive_path_for(full_dir: &Path, modified: DateTime<Local>) -> PathBuf {
    full_dir
        .join(modified.format("%Y").to_string())
        .join(modified.format("%B").to_string())
        .join(modified.format("%d %a").to_string())
        .join(format!("{}.log", modified.format("%H-%M-%S  %Y-%m-%d")))
}

/// Outcome of a rotation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// There was no previous log, or it was empty
    Skipped,
    /// The previous log was copied to this path
    Archived(PathBuf),
    /// An archive with the derived name already existed and was kept
    AlreadyArchived(PathBuf),
    /// Archiving failed; the fault was reported
    Failed,
}

/// Archive the previous session log and recreate an empty one
///
/// Archiving is best-effort. Only failing to recreate the fresh latest file is
/// returned as an error.
pub fn rotate_latest(full_dir: &Path) -> Result<(PathBuf, Rotation)> {
    let latest = full_dir.join(LATEST_LOG_NAME);

    let rotation = match archive_previous(full_dir, &latest) {
        Ok(rotation) => rotation,
        Err(e) => {
            fault::report("failed to archive previous session log", &e);
            Rotation::Failed
        }
    };

    if latest.exists() {
        fs::remove_file(&latest)
            .map_err(|e| LogError::io("failed to remove previous session log", &latest, e))?;
    }
    File::create(&latest)
        .map_err(|e| LogError::io("failed to create session log", &latest, e))?;

    tracing::debug!(path = %latest.display(), ?rotation, "Rotated session log");
    Ok((latest, rotation))
}

fn archive_previous(full_dir: &Path, latest: &Path) -> Result<Rotation> {
    let metadata = match fs::metadata(latest) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Rotation::Skipped),
        Err(e) => return Err(LogError::io("failed to inspect previous session log", latest, e)),
    };
    if metadata.len() == 0 {
        return Ok(Rotation::Skipped);
    }

    let modified = metadata
        .modified()
        .map_err(|e| LogError::io("failed to read modification time", latest, e))?;
    let archive = archive_path_for(full_dir, DateTime::<Local>::from(modified));

    if archive.exists() {
        return Ok(Rotation::AlreadyArchived(archive));
    }

    if let Some(day_dir) = archive.parent() {
        fs::create_dir_all(day_dir)
            .map_err(|e| LogError::io("failed to create archive directory", day_dir, e))?;
    }
    fs::copy(latest, &archive)
        .map_err(|e| LogError::io("failed to copy session log", &archive, e))?;

    Ok(Rotation::Archived(archive))
}
