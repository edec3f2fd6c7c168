//! Snapshot ingestion.
//!
//! The issue source for this repository is a local snapshot: exported
//! tracker JSON on disk (either a bare issue array or a search-response
//! envelope). [`load_snapshot`] reads and decodes one file;
//! [`discover_snapshots`] finds candidates in a directory. Everything
//! inside an individual issue degrades with warnings; only file-level
//! problems (unreadable path, invalid JSON document) are fatal.

pub mod decode;

pub use decode::{decode_issue, decode_issues, normalize_history, parse_datetime};

use crate::config::FieldMap;
use crate::error::{Error, Result};
use crate::types::{DecodeWarning, IssueRecord};
use decode::SnapshotDocument;
use std::path::{Path, PathBuf};

/// Result of loading one snapshot file.
#[derive(Debug)]
pub struct SnapshotBatch {
    /// Path the snapshot was loaded from
    pub source: PathBuf,
    /// Fully-typed issues, in export order
    pub issues: Vec<IssueRecord>,
    /// Non-fatal decode problems encountered along the way
    pub warnings: Vec<DecodeWarning>,
}

/// Load and decode one exported snapshot file.
pub fn load_snapshot(path: &Path, fields: &FieldMap) -> Result<SnapshotBatch> {
    let content = std::fs::read_to_string(path)?;

    let document: SnapshotDocument =
        serde_json::from_str(&content).map_err(|e| Error::Snapshot {
            path: path.display().to_string(),
            message: format!("not a recognized snapshot document: {}", e),
        })?;

    let (issues, warnings) = decode_issues(document.into_issues(), fields);

    tracing::info!(
        path = %path.display(),
        issues = issues.len(),
        warnings = warnings.len(),
        "Loaded snapshot"
    );
    for warning in &warnings {
        tracing::warn!(issue = %warning.issue, field = %warning.field, "{}", warning.reason);
    }

    Ok(SnapshotBatch {
        source: path.to_path_buf(),
        issues,
        warnings,
    })
}

/// Discover exported `*.json` snapshots in a directory, newest first by
/// file name (exports are conventionally date-stamped).
pub fn discover_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.json");
    let pattern_str = pattern.to_string_lossy();

    let entries = glob::glob(&pattern_str).map_err(|e| Error::Snapshot {
        path: dir.display().to_string(),
        message: format!("invalid glob pattern: {}", e),
    })?;

    let mut files: Vec<PathBuf> = entries.flatten().collect();
    files.sort();
    files.reverse();
    Ok(files)
}

/// Newest discovered snapshot, if any.
pub fn latest_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(discover_snapshots(dir)?.into_iter().next())
}
