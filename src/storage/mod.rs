//! Snapshot persistence.
//!
//! Scrapers hand their latest match list to the engine through files that
//! are replaced wholesale on every poll. Writes go to a sibling temp file
//! and are renamed into place, so a reader sees either the previous
//! snapshot or the new one, never a partial file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sibling path used while a snapshot is being written.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace the snapshot at `path` with `contents`.
pub fn write_snapshot(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_path_for(path);
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

    debug!(path = %path.display(), bytes = contents.len(), "Snapshot written");
    Ok(())
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise JSON")?;
    write_snapshot(path, &json)
}

/// Read the snapshot at `path`.
/// Returns None if no snapshot has been written yet.
pub fn read_snapshot(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        debug!(path = %path.display(), "No snapshot present");
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Ok(Some(contents))
}

/// When the snapshot at `path` was last replaced, if the filesystem knows.
pub fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Delete a snapshot (for testing or reset).
pub fn delete_snapshot(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete snapshot {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
