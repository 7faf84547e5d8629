//! Async JSON snapshot file helpers.
//!
//! Snapshots are written to a sibling temp file and renamed into place, so a
//! reader never observes a half-written document.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::{Error, Result};

/// Read and deserialize a JSON file.
///
/// Returns `Ok(None)` when the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !fs::try_exists(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?
    {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))?;
    Ok(Some(value))
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
///
/// Parent directories are created as needed.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(e, parent))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)
        .await
        .map_err(|e| Error::io_with_path(e, &tmp))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
