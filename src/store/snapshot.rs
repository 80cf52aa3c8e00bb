//! Versioned JSON snapshots written with temp-file + rename

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// On-disk envelope around a store's records
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub version: u32,
    pub data: T,
}

/// Load a snapshot, or `None` when the file does not exist yet
pub(crate) fn load<T: DeserializeOwned>(path: &Path, version: u32) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let envelope: Envelope<T> = serde_json::from_str(&content)?;
    if envelope.version != version {
        return Err(Error::SnapshotVersion {
            path: path.display().to_string(),
            found: envelope.version,
            expected: version,
        });
    }

    tracing::debug!("Loaded snapshot {:?}", path);
    Ok(Some(envelope.data))
}

/// Atomically replace the snapshot at `path`
pub(crate) fn save<T: Serialize>(path: &Path, version: u32, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(&Envelope { version, data })?;
    let temp_path = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}
