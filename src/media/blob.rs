//! Blob storage for uploaded files

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::fs;

use crate::error::{Error, Result};

/// Opaque key of a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// A fresh random key
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accept a key from outside (routes, snapshots); only `[0-9A-Za-z_-]`
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::validation(format!("invalid storage key: {:?}", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for uploaded bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh key
    async fn store(&self, data: &[u8]) -> Result<StorageKey>;

    /// Fetch all bytes of a blob
    async fn retrieve(&self, key: &StorageKey) -> Result<Vec<u8>>;

    /// Remove a blob; removing a missing blob is not an error
    async fn delete(&self, key: &StorageKey) -> Result<()>;
}

/// Blobs kept as files under `{base}/{first 2 chars}/{key}`
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, key: &StorageKey) -> PathBuf {
        let shard: String = key.as_str().chars().take(2).collect();
        self.base_path.join(shard).join(key.as_str())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn store(&self, data: &[u8]) -> Result<StorageKey> {
        check_size(data, self.max_size)?;

        let key = StorageKey::generate();
        let blob_path = self.blob_path(&key);
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Stored blob {} ({} bytes)", key, data.len());
        Ok(key)
    }

    async fn retrieve(&self, key: &StorageKey) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(format!("blob {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &StorageKey) -> Result<()> {
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => {
                tracing::debug!("Deleted blob {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Blobs kept in memory
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<StorageKey, Vec<u8>>>,
    max_size: u64,
}

impl MemoryBlobStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            max_size,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, data: &[u8]) -> Result<StorageKey> {
        check_size(data, self.max_size)?;
        let key = StorageKey::generate();
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), data.to_vec());
        Ok(key)
    }

    async fn retrieve(&self, key: &StorageKey) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("blob {}", key)))
    }

    async fn delete(&self, key: &StorageKey) -> Result<()> {
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

fn check_size(data: &[u8], limit: u64) -> Result<()> {
    let actual = data.len() as u64;
    if actual > limit {
        return Err(Error::SizeLimitExceeded { actual, limit });
    }
    Ok(())
}
