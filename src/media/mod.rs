//! Media reference store - records of uploaded images per owner

mod blob;

pub use blob::{BlobStore, FilesystemBlobStore, MemoryBlobStore, StorageKey};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::SiteConfig;
use crate::content::Identity;
use crate::error::{Error, Result};
use crate::helpers::{encode_segment, encode_url, full_url_for};
use crate::store::snapshot;

/// Snapshot file name inside the data directory
const MEDIA_FILE: &str = "media.json";

/// Current snapshot format version
const VERSION: u32 = 1;

/// Numeric id of an upload record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

/// A record of one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: MediaId,
    pub owner: Identity,
    pub storage_key: StorageKey,
    /// Original file name; its extension decides how links render
    pub filename: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl MediaReference {
    /// Route path serving this upload, relative to the site root
    pub fn path(&self) -> String {
        format!(
            "img/{}/{}",
            self.storage_key,
            encode_segment(&self.filename)
        )
    }

    /// Absolute URL to paste into post bodies
    pub fn url(&self, config: &SiteConfig) -> String {
        full_url_for(config, &self.path())
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Owner of all MediaReference records
pub struct MediaStore {
    records: RwLock<Vec<MediaReference>>,
    blobs: Arc<dyn BlobStore>,
    path: Option<PathBuf>,
}

impl MediaStore {
    /// A store that keeps records in memory only
    pub fn in_memory(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            blobs,
            path: None,
        }
    }

    /// Open the records persisted under `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        let path = data_dir.as_ref().join(MEDIA_FILE);
        let records = snapshot::load::<Vec<MediaReference>>(&path, VERSION)?.unwrap_or_default();
        tracing::info!("Opened media store {:?} ({} uploads)", path, records.len());

        Ok(Self {
            records: RwLock::new(records),
            blobs,
            path: Some(path),
        })
    }

    /// Record a blob that has already been stored
    pub fn record_upload(
        &self,
        owner: &Identity,
        storage_key: StorageKey,
        filename: &str,
    ) -> Result<MediaId> {
        let filename = clean_filename(filename)?;
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let id = MediaId(records.last().map_or(1, |r| r.id.0 + 1));
        records.push(MediaReference {
            id,
            owner: owner.clone(),
            storage_key,
            filename,
            content_type,
            uploaded_at: Utc::now(),
        });

        if let Some(path) = &self.path {
            if let Err(e) = snapshot::save(path, VERSION, &*records) {
                records.pop();
                return Err(e);
            }
        }

        tracing::info!("Recorded upload {:?} for {}", id, owner);
        Ok(id)
    }

    /// Store `data` as a new blob and record it for `owner`
    pub async fn upload(
        &self,
        owner: &Identity,
        filename: &str,
        data: &[u8],
    ) -> Result<MediaReference> {
        // Validate before touching the blob store
        clean_filename(filename)?;
        let key = self.blobs.store(data).await?;
        let id = match self.record_upload(owner, key.clone(), filename) {
            Ok(id) => id,
            Err(e) => {
                // Never leave a blob behind that no record points to
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    tracing::warn!("Failed to delete orphaned blob {}: {}", key, cleanup);
                }
                return Err(e);
            }
        };
        self.get(id)
    }

    pub fn get(&self, id: MediaId) -> Result<MediaReference> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("upload {:?}", id)))
    }

    /// Uploads of `owner`, in upload order
    pub fn list_by_owner(&self, owner: &Identity) -> Vec<MediaReference> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect()
    }

    pub fn find(&self, key: &StorageKey) -> Option<MediaReference> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| &r.storage_key == key)
            .cloned()
    }

    /// Fetch a blob's bytes, with its record when one exists
    pub async fn resolve(&self, key: &StorageKey) -> Result<(Option<MediaReference>, Vec<u8>)> {
        let data = self.blobs.retrieve(key).await?;
        Ok((self.find(key), data))
    }

    /// Where uploads are posted to; `callback` is where to go afterwards
    pub fn upload_endpoint(config: &SiteConfig, callback: &str) -> String {
        format!(
            "{}?next={}",
            crate::helpers::url_for(config, "upload"),
            encode_url(callback)
        )
    }
}

/// Reduce a client-supplied file name to its last path component
fn clean_filename(raw: &str) -> Result<String> {
    let name = raw
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::validation("upload needs a file name"));
    }
    Ok(name.to_string())
}
