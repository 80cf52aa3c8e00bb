//! quill: a small hosted blogging service
//!
//! Users log in, create blogs, write tagged posts, browse paginated listings
//! and upload images. Posts are stored under their blog's key so that every
//! listing scoped to a blog sees the author's latest writes.

pub mod auth;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod helpers;
pub mod media;
pub mod query;
pub mod server;
pub mod store;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The application: configuration plus the stores it serves
#[derive(Clone)]
pub struct Quill {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Data directory (snapshots and blobs)
    pub data_dir: PathBuf,
    /// Blogs and posts
    pub content: Arc<store::ContentStore>,
    /// Upload records
    pub media: Arc<media::MediaStore>,
}

impl Quill {
    /// Open the site in `base_dir`, loading `_config.yml` and the data directory
    pub async fn open<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = Self::load_config(&base_dir)?;
        let data_dir = base_dir.join(&config.data_dir);

        let content = store::ContentStore::open(&data_dir)?;
        let blobs =
            media::FilesystemBlobStore::new(data_dir.join("blobs"), config.upload_limit).await?;
        let media = media::MediaStore::open(&data_dir, Arc::new(blobs))?;

        Ok(Self {
            config,
            base_dir,
            data_dir,
            content: Arc::new(content),
            media: Arc::new(media),
        })
    }

    /// A site whose records live only as long as the process
    pub fn ephemeral(config: config::SiteConfig) -> Self {
        let blobs = media::MemoryBlobStore::new(config.upload_limit);
        Self {
            base_dir: PathBuf::from("."),
            data_dir: PathBuf::from(&config.data_dir),
            content: Arc::new(store::ContentStore::in_memory()),
            media: Arc::new(media::MediaStore::in_memory(Arc::new(blobs))),
            config,
        }
    }

    /// Load `_config.yml` from `base_dir`, or defaults when it is absent
    pub fn load_config(base_dir: &Path) -> anyhow::Result<config::SiteConfig> {
        let config_path = base_dir.join("_config.yml");
        if config_path.exists() {
            config::SiteConfig::load(&config_path)
        } else {
            Ok(config::SiteConfig::default())
        }
    }

    /// Initialize a new site
    pub fn init(&self) -> anyhow::Result<()> {
        commands::init::init_site(&self.base_dir)
    }

    /// Delete all stored records and blobs
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}
