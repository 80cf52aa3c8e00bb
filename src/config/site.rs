//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Storage
    pub data_dir: String,
    /// Maximum accepted upload size in bytes
    pub upload_limit: u64,

    // Listing
    pub per_page: usize,
    pub summary_length: usize,

    // Date / Time format
    pub date_format: String,

    // Identity
    pub cookie_name: String,

    #[serde(default)]
    pub server: ServerConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Quill".to_string(),
            description: String::new(),
            language: "en".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            data_dir: "data".to_string(),
            upload_limit: 10 * 1024 * 1024,

            per_page: 10,
            summary_length: 500,

            date_format: "YYYY-MM-DD HH:mm".to_string(),

            cookie_name: "quill_user".to_string(),

            server: ServerConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the stores cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            anyhow::bail!("per_page must be at least 1");
        }
        if !self.root.starts_with('/') {
            anyhow::bail!("root must start with '/', got {:?}", self.root);
        }
        if self.data_dir.trim().is_empty() {
            anyhow::bail!("data_dir must not be empty");
        }
        if self.cookie_name.trim().is_empty() {
            anyhow::bail!("cookie_name must not be empty");
        }
        Ok(())
    }
}

/// Listen address for `quill server`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
        }
    }
}
