//! Initialize a new quill site

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Default configuration written by `quill init`
const DEFAULT_CONFIG: &str = r#"# Quill Configuration

# Site
title: Quill
description: ''
language: en

# URL
url: http://localhost:4000
root: /

# Storage
data_dir: data
upload_limit: 10485760

# Listing
per_page: 10
summary_length: 500

# Date / Time format
date_format: YYYY-MM-DD HH:mm

# Identity
cookie_name: quill_user

# Server
server:
  ip: localhost
  port: 4000
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("Site already initialized: {:?}", config_path);
    }

    fs::create_dir_all(target_dir)?;
    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::create_dir_all(target_dir.join("data"))?;

    tracing::info!("Wrote {:?}", config_path);
    Ok(())
}
