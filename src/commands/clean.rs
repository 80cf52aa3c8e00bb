//! Clean the data directory

use anyhow::Result;
use std::fs;

use crate::Quill;

/// Delete every stored blog, post, upload record and blob
pub fn run(quill: &Quill) -> Result<()> {
    if quill.data_dir.exists() {
        fs::remove_dir_all(&quill.data_dir)?;
        tracing::info!("Deleted: {:?}", quill.data_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_removes_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let quill = Quill::open(dir.path()).await.unwrap();
        let alice = crate::content::Identity::new("alice").unwrap();
        quill.content.create_blog("Gone", Some(&alice)).unwrap();
        assert!(quill.data_dir.join("content.json").exists());

        run(&quill).unwrap();
        assert!(!quill.data_dir.exists());

        let reopened = Quill::open(dir.path()).await.unwrap();
        assert_eq!(reopened.content.blog_count(), 0);
    }
}
