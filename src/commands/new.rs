//! Create a new blog from the command line

use anyhow::Result;

use crate::content::{BlogId, Identity};
use crate::Quill;

/// Create a blog named `name` owned by `author`
pub fn create_blog(quill: &Quill, name: &str, author: &str) -> Result<BlogId> {
    let author = Identity::new(author);
    let id = quill.content.create_blog(name, author.as_ref())?;
    Ok(id)
}
