//! Content module - blogs, posts, identities and tag handling

mod identity;
mod post;
mod tags;

pub use identity::Identity;
pub use post::{Blog, BlogId, Post, PostDraft, PostId, PostKey};
pub use tags::{join_tags, normalize_tags, split_tags};
