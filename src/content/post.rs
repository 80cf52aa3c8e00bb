//! Blog and Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Identity;

/// Stable numeric identifier of a blog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlogId(pub u64);

/// Identifier of a post, unique only within its blog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

/// Ancestor key of a post: the parent blog's id followed by the post's own id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostKey {
    pub blog: BlogId,
    pub post: PostId,
}

macro_rules! numeric_id {
    ($name:ident, $what:literal) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|_| crate::Error::validation(format!("invalid {} id: {:?}", $what, s)))
            }
        }
    };
}

numeric_id!(BlogId, "blog");
numeric_id!(PostId, "post");

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.blog, self.post)
    }
}

/// A blog: the root of a post hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,

    /// Display name, not unique
    pub name: String,

    /// Set once at creation, never reassigned
    pub author: Identity,

    pub created_at: DateTime<Utc>,
}

/// A blog post, scoped under its blog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub key: PostKey,

    pub author: Identity,

    pub title: String,

    /// Raw author-supplied text; see [`crate::format`] for rendering
    pub body: String,

    /// Trimmed labels in author order; duplicates are kept
    pub tags: Vec<String>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Refreshed on every write
    pub edited_at: DateTime<Utc>,
}

impl Post {
    pub fn blog_id(&self) -> BlogId {
        self.key.blog
    }

    pub fn id(&self) -> PostId {
        self.key.post
    }

    /// Whether the post carries `tag` exactly (case-sensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the post has been edited since it was created
    pub fn is_edited(&self) -> bool {
        self.edited_at > self.created_at
    }
}

/// The author-editable part of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags,
        }
    }

    /// Build a draft from form input where tags are a comma-separated string
    pub fn from_form(title: &str, body: &str, tags: &str) -> Self {
        Self::new(title, body, super::split_tags(tags))
    }
}
