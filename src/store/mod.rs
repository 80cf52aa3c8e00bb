//! Content store - blogs and their posts, keyed hierarchically
//!
//! Every post lives inside its blog's entry, so the post key is the pair
//! `(BlogId, PostId)`. Writes run the authorization check and the mutation
//! under one write lock and persist before the lock is released; reads scoped
//! to a blog therefore observe every write that returned successfully.

mod clock;
pub(crate) mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::content::{normalize_tags, Blog, BlogId, Identity, Post, PostDraft, PostId, PostKey};
use crate::error::{Error, Result};

/// Snapshot file name inside the data directory
const CONTENT_FILE: &str = "content.json";

/// Current snapshot format version
const VERSION: u32 = 1;

/// A blog together with the posts scoped under it
#[derive(Debug, Clone)]
pub(crate) struct BlogEntry {
    pub blog: Blog,
    pub posts: BTreeMap<PostId, Post>,
    next_post_id: u64,
}

#[derive(Debug, Default)]
struct Hierarchy {
    blogs: BTreeMap<BlogId, BlogEntry>,
    next_blog_id: u64,
}

/// Serialized form of [`Hierarchy`]
#[derive(Debug, Serialize, Deserialize)]
struct HierarchyRecord {
    next_blog_id: u64,
    blogs: Vec<BlogRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlogRecord {
    blog: Blog,
    next_post_id: u64,
    posts: Vec<Post>,
}

impl Hierarchy {
    fn to_record(&self) -> HierarchyRecord {
        HierarchyRecord {
            next_blog_id: self.next_blog_id,
            blogs: self
                .blogs
                .values()
                .map(|entry| BlogRecord {
                    blog: entry.blog.clone(),
                    next_post_id: entry.next_post_id,
                    posts: entry.posts.values().cloned().collect(),
                })
                .collect(),
        }
    }

    fn from_record(record: HierarchyRecord) -> Result<Self> {
        let mut blogs = BTreeMap::new();
        for rec in record.blogs {
            let id = rec.blog.id;
            let mut posts = BTreeMap::new();
            for post in rec.posts {
                if post.key.blog != id {
                    return Err(Error::validation(format!(
                        "post {} stored under blog {}",
                        post.key, id
                    )));
                }
                posts.insert(post.key.post, post);
            }
            blogs.insert(
                id,
                BlogEntry {
                    blog: rec.blog,
                    posts,
                    next_post_id: rec.next_post_id,
                },
            );
        }
        Ok(Self {
            blogs,
            next_blog_id: record.next_blog_id,
        })
    }

    fn entry(&self, id: BlogId) -> Result<&BlogEntry> {
        self.blogs
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("blog {}", id)))
    }

    fn entry_mut(&mut self, id: BlogId) -> Result<&mut BlogEntry> {
        self.blogs
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("blog {}", id)))
    }
}

/// Owner of all Blog and Post records
pub struct ContentStore {
    inner: RwLock<Hierarchy>,
    /// Snapshot location; `None` keeps everything in memory
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl ContentStore {
    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Hierarchy::default()),
            path: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Open the store persisted under `data_dir`, creating it if needed
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let path = data_dir.as_ref().join(CONTENT_FILE);
        let hierarchy = match snapshot::load::<HierarchyRecord>(&path, VERSION)? {
            Some(record) => Hierarchy::from_record(record)?,
            None => Hierarchy::default(),
        };

        tracing::info!(
            "Opened content store {:?} ({} blogs)",
            path,
            hierarchy.blogs.len()
        );

        Ok(Self {
            inner: RwLock::new(hierarchy),
            path: Some(path),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Hierarchy> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Hierarchy> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Rewrite the whole snapshot; runs under the write lock, on the caller's thread
    fn persist(&self, hierarchy: &Hierarchy) -> Result<()> {
        match &self.path {
            Some(path) => snapshot::save(path, VERSION, &hierarchy.to_record()),
            None => Ok(()),
        }
    }

    /// Create a blog owned by `author`
    pub fn create_blog(&self, name: &str, author: Option<&Identity>) -> Result<BlogId> {
        let author = author.ok_or_else(|| Error::validation("creating a blog requires a login"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("blog name must not be empty"));
        }

        let mut hierarchy = self.write();
        let id = BlogId(hierarchy.next_blog_id + 1);
        let blog = Blog {
            id,
            name: name.to_string(),
            author: author.clone(),
            created_at: clock::stamp(self.clock.as_ref()),
        };

        hierarchy.next_blog_id = id.0;
        hierarchy.blogs.insert(
            id,
            BlogEntry {
                blog,
                posts: BTreeMap::new(),
                next_post_id: 0,
            },
        );

        if let Err(e) = self.persist(&hierarchy) {
            hierarchy.blogs.remove(&id);
            hierarchy.next_blog_id = id.0 - 1;
            return Err(e);
        }

        tracing::info!("Created blog {} {:?} for {}", id, name, author);
        Ok(id)
    }

    /// Create a post under `blog_id`; only the blog's author may do so
    pub fn create_post(
        &self,
        blog_id: BlogId,
        author: Option<&Identity>,
        draft: PostDraft,
    ) -> Result<PostId> {
        let now = clock::stamp(self.clock.as_ref());
        let mut hierarchy = self.write();
        let entry = hierarchy.entry_mut(blog_id)?;
        check_author(author, &entry.blog.author, &format!("blog {}", blog_id))?;

        let post_id = PostId(entry.next_post_id + 1);
        let post = Post {
            key: PostKey {
                blog: blog_id,
                post: post_id,
            },
            author: entry.blog.author.clone(),
            title: draft.title,
            body: draft.body,
            tags: normalize_tags(&draft.tags),
            created_at: now,
            edited_at: now,
        };
        entry.next_post_id = post_id.0;
        entry.posts.insert(post_id, post);

        if let Err(e) = self.persist(&hierarchy) {
            if let Ok(entry) = hierarchy.entry_mut(blog_id) {
                entry.posts.remove(&post_id);
                entry.next_post_id = post_id.0 - 1;
            }
            return Err(e);
        }

        tracing::info!("Created post {}/{}", blog_id, post_id);
        Ok(post_id)
    }

    /// Overwrite a post's title, body and tags; only its author may do so
    pub fn edit_post(
        &self,
        blog_id: BlogId,
        post_id: PostId,
        author: Option<&Identity>,
        draft: PostDraft,
    ) -> Result<()> {
        let now = clock::stamp(self.clock.as_ref());
        let mut hierarchy = self.write();
        let entry = hierarchy.entry_mut(blog_id)?;
        let post = entry
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| Error::not_found(format!("post {}/{}", blog_id, post_id)))?;
        check_author(author, &post.author, &format!("post {}/{}", blog_id, post_id))?;

        let previous = post.clone();
        post.title = draft.title;
        post.body = draft.body;
        post.tags = normalize_tags(&draft.tags);
        // Never move edited_at behind created_at, even if the clock does
        post.edited_at = now.max(post.created_at);

        if let Err(e) = self.persist(&hierarchy) {
            if let Ok(entry) = hierarchy.entry_mut(blog_id) {
                entry.posts.insert(post_id, previous);
            }
            return Err(e);
        }

        tracing::info!("Edited post {}/{}", blog_id, post_id);
        Ok(())
    }

    pub fn get_blog(&self, blog_id: BlogId) -> Result<Blog> {
        Ok(self.read().entry(blog_id)?.blog.clone())
    }

    pub fn get_post(&self, blog_id: BlogId, post_id: PostId) -> Result<Post> {
        self.read()
            .entry(blog_id)?
            .posts
            .get(&post_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("post {}/{}", blog_id, post_id)))
    }

    /// Run `f` over one blog's entry under the read lock
    pub(crate) fn scan_blog<R>(
        &self,
        blog_id: BlogId,
        f: impl FnOnce(&BlogEntry) -> R,
    ) -> Result<R> {
        let hierarchy = self.read();
        Ok(f(hierarchy.entry(blog_id)?))
    }

    /// Clone the blogs matching `keep`, in id order
    pub(crate) fn collect_blogs(&self, keep: impl Fn(&Blog) -> bool) -> Vec<Blog> {
        self.read()
            .blogs
            .values()
            .map(|entry| &entry.blog)
            .filter(|blog| keep(blog))
            .cloned()
            .collect()
    }

    pub fn blog_count(&self) -> usize {
        self.read().blogs.len()
    }
}

fn check_author(author: Option<&Identity>, required: &Identity, what: &str) -> Result<()> {
    match author {
        Some(author) if author == required => Ok(()),
        Some(author) => {
            tracing::warn!("{} may not write to {} owned by {}", author, what, required);
            Err(Error::unauthorized(format!("{} belongs to another author", what)))
        }
        None => Err(Error::unauthorized(format!("writing to {} requires a login", what))),
    }
}
