//! Query layer - blog-scoped post listings, tag aggregation and blog listings

mod cursor;

pub use cursor::Cursor;

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::content::{Blog, BlogId, Identity, Post};
use crate::error::{Error, Result};
use crate::store::ContentStore;

/// Default number of posts per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parameters of a post listing
#[derive(Debug, Clone)]
pub struct PostQuery {
    /// Only posts carrying this exact tag; an empty string means no filter
    pub tag: Option<String>,
    /// Resume position from a previous page
    pub cursor: Option<Cursor>,
    pub page_size: usize,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            tag: None,
            cursor: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PostQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Build from raw request parameters; the token must be a valid cursor
    pub fn from_params(tag: Option<&str>, token: Option<&str>, page_size: usize) -> Result<Self> {
        let cursor = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Some(Cursor::decode(token)?),
            None => None,
        };
        Ok(Self {
            tag: tag.map(str::to_string),
            cursor,
            page_size,
        })
    }

    /// The effective tag filter
    fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }
}

/// One page of a post listing
#[derive(Debug, Clone)]
pub struct PostPage {
    pub items: Vec<Post>,
    /// Present iff `has_more`
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl PostPage {
    pub fn next_token(&self) -> Option<String> {
        self.next_cursor.map(|c| c.encode())
    }
}

/// Select one page from `posts` in reverse-chronological order
///
/// Newer posts come first; posts created in the same instant are ordered
/// newest-inserted first, i.e. by descending post id.
pub fn paginate<'a, I>(posts: I, query: &PostQuery) -> Result<PostPage>
where
    I: IntoIterator<Item = &'a Post>,
{
    if query.page_size == 0 {
        return Err(Error::validation("page size must be at least 1"));
    }

    let tag = query.tag_filter();
    let mut matching: Vec<&Post> = posts
        .into_iter()
        .filter(|post| tag.map_or(true, |tag| post.has_tag(tag)))
        .filter(|post| query.cursor.map_or(true, |cursor| cursor.precedes(post)))
        .collect();
    matching.sort_by_key(|post| Reverse((post.created_at, post.id())));

    let has_more = matching.len() > query.page_size;
    matching.truncate(query.page_size);

    let items: Vec<Post> = matching.into_iter().cloned().collect();
    let next_cursor = if has_more {
        items.last().map(Cursor::after)
    } else {
        None
    };

    Ok(PostPage {
        items,
        next_cursor,
        has_more,
    })
}

impl ContentStore {
    /// List the posts of one blog, newest first
    pub fn list_posts(&self, blog_id: BlogId, query: &PostQuery) -> Result<PostPage> {
        let page = self.scan_blog(blog_id, |entry| paginate(entry.posts.values(), query))??;
        tracing::debug!(
            "Listed {} posts of blog {} (tag: {:?}, more: {})",
            page.items.len(),
            blog_id,
            query.tag_filter(),
            page.has_more
        );
        Ok(page)
    }

    /// Every distinct non-empty tag used in a blog, ascending
    ///
    /// This scans all posts of the blog on each call.
    pub fn list_tags(&self, blog_id: BlogId) -> Result<BTreeSet<String>> {
        self.scan_blog(blog_id, |entry| {
            entry
                .posts
                .values()
                .flat_map(|post| post.tags.iter())
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// Blogs ordered by name, optionally only those written by `author`
    ///
    /// Blogs with equal names keep creation order.
    pub fn list_blogs(&self, author: Option<&Identity>) -> Vec<Blog> {
        let mut blogs = self.collect_blogs(|blog| author.map_or(true, |a| &blog.author == a));
        blogs.sort_by(|a, b| a.name.cmp(&b.name));
        blogs
    }
}
