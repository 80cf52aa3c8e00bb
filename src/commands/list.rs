//! List site content

use anyhow::Result;
use std::io::Write;

use crate::content::{BlogId, Identity};
use crate::query::PostQuery;
use crate::Quill;

/// What `quill list` should print
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub blog: Option<BlogId>,
    pub author: Option<String>,
    pub tag: Option<String>,
}

/// List site content by type
pub fn run(quill: &Quill, content_type: &str, options: &ListOptions) -> Result<()> {
    let stdout = std::io::stdout();
    write_listing(quill, content_type, options, &mut stdout.lock())
}

/// Write the listing for `content_type` to `out`
pub fn write_listing(
    quill: &Quill,
    content_type: &str,
    options: &ListOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let author = options.author.as_deref().and_then(Identity::new);

    match content_type {
        "blog" | "blogs" => {
            let blogs = quill.content.list_blogs(author.as_ref());
            writeln!(out, "Blogs ({}):", blogs.len())?;
            for blog in blogs {
                writeln!(out, "  [{}] {} - {}", blog.id, blog.name, blog.author)?;
            }
        }
        "post" | "posts" => {
            let blog = require_blog(options)?;
            let mut query = PostQuery::new(quill.config.per_page);
            query.tag = options.tag.clone();

            let mut total = 0;
            writeln!(out, "Posts of blog {}:", blog)?;
            loop {
                let page = quill.content.list_posts(blog, &query)?;
                for post in &page.items {
                    writeln!(
                        out,
                        "  {} - {} [{}]",
                        post.created_at.format("%Y-%m-%d %H:%M"),
                        post.title,
                        post.tags.join(", ")
                    )?;
                }
                total += page.items.len();
                match page.next_cursor {
                    Some(cursor) => query.cursor = Some(cursor),
                    None => break,
                }
            }
            writeln!(out, "({} posts)", total)?;
        }
        "tag" | "tags" => {
            let blog = require_blog(options)?;
            let tags = quill.content.list_tags(blog)?;
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {}", tag)?;
            }
        }
        "image" | "images" => {
            let Some(owner) = author else {
                anyhow::bail!("Listing images needs --author");
            };
            let images = quill.media.list_by_owner(&owner);
            writeln!(out, "Images ({}):", images.len())?;
            for image in images {
                writeln!(out, "  {} - {}", image.filename, image.url(&quill.config))?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: blogs, posts, tags, images",
                content_type
            );
        }
    }

    Ok(())
}

fn require_blog(options: &ListOptions) -> Result<BlogId> {
    options
        .blog
        .ok_or_else(|| anyhow::anyhow!("This listing needs --blog <ID>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::PostDraft;

    fn listing(quill: &Quill, kind: &str, options: &ListOptions) -> String {
        let mut out = Vec::new();
        write_listing(quill, kind, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn site() -> (Quill, BlogId) {
        let mut config = SiteConfig::default();
        config.per_page = 2;
        let quill = Quill::ephemeral(config);
        let alice = Identity::new("alice").unwrap();
        let blog = quill.content.create_blog("Notes", Some(&alice)).unwrap();
        for (title, tags) in [("one", "b, a"), ("two", "a, c"), ("three", "")] {
            quill
                .content
                .create_post(blog, Some(&alice), PostDraft::from_form(title, "", tags))
                .unwrap();
        }
        (quill, blog)
    }

    #[test]
    fn test_list_posts_walks_all_pages() {
        let (quill, blog) = site();
        let options = ListOptions {
            blog: Some(blog),
            ..Default::default()
        };
        let text = listing(&quill, "posts", &options);
        assert!(text.contains("(3 posts)"));
        let three = text.find("three").unwrap();
        let one = text.find("one").unwrap();
        assert!(three < one);
    }

    #[test]
    fn test_list_tags() {
        let (quill, blog) = site();
        let options = ListOptions {
            blog: Some(blog),
            ..Default::default()
        };
        let text = listing(&quill, "tags", &options);
        assert_eq!(text, "Tags (3):\n  a\n  b\n  c\n");
    }

    #[test]
    fn test_list_blogs() {
        let (quill, _) = site();
        let text = listing(&quill, "blogs", &ListOptions::default());
        assert!(text.starts_with("Blogs (1):"));
        assert!(text.contains("Notes - alice"));
    }

    #[test]
    fn test_errors() {
        let (quill, _) = site();
        let mut out = Vec::new();
        assert!(write_listing(&quill, "posts", &ListOptions::default(), &mut out).is_err());
        assert!(write_listing(&quill, "images", &ListOptions::default(), &mut out).is_err());
        assert!(write_listing(&quill, "widgets", &ListOptions::default(), &mut out).is_err());
    }
}
