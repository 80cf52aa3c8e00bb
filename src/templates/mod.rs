//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded in the binary. Handlers build the view structs
//! below from store records; templates never see the stores themselves.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{join_tags, Blog, Identity, Post, PostDraft};
use crate::format::{format_body, summarize};
use crate::helpers::{encode_url, format_date, url_for};
use crate::media::MediaReference;
use crate::query::PostPage;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("edit.html", include_str!("site/edit.html")),
            ("images.html", include_str!("site/images.html")),
            ("login.html", include_str!("site/login.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            ("partials/post.html", include_str!("site/partials/post.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: reformat an RFC 3339 timestamp
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(format_date(
            &date.with_timezone(&chrono::Utc),
            &format,
        ))),
        // Not a timestamp: return as-is
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
}

impl ConfigData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, "/"),
        }
    }
}

/// Who is looking at the page
#[derive(Debug, Clone, Serialize)]
pub struct ViewerData {
    pub user: Option<String>,
    pub nickname: Option<String>,
    pub login_url: String,
    pub logout_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogData {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub url: String,
    pub new_post_url: String,
}

impl BlogData {
    pub fn new(config: &SiteConfig, blog: &Blog) -> Self {
        Self {
            id: blog.id.0,
            name: blog.name.clone(),
            author: blog.author.nickname().to_string(),
            url: url_for(config, &format!("blog/{}", blog.id)),
            new_post_url: url_for(config, &format!("blog/{}/new", blog.id)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub body_html: String,
    pub tags: Vec<String>,
    pub created: String,
    pub created_iso: String,
    pub edited: Option<String>,
    pub url: String,
    pub blog_url: String,
    pub edit_url: String,
    pub can_edit: bool,
}

impl PostData {
    /// View of a post; `summary` keeps only the configured leading part of the body
    pub fn new(
        config: &SiteConfig,
        post: &Post,
        viewer: Option<&Identity>,
        summary: bool,
    ) -> Self {
        let blog_url = url_for(config, &format!("blog/{}", post.blog_id()));
        let url = format!("{}/post/{}", blog_url, post.id());
        let body_html = if summary {
            summarize(&post.body, config.summary_length)
        } else {
            format_body(&post.body)
        };

        Self {
            id: post.id().0,
            title: post.title.clone(),
            author: post.author.nickname().to_string(),
            body_html,
            tags: post.tags.iter().filter(|t| !t.is_empty()).cloned().collect(),
            created: format_date(&post.created_at, &config.date_format),
            created_iso: post.created_at.to_rfc3339(),
            edited: post
                .is_edited()
                .then(|| format_date(&post.edited_at, &config.date_format)),
            edit_url: format!("{}/edit", url),
            url,
            blog_url,
            can_edit: viewer == Some(&post.author),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub has_more: bool,
    pub next_url: Option<String>,
}

impl PaginationData {
    /// Link to the page after `page`, keeping the tag filter
    pub fn new(blog_url: &str, tag: Option<&str>, page: &PostPage) -> Self {
        let next_url = page.next_token().map(|token| match tag {
            Some(tag) if !tag.is_empty() => format!(
                "{}?tag={}&cursor={}",
                blog_url,
                encode_url(tag),
                token
            ),
            _ => format!("{}?cursor={}", blog_url, token),
        });
        Self {
            has_more: page.has_more,
            next_url,
        }
    }
}

/// Form values for the new/edit post page
#[derive(Debug, Clone, Serialize)]
pub struct DraftData {
    pub title: String,
    pub body: String,
    pub tags: String,
}

impl From<&PostDraft> for DraftData {
    fn from(draft: &PostDraft) -> Self {
        Self {
            title: draft.title.clone(),
            body: draft.body.clone(),
            tags: join_tags(&draft.tags),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageData {
    pub filename: String,
    pub url: String,
    pub is_image: bool,
}

impl ImageData {
    pub fn new(config: &SiteConfig, media: &MediaReference) -> Self {
        Self {
            filename: media.filename.clone(),
            url: media.url(config),
            is_image: media.is_image(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BlogId, PostId, PostKey};
    use chrono::{Duration, TimeZone, Utc};

    fn viewer() -> ViewerData {
        ViewerData {
            user: None,
            nickname: None,
            login_url: "/login?next=%2F".to_string(),
            logout_url: "/logout?next=%2F".to_string(),
        }
    }

    fn post(body: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 0).unwrap();
        Post {
            key: PostKey {
                blog: BlogId(2),
                post: PostId(7),
            },
            author: Identity::new("alice@example.com").unwrap(),
            title: "Hello <world>".to_string(),
            body: body.to_string(),
            tags: vec!["rust".to_string(), "".to_string()],
            created_at: created,
            edited_at: created + Duration::hours(1),
        }
    }

    #[test]
    fn test_post_data() {
        let config = SiteConfig::default();
        let post = post("hi\nhttps://x.com/a.png");
        let alice = Identity::new("alice@example.com").unwrap();

        let data = PostData::new(&config, &post, Some(&alice), false);
        assert_eq!(data.url, "/blog/2/post/7");
        assert_eq!(data.edit_url, "/blog/2/post/7/edit");
        assert_eq!(data.author, "alice");
        assert_eq!(data.created, "2024-02-03 04:05");
        assert_eq!(data.edited.as_deref(), Some("2024-02-03 05:05"));
        assert_eq!(data.tags, vec!["rust"]);
        assert!(data.can_edit);
        assert_eq!(data.body_html, r#"hi<br><img src="https://x.com/a.png">"#);

        let anonymous = PostData::new(&config, &post, None, false);
        assert!(!anonymous.can_edit);
    }

    #[test]
    fn test_summary_uses_configured_length() {
        let mut config = SiteConfig::default();
        config.summary_length = 4;
        let data = PostData::new(&config, &post("abcdefgh"), None, true);
        assert_eq!(data.body_html, "abcd");
    }

    #[test]
    fn test_render_post_page_escapes_title() {
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new().unwrap();
        let post = post("body text");
        let blog = Blog {
            id: BlogId(2),
            name: "Journal".to_string(),
            author: post.author.clone(),
            created_at: post.created_at,
        };

        let mut context = Context::new();
        context.insert("config", &ConfigData::new(&config));
        context.insert("viewer", &viewer());
        context.insert("blog", &BlogData::new(&config, &blog));
        context.insert("post", &PostData::new(&config, &post, None, false));

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("Hello &lt;world&gt;"));
        assert!(html.contains("body text"));
        assert!(html.contains("/blog/2?tag=rust"));
        assert!(!html.contains("/edit"));
    }

    #[test]
    fn test_pagination_links() {
        use crate::query::Cursor;
        let cursor = Cursor {
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            post: PostId(3),
        };
        let page = PostPage {
            items: Vec::new(),
            next_cursor: Some(cursor),
            has_more: true,
        };
        let data = PaginationData::new("/blog/1", Some("a b"), &page);
        assert_eq!(
            data.next_url.unwrap(),
            format!("/blog/1?tag=a%20b&cursor={}", cursor.encode())
        );

        let data = PaginationData::new("/blog/1", Some(""), &page);
        assert_eq!(
            data.next_url.unwrap(),
            format!("/blog/1?cursor={}", cursor.encode())
        );
    }

    #[test]
    fn test_date_format_filter() {
        let mut args = HashMap::new();
        args.insert("format".to_string(), tera::Value::String("YYYY".to_string()));
        let value = tera::Value::String("2024-02-03T04:05:00+00:00".to_string());
        assert_eq!(
            date_format_filter(&value, &args).unwrap(),
            tera::Value::String("2024".to_string())
        );
        let value = tera::Value::String("yesterday".to_string());
        assert_eq!(
            date_format_filter(&value, &HashMap::new()).unwrap(),
            tera::Value::String("yesterday".to_string())
        );
    }
}
