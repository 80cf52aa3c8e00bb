//! HTTP front end: blog, post, image and login pages

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, OriginalUri, Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use tower_http::trace::TraceLayer;

use crate::auth::{CookieIdentity, IdentityProvider};
use crate::content::{join_tags, BlogId, Identity, PostDraft, PostId};
use crate::error::Error;
use crate::helpers::url_for;
use crate::media::{MediaStore, StorageKey};
use crate::query::PostQuery;
use crate::templates::{
    BlogData, ConfigData, DraftData, ImageData, PaginationData, PostData, TemplateRenderer,
    ViewerData,
};
use crate::Quill;

/// Headroom for multipart framing on top of the upload limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared server state
pub struct AppState {
    quill: Quill,
    templates: TemplateRenderer,
    identity: CookieIdentity,
}

impl AppState {
    pub fn new(quill: Quill) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            identity: CookieIdentity::new(&quill.config),
            quill,
        })
    }

    fn url(&self, path: &str) -> String {
        url_for(&self.quill.config, path)
    }

    /// Local return path from a `next` parameter, `default` when absent
    fn return_path(&self, next: Option<&str>, default: &str) -> String {
        match next {
            Some(next) => self.identity.return_path(next),
            None => self.url(default),
        }
    }

    /// Base template context: site config and who is looking
    fn context(&self, viewer: Option<&Identity>, uri: &Uri) -> Context {
        let here = uri.path_and_query().map_or("/", |p| p.as_str());
        let mut context = Context::new();
        context.insert("config", &ConfigData::new(&self.quill.config));
        context.insert(
            "viewer",
            &ViewerData {
                user: viewer.map(|v| v.as_str().to_string()),
                nickname: viewer.map(|v| v.nickname().to_string()),
                login_url: self.identity.login_url(here),
                logout_url: self.identity.logout_url(here),
            },
        );
        context
    }

    fn render(&self, template: &str, context: &Context) -> HandlerResult {
        Ok(Html(self.templates.render(template, context)?).into_response())
    }

    fn to_login(&self, uri: &Uri) -> Response {
        let here = uri.path_and_query().map_or("/", |p| p.as_str());
        Redirect::to(&self.identity.login_url(here)).into_response()
    }
}

type SharedState = Arc<AppState>;

/// Marks a response that should become a redirect to the site root
#[derive(Debug, Clone, Copy)]
struct RedirectHome;

/// Handler failure
pub enum AppError {
    Core(Error),
    Render(anyhow::Error),
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Render(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Rejected requests fall back to the front page
            AppError::Core(e) if e.is_client_error() => {
                tracing::warn!("Rejected request: {}", e);
                let mut response = StatusCode::SEE_OTHER.into_response();
                response.extensions_mut().insert(RedirectHome);
                response
            }
            AppError::Core(e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}

type HandlerResult = std::result::Result<Response, AppError>;

/// Point rejected requests at the configured site root
async fn redirect_home(State(state): State<SharedState>, response: Response) -> Response {
    if response.extensions().get::<RedirectHome>().is_some() {
        Redirect::to(&state.url("/")).into_response()
    } else {
        response
    }
}

/// Build the router over `state`, mounted under the configured `root`
pub fn router(state: SharedState) -> Router {
    let upload_limit = usize::try_from(state.quill.config.upload_limit)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let base = state.url("/");

    let app = Router::new()
        .route("/", get(index))
        .route("/blogs", post(create_blog))
        .route("/blog/:blog_id", get(view_blog))
        .route("/blog/:blog_id/new", get(new_post))
        .route("/blog/:blog_id/posts", post(create_post))
        .route("/blog/:blog_id/post/:post_id", get(view_post))
        .route(
            "/blog/:blog_id/post/:post_id/edit",
            get(edit_post).post(update_post),
        )
        .route("/images", get(images))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/img/:key/:filename", get(serve_image))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .layer(axum::middleware::map_response_with_state(
            state.clone(),
            redirect_home,
        ))
        .with_state(state);

    // axum refuses to nest at "/"
    let app = if base == "/" {
        app
    } else {
        tracing::debug!("Mounting routes under {}", base);
        Router::new().nest(&base, app)
    };
    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(quill: Quill, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(quill)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct IndexParams {
    mine: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlogParams {
    tag: Option<String>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NextParams {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlogForm {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PostForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tags: String,
}

impl PostForm {
    fn into_draft(self) -> PostDraft {
        PostDraft::from_form(&self.title, &self.body, &self.tags)
    }
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    user: String,
    #[serde(default)]
    next: String,
}

fn post_path(blog_id: BlogId, post_id: PostId) -> String {
    format!("blog/{}/post/{}", blog_id, post_id)
}

/// All blogs, or only the viewer's with `?mine=1`
async fn index(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<IndexParams>,
) -> HandlerResult {
    let config = &state.quill.config;
    let viewer = state.identity.current_identity(&jar);
    let mine = params.mine.is_some() && viewer.is_some();

    let blogs: Vec<BlogData> = state
        .quill
        .content
        .list_blogs(if mine { viewer.as_ref() } else { None })
        .iter()
        .map(|blog| BlogData::new(config, blog))
        .collect();

    let mut context = state.context(viewer.as_ref(), &uri);
    context.insert("blogs", &blogs);
    context.insert("mine", &mine);
    state.render("index.html", &context)
}

async fn create_blog(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<BlogForm>,
) -> HandlerResult {
    let viewer = state.identity.current_identity(&jar);
    let blog_id = state.quill.content.create_blog(&form.name, viewer.as_ref())?;
    Ok(Redirect::to(&state.url(&format!("blog/{}", blog_id))).into_response())
}

/// One page of a blog's posts as summaries, optionally filtered by tag
async fn view_blog(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Path(blog_id): Path<String>,
    Query(params): Query<BlogParams>,
) -> HandlerResult {
    let config = &state.quill.config;
    let viewer = state.identity.current_identity(&jar);
    let blog_id: BlogId = blog_id.parse()?;

    let blog = state.quill.content.get_blog(blog_id)?;
    let query = PostQuery::from_params(
        params.tag.as_deref(),
        params.cursor.as_deref(),
        config.per_page,
    )?;
    let page = state.quill.content.list_posts(blog_id, &query)?;
    let tags = state.quill.content.list_tags(blog_id)?;
    tracing::debug!(
        "Blog {} page: {} posts, more: {}",
        blog_id,
        page.items.len(),
        page.has_more
    );

    let blog_data = BlogData::new(config, &blog);
    let current_tag = params.tag.unwrap_or_default();
    let posts: Vec<PostData> = page
        .items
        .iter()
        .map(|post| PostData::new(config, post, viewer.as_ref(), true))
        .collect();
    let pagination = PaginationData::new(&blog_data.url, Some(current_tag.as_str()), &page);

    let mut context = state.context(viewer.as_ref(), &uri);
    context.insert("can_post", &(viewer.as_ref() == Some(&blog.author)));
    context.insert("blog", &blog_data);
    context.insert("tags", &tags);
    context.insert("current_tag", &current_tag);
    context.insert("posts", &posts);
    context.insert("pagination", &pagination);
    state.render("blog.html", &context)
}

async fn new_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Path(blog_id): Path<String>,
) -> HandlerResult {
    let Some(viewer) = state.identity.current_identity(&jar) else {
        return Ok(state.to_login(&uri));
    };
    let blog = state.quill.content.get_blog(blog_id.parse()?)?;
    if blog.author != viewer {
        return Err(Error::unauthorized(format!("blog {}", blog.id)).into());
    }

    let blog_data = BlogData::new(&state.quill.config, &blog);
    let mut context = state.context(Some(&viewer), &uri);
    context.insert("action", &format!("{}/posts", blog_data.url));
    context.insert("blog", &blog_data);
    context.insert("draft", &DraftData::from(&PostDraft::default()));
    context.insert("post_url", &None::<String>);
    state.render("edit.html", &context)
}

async fn create_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(blog_id): Path<String>,
    Form(form): Form<PostForm>,
) -> HandlerResult {
    let viewer = state.identity.current_identity(&jar);
    let blog_id: BlogId = blog_id.parse()?;
    let post_id = state
        .quill
        .content
        .create_post(blog_id, viewer.as_ref(), form.into_draft())?;
    Ok(Redirect::to(&state.url(&post_path(blog_id, post_id))).into_response())
}

/// A single post with its full body
async fn view_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Path((blog_id, post_id)): Path<(String, String)>,
) -> HandlerResult {
    let config = &state.quill.config;
    let viewer = state.identity.current_identity(&jar);
    let blog = state.quill.content.get_blog(blog_id.parse()?)?;
    let post = state.quill.content.get_post(blog.id, post_id.parse()?)?;

    let mut context = state.context(viewer.as_ref(), &uri);
    context.insert("blog", &BlogData::new(config, &blog));
    context.insert("post", &PostData::new(config, &post, viewer.as_ref(), false));
    state.render("post.html", &context)
}

async fn edit_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Path((blog_id, post_id)): Path<(String, String)>,
) -> HandlerResult {
    let Some(viewer) = state.identity.current_identity(&jar) else {
        return Ok(state.to_login(&uri));
    };
    let blog = state.quill.content.get_blog(blog_id.parse()?)?;
    let post = state.quill.content.get_post(blog.id, post_id.parse()?)?;
    let post_url = state.url(&post_path(blog.id, post.id()));
    if post.author != viewer {
        return Ok(Redirect::to(&post_url).into_response());
    }

    let draft = DraftData {
        title: post.title.clone(),
        body: post.body.clone(),
        tags: join_tags(&post.tags),
    };
    let mut context = state.context(Some(&viewer), &uri);
    context.insert("action", &format!("{}/edit", post_url));
    context.insert("blog", &BlogData::new(&state.quill.config, &blog));
    context.insert("draft", &draft);
    context.insert("post_url", &Some(post_url));
    state.render("edit.html", &context)
}

async fn update_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path((blog_id, post_id)): Path<(String, String)>,
    Form(form): Form<PostForm>,
) -> HandlerResult {
    let viewer = state.identity.current_identity(&jar);
    let blog_id: BlogId = blog_id.parse()?;
    let post_id: PostId = post_id.parse()?;
    state
        .quill
        .content
        .edit_post(blog_id, post_id, viewer.as_ref(), form.into_draft())?;
    Ok(Redirect::to(&state.url(&post_path(blog_id, post_id))).into_response())
}

/// The viewer's uploads and the upload form
async fn images(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
) -> HandlerResult {
    let Some(viewer) = state.identity.current_identity(&jar) else {
        return Ok(state.to_login(&uri));
    };
    let config = &state.quill.config;
    let images: Vec<ImageData> = state
        .quill
        .media
        .list_by_owner(&viewer)
        .iter()
        .map(|media| ImageData::new(config, media))
        .collect();

    let mut context = state.context(Some(&viewer), &uri);
    context.insert("images", &images);
    context.insert(
        "upload_url",
        &MediaStore::upload_endpoint(config, &state.url("images")),
    );
    state.render("images.html", &context)
}

async fn upload(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(params): Query<NextParams>,
    mut multipart: Multipart,
) -> HandlerResult {
    let Some(owner) = state.identity.current_identity(&jar) else {
        return Err(Error::unauthorized("upload needs a login").into());
    };

    let mut uploaded = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(e.to_string()))?;
        uploaded = Some(state.quill.media.upload(&owner, &filename, &data).await?);
        break;
    }

    let Some(media) = uploaded else {
        return Err(Error::validation("upload has no file field").into());
    };
    tracing::debug!("Uploaded {} as {}", media.filename, media.storage_key);

    let next = state.return_path(params.next.as_deref(), "images");
    Ok(Redirect::to(&next).into_response())
}

/// Serve a stored blob; the file name segment is cosmetic
async fn serve_image(
    State(state): State<SharedState>,
    Path((key, filename)): Path<(String, String)>,
) -> Response {
    let Ok(key) = StorageKey::parse(&key) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.quill.media.resolve(&key).await {
        Ok((record, data)) => {
            let content_type = match record {
                Some(record) => record.content_type,
                None => mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string(),
            };
            ([(header::CONTENT_TYPE, content_type)], data).into_response()
        }
        Err(Error::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Failed to read blob {}: {}", key, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<NextParams>,
) -> HandlerResult {
    let viewer = state.identity.current_identity(&jar);
    let mut context = state.context(viewer.as_ref(), &uri);
    context.insert("next", &state.return_path(params.next.as_deref(), "/"));
    state.render("login.html", &context)
}

async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = state.identity.return_path(&form.next);
    match Identity::new(form.user) {
        Some(identity) => {
            (state.identity.log_in(jar, &identity), Redirect::to(&next)).into_response()
        }
        None => Redirect::to(&state.identity.login_url(&next)).into_response(),
    }
}

async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(params): Query<NextParams>,
) -> Response {
    let next = state.return_path(params.next.as_deref(), "/");
    (state.identity.log_out(jar), Redirect::to(&next)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const ALICE: &str = "alice@example.com";

    fn app() -> (Router, Quill) {
        app_with(SiteConfig::default())
    }

    fn app_with(config: SiteConfig) -> (Router, Quill) {
        let quill = Quill::ephemeral(config);
        let state = Arc::new(AppState::new(quill.clone()).unwrap());
        (router(state), quill)
    }

    fn cookie(user: &str) -> String {
        format!("quill_user={}", user)
    }

    fn get(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, cookie(user));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn form(uri: &str, user: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, cookie(user));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn seed_blog(quill: &Quill) -> BlogId {
        let alice = Identity::new(ALICE).unwrap();
        quill.content.create_blog("Notes", Some(&alice)).unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_blogs() {
        let (app, quill) = app();
        let response = send(&app, get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("No blogs yet"));

        seed_blog(&quill);
        let html = text(send(&app, get("/", None)).await).await;
        assert!(html.contains("Notes"));
        assert!(html.contains("/blog/1"));

        let html = text(send(&app, get("/?mine=1", Some("bob"))).await).await;
        assert!(html.contains("My blogs"));
        assert!(!html.contains("/blog/1\""));
    }

    #[tokio::test]
    async fn test_write_and_read_post() {
        let (app, _quill) = app();

        let response = send(&app, form("/blogs", Some(ALICE), "name=Notes")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/blog/1");

        let body = "title=Hello&body=hi%0Ahttps%3A%2F%2Fx.com%2Fa.png&tags=rust%2C+web";
        let response = send(&app, form("/blog/1/posts", Some(ALICE), body)).await;
        assert_eq!(location(&response), "/blog/1/post/1");

        let html = text(send(&app, get("/blog/1/post/1", None)).await).await;
        assert!(html.contains(r#"hi<br><img src="https://x.com/a.png">"#));

        let html = text(send(&app, get("/blog/1?tag=rust", None)).await).await;
        assert!(html.contains("Hello"));
        let html = text(send(&app, get("/blog/1?tag=other", None)).await).await;
        assert!(html.contains("No posts tagged other"));
    }

    #[tokio::test]
    async fn test_anonymous_writes_are_rejected() {
        let (app, quill) = app();
        let response = send(&app, form("/blogs", None, "name=Notes")).await;
        assert_eq!(location(&response), "/");
        assert_eq!(quill.content.blog_count(), 0);

        seed_blog(&quill);
        let response = send(&app, form("/blog/1/posts", Some("bob"), "title=x")).await;
        assert_eq!(location(&response), "/");
        assert!(quill.content.get_post(BlogId(1), PostId(1)).is_err());

        let response = send(&app, get("/blog/1/new", None)).await;
        assert_eq!(location(&response), "/login?next=%2Fblog%2F1%2Fnew");
    }

    #[tokio::test]
    async fn test_edit_by_other_user_leaves_post_unchanged() {
        let (app, quill) = app();
        let blog = seed_blog(&quill);
        let alice = Identity::new(ALICE).unwrap();
        let post = quill
            .content
            .create_post(blog, Some(&alice), PostDraft::from_form("Title", "Body", ""))
            .unwrap();

        let response = send(
            &app,
            form("/blog/1/post/1/edit", Some("bob"), "title=Hacked&body=x"),
        )
        .await;
        assert_eq!(location(&response), "/");
        assert_eq!(quill.content.get_post(blog, post).unwrap().title, "Title");

        let response = send(
            &app,
            form("/blog/1/post/1/edit", Some(ALICE), "title=Fixed&body=x"),
        )
        .await;
        assert_eq!(location(&response), "/blog/1/post/1");
        assert_eq!(quill.content.get_post(blog, post).unwrap().title, "Fixed");
    }

    #[tokio::test]
    async fn test_blog_pagination_links() {
        let (app, quill) = app();
        let blog = seed_blog(&quill);
        let alice = Identity::new(ALICE).unwrap();
        for i in 0..11 {
            quill
                .content
                .create_post(
                    blog,
                    Some(&alice),
                    PostDraft::from_form(&format!("Post {}", i), "", ""),
                )
                .unwrap();
        }

        let html = text(send(&app, get("/blog/1", None)).await).await;
        assert!(html.contains("Older posts"));
        assert!(html.contains("/blog/1?cursor="));

        let response = send(&app, get("/blog/1?cursor=not-a-cursor", None)).await;
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (app, _quill) = app();
        let response = send(&app, form("/login", None, "user=alice&next=%2Fblog%2F1")).await;
        assert_eq!(location(&response), "/blog/1");
        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(set_cookie.to_str().unwrap().starts_with("quill_user=alice"));

        let response = send(
            &app,
            form("/login", None, "user=alice&next=https%3A%2F%2Fevil.example"),
        )
        .await;
        assert_eq!(location(&response), "/");

        let response = send(&app, get("/logout?next=%2Fimages", Some("alice"))).await;
        assert_eq!(location(&response), "/images");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_upload_and_serve_image() {
        let (app, quill) = app();
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload?next=%2Fimages")
            .header(header::COOKIE, cookie(ALICE))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(location(&response), "/images");

        let alice = Identity::new(ALICE).unwrap();
        let uploads = quill.media.list_by_owner(&alice);
        assert_eq!(uploads.len(), 1);

        let response = send(&app, get(&format!("/{}", uploads[0].path()), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert_eq!(text(response).await, "PNGDATA");

        let html = text(send(&app, get("/images", Some(ALICE))).await).await;
        assert!(html.contains("cat.png"));
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        let (app, _quill) = app();
        let response = send(&app, get("/img/abcdef/x.png", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, get("/img/..%2Fetc/x.png", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_live_under_configured_root() {
        let mut config = SiteConfig::default();
        config.root = "/site/".to_string();
        let (app, quill) = app_with(config);
        seed_blog(&quill);

        let response = send(&app, get("/site/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("/site/blog/1"));

        let response = send(&app, get("/site/blog/1", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains(r#"href="/site/blog/1""#));

        let response = send(&app, form("/site/blogs", Some(ALICE), "name=More")).await;
        assert_eq!(location(&response), "/site/blog/2");

        // Rejections land on the site root, not the host root
        let response = send(&app, get("/site/blog/abc", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/site/");
        let response = send(&app, form("/site/blogs", None, "name=Nope")).await;
        assert_eq!(location(&response), "/site/");

        let response = send(&app, get("/site/blog/1/new", None)).await;
        assert_eq!(
            location(&response),
            "/site/login?next=%2Fsite%2Fblog%2F1%2Fnew"
        );

        let response = send(&app, get("/site/logout", Some(ALICE))).await;
        assert_eq!(location(&response), "/site/");

        let response = send(&app, get("/blog/1", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
