//! Route definitions for the sharefeed service.
//!
//! ## Routes
//!
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//! - `GET /post/{id}` - Share link (preview page for crawlers, redirect for people)
//! - `GET /api/posts` - Feed, newest first
//! - `POST /api/posts` - Create a post
//! - `POST /api/posts/{id}/comments` - Comment on a post
//! - `POST /api/posts/{id}/like` - Like a post
//! - `GET /uploads/{file}` - Stored images

mod health;
pub mod posts;
pub mod share;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

use crate::audit;
use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::UPLOADS_ROUTE;

/// Room for multipart boundaries and the text fields on top of the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete service router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.uploads.max_bytes().saturating_add(FORM_OVERHEAD_BYTES);

    let api = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/{id}/comments", post(posts::add_comment))
        .route("/posts/{id}/like", post(posts::like_post))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        .route("/post/{id}", get(share::share_handler))
        .nest("/api", api)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&state.config.upload_dir))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit::log_request,
        ))
        .with_state(state)
}

/// Serve robots.txt allowing all crawlers.
///
/// Share pages must stay fetchable for link previews.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\n",
    )
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    const BOT_UA: &str = "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";
    const HUMAN_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
    const BOUNDARY: &str = "----sharefeed-test-boundary";
    const MAX_FILE_SIZE: usize = 1024;

    fn test_config(dir: &Path) -> Config {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            base_url: "https://feed.example.com".to_string(),
            upload_dir: dir.to_path_buf(),
            max_file_size: MAX_FILE_SIZE,
            spa_entry_url: "/".to_string(),
            site_name: "Social Media App".to_string(),
            extra_crawler_signatures: vec![],
            metrics_port: None,
        }
    }

    fn test_app() -> (TempDir, AppState, Router) {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(test_config(dir.path())).unwrap();
        let app = router(state.clone());
        (dir, state, app)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn share_req(id: &str, user_agent: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(format!("/post/{id}"));
        if let Some(ua) = user_agent {
            builder = builder.header(header::USER_AGENT, ua);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// (name, filename + content type for file parts, value)
    type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

    fn multipart_req(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file, value) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((filename, content_type)) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                }
                None => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/posts")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn stored_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let (_dir, _state, app) = test_app();
        let (status, body) = send_json(&app, get_req("/api/posts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_json_post_then_list() {
        let (_dir, _state, app) = test_app();

        let (status, created) = send_json(
            &app,
            post_json(
                "/api/posts",
                json!({"username": "johndoe", "content": "My first post!"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["username"], "johndoe");
        assert_eq!(created["content"], "My first post!");
        assert_eq!(created["likes"], 0);
        assert_eq!(created["comments"], json!([]));
        assert!(created["imageUrl"].is_null());

        send_json(
            &app,
            post_json("/api/posts", json!({"username": "jane", "content": "second"})),
        )
        .await;

        let (_, listed) = send_json(&app, get_req("/api/posts")).await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["username"], "jane");
        assert_eq!(listed[1]["id"], created["id"]);
    }

    #[tokio::test]
    async fn create_form_urlencoded_post() {
        let (_dir, _state, app) = test_app();
        let request = Request::post("/api/posts")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=alice&content=hello+world"))
            .unwrap();

        let (status, created) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["content"], "hello world");
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let (_dir, state, app) = test_app();

        let (status, body) =
            send_json(&app, post_json("/api/posts", json!({"username": "johndoe"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send_json(
            &app,
            post_json("/api/posts", json!({"username": "  ", "content": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let (_dir, _state, app) = test_app();
        let request = Request::post("/api/posts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn multipart_post_with_image_is_stored_and_served() {
        let (dir, _state, app) = test_app();
        let png = b"\x89PNG\r\n\x1a\nfake-image-bytes";

        let (status, created) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"johndoe"),
                ("content", None, b"look at this"),
                ("image", Some(("photo.PNG", "image/png")), png),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let image_url = created["imageUrl"].as_str().unwrap().to_string();
        assert!(image_url.starts_with("/uploads/"));
        assert!(image_url.ends_with(".png"));
        assert_eq!(stored_files(&dir), 1);

        let (status, _, served) = send(&app, get_req(&image_url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served, png);

        // Later mutations leave the image path alone.
        let id = created["id"].as_str().unwrap();
        send(&app, post_json(&format!("/api/posts/{id}/like"), json!({}))).await;
        let (_, listed) = send_json(&app, get_req("/api/posts")).await;
        assert_eq!(listed[0]["imageUrl"], image_url.as_str());
    }

    #[tokio::test]
    async fn multipart_without_image_has_no_image_url() {
        let (dir, _state, app) = test_app();

        let (status, created) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"johndoe"),
                ("content", None, b"text only"),
                ("image", Some(("", "application/octet-stream")), b""),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["imageUrl"].is_null());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn multipart_rejects_non_image() {
        let (dir, state, app) = test_app();

        let (status, body) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"johndoe"),
                ("content", None, b"sneaky"),
                ("image", Some(("notes.txt", "text/plain")), b"hello"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "upload_rejected");
        assert!(state.store.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn multipart_rejects_oversized_image() {
        let (dir, state, app) = test_app();
        let big = vec![0u8; MAX_FILE_SIZE + 1];

        let (status, body) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"johndoe"),
                ("content", None, b"too big"),
                ("image", Some(("big.jpg", "image/jpeg")), &big),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "upload_rejected");
        assert!(state.store.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn client_filename_never_picks_served_type() {
        let (dir, _state, app) = test_app();

        let (status, created) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"mallory"),
                ("content", None, b"totally a picture"),
                (
                    "image",
                    Some(("x.html", "image/png")),
                    b"<script>alert(document.cookie)</script>",
                ),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let image_url = created["imageUrl"].as_str().unwrap().to_string();
        assert!(image_url.ends_with(".png"), "stored as {image_url}");
        assert_eq!(stored_files(&dir), 1);

        let (status, headers, _) = send(&app, get_req(&image_url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn multipart_rejects_svg() {
        let (dir, state, app) = test_app();

        let (status, body) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"mallory"),
                ("content", None, b"vector art"),
                (
                    "image",
                    Some(("art.svg", "image/svg+xml")),
                    b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>",
                ),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "upload_rejected");
        assert!(state.store.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn invalid_post_with_image_writes_no_file() {
        let (dir, state, app) = test_app();

        let (status, _) = send_json(
            &app,
            multipart_req(&[
                ("username", None, b"johndoe"),
                ("content", None, b"   "),
                ("image", Some(("a.gif", "image/gif")), b"GIF89a"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.store.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn comment_on_post() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "hi", None).unwrap();

        let (status, comment) = send_json(
            &app,
            post_json(
                &format!("/api/posts/{}/comments", post.id),
                json!({"username": "bob", "text": "nice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["username"], "bob");
        assert_eq!(comment["text"], "nice");

        let comments = state.store.get(post.id).unwrap().comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "nice");
    }

    #[tokio::test]
    async fn comment_form_urlencoded() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "hi", None).unwrap();

        let request = Request::post(format!("/api/posts/{}/comments", post.id))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=bob&text=nice+one"))
            .unwrap();

        let (status, comment) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["username"], "bob");
        assert_eq!(comment["text"], "nice one");
        assert_eq!(state.store.get(post.id).unwrap().comments.len(), 1);
    }

    #[tokio::test]
    async fn comment_on_unknown_post_is_404_whatever_the_body() {
        let (_dir, _state, app) = test_app();
        let uri = format!("/api/posts/{}/comments", uuid::Uuid::new_v4());

        let empty = Request::post(&uri).body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, empty).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");

        let malformed = Request::post(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send_json(&app, malformed).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comment_errors() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "hi", None).unwrap();

        let (status, body) = send_json(
            &app,
            post_json(
                &format!("/api/posts/{}/comments", uuid::Uuid::new_v4()),
                json!({"username": "bob", "text": "hello"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");

        let (status, _) = send_json(
            &app,
            post_json(
                "/api/posts/not-a-uuid/comments",
                json!({"username": "bob", "text": "hello"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(
            &app,
            post_json(
                &format!("/api/posts/{}/comments", post.id),
                json!({"username": "bob", "text": ""}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(state.store.get(post.id).unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn like_returns_running_total() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "hi", None).unwrap();
        let uri = format!("/api/posts/{}/like", post.id);

        let (status, body) = send_json(&app, post_json(&uri, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"likes": 1}));

        let (_, body) = send_json(&app, post_json(&uri, json!({}))).await;
        assert_eq!(body, json!({"likes": 2}));

        let (status, _) = send_json(
            &app,
            post_json(&format!("/api/posts/{}/like", uuid::Uuid::new_v4()), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_likes_over_http() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "popular", None).unwrap();
        let uri = format!("/api/posts/{}/like", post.id);

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let app = app.clone();
            let uri = uri.clone();
            tasks.push(tokio::spawn(async move {
                app.oneshot(post_json(&uri, json!({}))).await.unwrap().status()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        assert_eq!(state.store.get(post.id).unwrap().likes, 50);
    }

    #[tokio::test]
    async fn share_serves_preview_to_crawlers() {
        let (_dir, state, app) = test_app();
        let post = state
            .store
            .create("alice", "<b>hello</b> world", Some("/uploads/1-2.png".to_string()))
            .unwrap();

        let (status, headers, body) = send(&app, share_req(&post.id.to_string(), Some(BOT_UA))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(headers[header::VARY], "user-agent");

        let html = String::from_utf8(body).unwrap();
        assert!(html.contains(r#"<meta property="og:title" content="Post by alice">"#));
        assert!(html.contains(r#"content="https://feed.example.com/uploads/1-2.png""#));
        assert!(html.contains(r#"content="summary_large_image""#));
        assert!(!html.contains("<b>hello</b>"));
        assert!(!html.contains("<script"));

        // Served from cache the second time, byte for byte.
        let (_, _, again) = send(&app, share_req(&post.id.to_string(), Some(BOT_UA))).await;
        assert_eq!(String::from_utf8(again).unwrap(), html);
    }

    #[tokio::test]
    async fn share_redirects_people_to_app() {
        let (_dir, state, app) = test_app();
        let post = state.store.create("alice", "hi", None).unwrap();
        let expected = format!("/?postId={}", post.id);

        for ua in [Some(HUMAN_UA), Some(""), None] {
            let (status, headers, _) = send(&app, share_req(&post.id.to_string(), ua)).await;
            assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(headers[header::LOCATION], expected.as_str());
            assert_eq!(headers[header::VARY], "user-agent");
        }
    }

    #[tokio::test]
    async fn share_unknown_post_is_404_for_everyone() {
        let (_dir, _state, app) = test_app();
        let missing = uuid::Uuid::new_v4().to_string();

        for id in [missing.as_str(), "not-a-uuid"] {
            for ua in [Some(BOT_UA), Some(HUMAN_UA), None] {
                let (status, headers, _) = send(&app, share_req(id, ua)).await;
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
            }
        }
    }

    #[tokio::test]
    async fn health_and_robots() {
        let (_dir, _state, app) = test_app();

        let (status, body) = send_json(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _, body) = send(&app, get_req("/robots.txt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"User-agent: *\nAllow: /\n");
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let (_dir, _state, app) = test_app();

        for uri in ["/nope", "/api/unknown"] {
            let (status, body) = send_json(&app, get_req(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "not_found");
        }
    }
}
