//! Feed API handlers.
//!
//! - `GET /api/posts` - all posts, newest first
//! - `POST /api/posts` - create a post (multipart with optional `image`, urlencoded, or JSON)
//! - `POST /api/posts/{id}/comments` - append a comment
//! - `POST /api/posts/{id}/like` - increment the like counter

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::{Form, Json};
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sharefeed_core::{Comment, Post, PostStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{COMMENTS_CREATED, LIKES, POSTS_CREATED, UPLOADS_REJECTED};
use crate::state::AppState;
use crate::upload::PendingImage;

/// Text fields of a new post. Missing fields deserialize as `None` and are
/// reported as validation errors rather than parse errors.
#[derive(Debug, Default, Deserialize)]
pub struct NewPostFields {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Body of `POST /api/posts/{id}/comments`.
#[derive(Debug, Default, Deserialize)]
pub struct NewCommentBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Response of `POST /api/posts/{id}/like`.
#[derive(Debug, Clone, Serialize)]
pub struct LikeResponse {
    likes: u64,
}

/// A parsed create-post request.
#[derive(Debug, Default)]
struct PostForm {
    fields: NewPostFields,
    image: Option<PendingImage>,
}

/// `GET /api/posts`
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    Json(state.store.list_all())
}

/// `POST /api/posts`
///
/// The image, if any, is validated and fully written to disk before the post
/// is created. A refused image fails the whole request.
pub async fn create_post(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let form = if content_type(&request).starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state).await?;
        read_multipart(&state, multipart).await?
    } else {
        PostForm {
            fields: read_fields(&state, request).await?,
            image: None,
        }
    };

    let username = form.fields.username.unwrap_or_default();
    let content = form.fields.content.unwrap_or_default();
    PostStore::check_new_post(&username, &content)?;

    let image_url = match form.image {
        Some(image) => Some(state.uploads.store(image).await?),
        None => None,
    };

    let post = state.store.create(&username, &content, image_url)?;
    counter!(POSTS_CREATED).increment(1);

    tracing::info!(
        post_id = %post.id,
        username = %post.username,
        image = post.image_url.as_deref().unwrap_or(""),
        "post created"
    );

    Ok((StatusCode::CREATED, Json(post)))
}

/// Lowercased `Content-Type` of a request, empty if absent.
fn content_type(request: &Request) -> String {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Parse a urlencoded form body, or JSON for any other content type.
async fn read_fields<T>(state: &AppState, request: Request) -> Result<T, ApiError>
where
    T: DeserializeOwned + Send + 'static,
{
    if content_type(&request).starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<T>::from_request(request, state).await?;
        Ok(fields)
    } else {
        let Json(fields) = Json::<T>::from_request(request, state).await?;
        Ok(fields)
    }
}

/// Collect `username`, `content` and the optional `image` part.
///
/// Unknown parts are ignored. An `image` part with no filename and no bytes
/// is what browsers send for an empty file input, and counts as no image.
async fn read_multipart(state: &AppState, mut multipart: Multipart) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => form.fields.username = Some(field.text().await?),
            Some("content") => form.fields.content = Some(field.text().await?),
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let declared = field.content_type().map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if let Err(e) = state.uploads.check_size(bytes.len() + chunk.len()) {
                        counter!(UPLOADS_REJECTED, "reason" => "size").increment(1);
                        return Err(e.into());
                    }
                    bytes.extend_from_slice(&chunk);
                }

                if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
                    continue;
                }

                let content_type = match state.uploads.check_type(declared.as_deref()) {
                    Ok(ct) => ct,
                    Err(e) => {
                        counter!(UPLOADS_REJECTED, "reason" => "type").increment(1);
                        tracing::info!(declared = ?declared, "upload rejected: not an image");
                        return Err(e.into());
                    }
                };

                form.image = Some(PendingImage {
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /api/posts/{id}/comments`
///
/// Accepts a JSON or urlencoded body. An unknown post is reported before
/// anything is wrong with the body.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let post_id = parse_post_id(&id)?;
    if !state.store.contains(post_id) {
        return Err(sharefeed_core::Error::NotFound(post_id).into());
    }

    let body: NewCommentBody = read_fields(&state, request).await?;
    let username = body.username.unwrap_or_default();
    let text = body.text.unwrap_or_default();

    let comment = state.store.add_comment(post_id, &username, &text)?;
    counter!(COMMENTS_CREATED).increment(1);

    tracing::info!(post_id = %post_id, comment_id = %comment.id, "comment added");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// `POST /api/posts/{id}/like`
pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let post_id = parse_post_id(&id)?;
    let likes = state.store.increment_like(post_id)?;
    counter!(LIKES).increment(1);

    tracing::debug!(post_id = %post_id, likes, "post liked");
    Ok(Json(LikeResponse { likes }))
}

/// Ids that are not valid UUIDs cannot name a post.
fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound("Post not found".to_string()))
}
