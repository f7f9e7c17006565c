//! Share-link route.
//!
//! Handles `GET /post/{id}`. Link-preview crawlers get a metadata-bearing
//! HTML page. Everyone else is redirected to the client app with the post id
//! in the query string.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use metrics::counter;
use sharefeed_core::{Audience, Post};
use uuid::Uuid;

use crate::error::ShareError;
use crate::metrics::SHARE_REQUESTS;
use crate::render::{self, ShareSite};
use crate::state::AppState;

/// Handle a share-link request.
///
/// Unknown and malformed ids are a 404 for every audience, so a crawler
/// never caches a preview for a post that does not exist and a browser is
/// never sent into the app with a dead id.
pub async fn share_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ShareError> {
    let post = id
        .trim()
        .parse::<Uuid>()
        .ok()
        .and_then(|post_id| state.store.get(post_id))
        .ok_or_else(|| ShareError::NotFound(id.clone()))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let classification = state.classifier.classify(user_agent);

    counter!(SHARE_REQUESTS, "audience" => classification.audience.as_str()).increment(1);

    let target = app_url(&state.config.spa_entry_url, post.id);

    let mut response = match classification.audience {
        Audience::Bot => {
            tracing::debug!(
                post_id = %post.id,
                signature = classification.matched.unwrap_or(""),
                "serving share page"
            );
            let html = rendered_page(&state, &post, &target).await;
            html_response(&html)
        }
        Audience::Human => {
            tracing::debug!(post_id = %post.id, target = %target, "redirecting to app");
            Redirect::temporary(&target).into_response()
        }
    };

    // The same URL answers differently per user agent.
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("user-agent"));

    Ok(response)
}

/// Where a human visitor lands for a given post.
pub fn app_url(entry: &str, post_id: Uuid) -> String {
    let separator = if entry.contains('?') { '&' } else { '?' };
    format!("{entry}{separator}postId={post_id}")
}

/// Render the share page, or reuse a previously rendered copy.
async fn rendered_page(state: &AppState, post: &Post, app_url: &str) -> Arc<str> {
    state
        .share_cache
        .get_with(post.id, async {
            tracing::debug!(post_id = %post.id, "share cache miss, rendering");
            let site = ShareSite {
                base_url: &state.config.base_url,
                site_name: &state.config.site_name,
                app_url,
            };
            Arc::from(render::share_page(post, site).into_string())
        })
        .await
}

/// HTML response with security headers.
fn html_response(html: &str) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(render::components::CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    (StatusCode::OK, headers, html.to_string()).into_response()
}
