//! Request audit middleware.
//!
//! Logs every request with its user agent and whether it looks like a
//! link-preview crawler. Handy when checking why a platform's preview card
//! came out wrong.

use axum::extract::{Request, State};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// Classify and log the request, then pass it on unchanged.
pub async fn log_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let classification = state.classifier.classify(user_agent);

    tracing::info!(
        method = %request.method(),
        url = %request.uri(),
        user_agent = user_agent.unwrap_or(""),
        is_bot = classification.is_bot(),
        signature = classification.matched.unwrap_or(""),
        "request"
    );

    next.run(request).await
}
