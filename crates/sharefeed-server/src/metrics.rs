//! Prometheus metrics for the sharefeed service.
//!
//! Metrics are recorded through the `metrics` facade. Without an installed
//! recorder (tests, or `METRICS_PORT` unset) every call is a no-op.
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `sharefeed_`
//! - Suffix: `_total` for counters
//! - Labels: only small closed sets (`audience`, `reason`)

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const POSTS_CREATED: &str = "sharefeed_posts_created_total";
pub const COMMENTS_CREATED: &str = "sharefeed_comments_created_total";
pub const LIKES: &str = "sharefeed_likes_total";
pub const UPLOADS_REJECTED: &str = "sharefeed_uploads_rejected_total";
pub const SHARE_REQUESTS: &str = "sharefeed_share_requests_total";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `/metrics` on `port` in a background task.
///
/// Binds before returning so a taken port is reported to the caller.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "metrics server listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

fn register_metrics() {
    describe_counter!(POSTS_CREATED, "Posts created through the API");
    describe_counter!(COMMENTS_CREATED, "Comments appended through the API");
    describe_counter!(LIKES, "Like increments applied");
    describe_counter!(
        UPLOADS_REJECTED,
        "Image uploads refused by the gateway (label: reason)"
    );
    describe_counter!(
        SHARE_REQUESTS,
        "Share-link requests for known posts (label: audience)"
    );
}
