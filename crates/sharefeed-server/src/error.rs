//! Error types and response formatting.
//!
//! `/api/*` routes answer with a JSON error body. The share route answers
//! with plain text, since whoever fetches `/post/{id}` is a crawler or a
//! browser rather than the client app.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::upload::UploadError;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or blank required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The attached image was refused by the upload gateway.
    #[error("upload rejected: {0}")]
    UploadRejected(#[from] UploadError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sharefeed_core::Error> for ApiError {
    fn from(err: sharefeed_core::Error) -> Self {
        match err {
            sharefeed_core::Error::Validation { .. } => Self::Validation(err.to_string()),
            sharefeed_core::Error::NotFound(_) => Self::NotFound("Post not found".to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::UploadRejected(UploadError::TooLarge { limit: None })
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        Self::BadRequest(err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::BadRequest(err.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(err: FormRejection) -> Self {
        Self::BadRequest(err.body_text())
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone())),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::UploadRejected(err) => {
                let status = match err {
                    UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    UploadError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
                    UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if let UploadError::Io(io) = err {
                    tracing::error!(error = %io, "failed to persist upload");
                    (status, "internal_error", Some("An internal error occurred".to_string()))
                } else {
                    (status, "upload_rejected", Some(err.to_string()))
                }
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Share-page error type.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// No post with the requested id.
    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Post not found"),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
