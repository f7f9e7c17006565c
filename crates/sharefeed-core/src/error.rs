//! Error types for feed operations.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`PostStore`](crate::PostStore) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required text field was missing or blank.
    #[error("missing required field '{field}'")]
    Validation {
        /// Wire name of the offending field.
        field: &'static str,
    },

    /// No post exists with the given id.
    #[error("post not found: {0}")]
    NotFound(Uuid),
}
