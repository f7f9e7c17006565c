//! Post and comment records.
//!
//! Field names on the wire are camelCase (`imageUrl`, `createdAt`) because
//! that is what the browser client consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A top-level feed entry.
///
/// `id`, `username`, `content`, `image_url` and `created_at` never change after
/// creation. Only `likes` and `comments` are mutated, and only by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Author handle.
    pub username: String,
    /// Body text.
    pub content: String,
    /// Relative path of the attached image (e.g. `/uploads/1700000000000-42.png`).
    pub image_url: Option<String>,
    /// Number of likes. Never decreases.
    pub likes: u64,
    /// Replies in insertion order.
    pub comments: Vec<Comment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An append-only reply attached to a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Author handle.
    pub username: String,
    /// Comment text.
    pub text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
