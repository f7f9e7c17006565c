//! In-memory post repository.
//!
//! The `PostStore` is the single owner of feed state. It is responsible for:
//! - Assigning ids and timestamps to new posts and comments
//! - Keeping posts ordered newest-first for listing
//! - Serializing mutations so concurrent likes and comments are never lost
//!
//! All state lives behind one `RwLock`. Readers get owned clones, so nobody
//! can observe a post while a comment is half-appended, and no lock ever
//! escapes the store.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::post::{Comment, Post};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    /// Oldest first. Listing walks this in reverse.
    posts: Vec<Post>,
    /// Post id -> position in `posts`. Positions are stable since posts are
    /// only ever pushed.
    index: HashMap<Uuid, usize>,
}

impl Inner {
    fn post_mut(&mut self, id: Uuid) -> Result<&mut Post> {
        let pos = *self.index.get(&id).ok_or(Error::NotFound(id))?;
        Ok(&mut self.posts[pos])
    }

    /// A fresh id that is not already in use.
    fn next_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Creation time for the next post, strictly after the newest existing one
    /// so listing order and timestamp order always agree.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.posts.last() {
            Some(newest) if now <= newest.created_at => {
                newest.created_at + TimeDelta::microseconds(1)
            }
            _ => now,
        }
    }
}

/// Shared, thread-safe feed repository.
///
/// Wrap in an `Arc` to share between request handlers.
#[derive(Debug, Default)]
pub struct PostStore {
    inner: RwLock<Inner>,
}

impl PostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All posts, newest first.
    pub fn list_all(&self) -> Vec<Post> {
        let inner = self.inner.read();
        inner.posts.iter().rev().cloned().collect()
    }

    /// Snapshot of a single post.
    pub fn get(&self, id: Uuid) -> Option<Post> {
        let inner = self.inner.read();
        inner.index.get(&id).map(|&pos| inner.posts[pos].clone())
    }

    /// Whether a post with this id exists.
    pub fn contains(&self, id: Uuid) -> bool {
        self.inner.read().index.contains_key(&id)
    }

    /// Number of posts in the store.
    pub fn len(&self) -> usize {
        self.inner.read().posts.len()
    }

    /// Whether the store holds no posts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the fields [`create`](Self::create) requires, without creating anything.
    ///
    /// Lets callers refuse a post before doing expensive work such as
    /// persisting an attached image.
    pub fn check_new_post(username: &str, content: &str) -> Result<()> {
        require("username", username)?;
        require("content", content)
    }

    /// Create a post and place it at the head of the feed.
    ///
    /// `image_url` must already point at a fully persisted upload.
    pub fn create(&self, username: &str, content: &str, image_url: Option<String>) -> Result<Post> {
        Self::check_new_post(username, content)?;

        let mut inner = self.inner.write();

        let post = Post {
            id: inner.next_id(),
            username: username.to_string(),
            content: content.to_string(),
            image_url,
            likes: 0,
            comments: Vec::new(),
            created_at: inner.next_created_at(),
        };

        let pos = inner.posts.len();
        inner.index.insert(post.id, pos);
        inner.posts.push(post.clone());

        tracing::debug!(post_id = %post.id, has_image = post.image_url.is_some(), "post created");
        Ok(post)
    }

    /// Append a comment to an existing post.
    pub fn add_comment(&self, post_id: Uuid, username: &str, text: &str) -> Result<Comment> {
        let mut inner = self.inner.write();
        let post = inner.post_mut(post_id)?;

        require("username", username)?;
        require("text", text)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            username: username.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        post.comments.push(comment.clone());

        tracing::debug!(post_id = %post_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// Add one like to a post and return the new total.
    pub fn increment_like(&self, post_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write();
        let post = inner.post_mut(post_id)?;
        post.likes += 1;
        Ok(post.likes)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation { field });
    }
    Ok(())
}
