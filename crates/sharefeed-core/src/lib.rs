//! Core types for the sharefeed service.
//!
//! This crate provides:
//! - The post/comment data model and its JSON wire shape
//! - [`PostStore`], the in-memory repository that owns all feed state
//! - [`UserAgentClassifier`], which separates link-preview crawlers from browsers
//! - Shared error types
//!
//! Nothing here knows about HTTP. The `sharefeed-server` crate wires these
//! pieces into routes.

mod agent;
mod error;
mod post;
mod store;

pub use agent::{Audience, Classification, DEFAULT_CRAWLER_SIGNATURES, UserAgentClassifier};
pub use error::{Error, Result};
pub use post::{Comment, Post};
pub use store::PostStore;
