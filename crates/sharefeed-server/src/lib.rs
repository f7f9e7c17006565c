//! Sharefeed server - feed API and crawler-aware share links.
//!
//! Serves the JSON API the browser client uses to post, comment and like,
//! stores attached images on disk, and answers share links so that link
//! previews on chat and social platforms show the post.
//!
//! # Share links
//!
//! ```text
//! GET /post/{id}
//! ```
//!
//! - Crawler user agents get a static HTML page with Open Graph and Twitter
//!   Card tags
//! - Everyone else is redirected to the client app at `?postId={id}`
//!
//! # Security
//!
//! - All user content is HTML-escaped by maud
//! - Share pages carry a strict Content-Security-Policy with no scripts
//! - Uploads accept `image/*` only, up to a configured size

pub mod audit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod render;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
