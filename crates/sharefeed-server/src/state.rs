//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use moka::future::Cache;
use sharefeed_core::{PostStore, UserAgentClassifier};
use uuid::Uuid;

use crate::config::Config;
use crate::upload::UploadGateway;

/// Rendered share pages keyed by post id.
///
/// Every field a share page shows is immutable, so entries never go stale
/// before they expire.
pub type ShareCache = Cache<Uuid, Arc<str>>;

/// Share page cache capacity (number of entries).
/// Pages are 2-4KB each.
const SHARE_CACHE_CAPACITY: u64 = 10_000;

/// Share page cache TTL.
const SHARE_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The feed.
    pub store: Arc<PostStore>,

    /// Crawler detection, compiled once at startup.
    pub classifier: Arc<UserAgentClassifier>,

    /// Image storage.
    pub uploads: Arc<UploadGateway>,

    /// Application configuration.
    pub config: Arc<Config>,

    /// In-memory cache of rendered share pages.
    pub share_cache: ShareCache,
}

impl AppState {
    /// Create a new application state with an empty store.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_store(config, Arc::new(PostStore::new()))
    }

    /// Create application state around an existing store.
    ///
    /// Fails if the extra crawler signatures cannot be compiled.
    pub fn with_store(config: Config, store: Arc<PostStore>) -> anyhow::Result<Self> {
        let classifier =
            UserAgentClassifier::with_extra_signatures(&config.extra_crawler_signatures)
                .context("CRAWLER_EXTRA_SIGNATURES could not be compiled")?;
        let uploads = UploadGateway::new(config.upload_dir.clone(), config.max_file_size);

        let share_cache = Cache::builder()
            .max_capacity(SHARE_CACHE_CAPACITY)
            .time_to_live(SHARE_CACHE_TTL)
            .build();

        tracing::info!(
            crawler_signatures = classifier.signatures().len(),
            share_cache_capacity = SHARE_CACHE_CAPACITY,
            share_cache_ttl_secs = SHARE_CACHE_TTL.as_secs(),
            "application state initialized"
        );

        Ok(Self {
            store,
            classifier: Arc::new(classifier),
            uploads: Arc::new(uploads),
            config: Arc::new(config),
            share_cache,
        })
    }
}
