//! Application configuration loaded from environment variables.

use std::path::PathBuf;

/// Default upload limit: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:5000").
    pub bind_addr: String,

    /// Public base URL of this service, used to build absolute share-page and
    /// image URLs for OG tags. e.g. "https://feed.example.com"
    pub base_url: String,

    /// Directory uploaded images are written to.
    pub upload_dir: PathBuf,

    /// Maximum accepted image size in bytes.
    pub max_file_size: usize,

    /// Client app entry point human visitors are redirected to.
    pub spa_entry_url: String,

    /// Site name shown in OG tags.
    pub site_name: String,

    /// Extra crawler signatures appended to the built-in list.
    pub extra_crawler_signatures: Vec<String>,

    /// Port for the Prometheus `/metrics` listener, if enabled.
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `HOST`: Interface to bind (default: "0.0.0.0")
    /// - `PORT`: Listen port (default: 5000)
    /// - `PUBLIC_BASE_URL`: Base URL for links/OG tags (default: "http://localhost:5000")
    /// - `UPLOAD_DIR`: Image upload directory (default: "public/uploads")
    /// - `MAX_FILE_SIZE`: Upload limit in bytes (default: 5242880)
    /// - `SPA_ENTRY_URL`: Redirect target for browsers (default: "/")
    /// - `SITE_NAME`: Site name (default: "Social Media App")
    /// - `CRAWLER_EXTRA_SIGNATURES`: Comma-separated extra crawler tokens
    /// - `METRICS_PORT`: Enables the Prometheus listener on this port
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number, got {raw:?}"))?,
            Err(_) => 5000,
        };
        let bind_addr = format!("{host}:{port}");

        let base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            anyhow::bail!("PUBLIC_BASE_URL must start with http:// or https://, got {base_url:?}");
        }

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/uploads"));

        let max_file_size = match std::env::var("MAX_FILE_SIZE") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    anyhow::bail!("MAX_FILE_SIZE must be a positive byte count, got {raw:?}")
                }
                Ok(n) => n,
            },
            Err(_) => DEFAULT_MAX_FILE_SIZE,
        };

        let spa_entry_url = std::env::var("SPA_ENTRY_URL").unwrap_or_else(|_| "/".to_string());

        let site_name =
            std::env::var("SITE_NAME").unwrap_or_else(|_| "Social Media App".to_string());

        let extra_crawler_signatures: Vec<String> = std::env::var("CRAWLER_EXTRA_SIGNATURES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let metrics_port = match std::env::var("METRICS_PORT") {
            Ok(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                anyhow::anyhow!("METRICS_PORT must be a valid port number, got {raw:?}")
            })?),
            Err(_) => None,
        };

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            upload_dir = %upload_dir.display(),
            max_file_size,
            spa_entry_url = %spa_entry_url,
            extra_signatures = extra_crawler_signatures.len(),
            metrics_port = ?metrics_port,
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            upload_dir,
            max_file_size,
            spa_entry_url,
            site_name,
            extra_crawler_signatures,
            metrics_port,
        })
    }
}
