//! Image upload gateway.
//!
//! Validates attached images and writes them to the upload directory under a
//! collision-resistant name. Only raster types in [`IMAGE_TYPES`] are
//! accepted, and the stored extension always comes from the validated type,
//! never from the client filename, so a stored file is always served back
//! as an image. The returned relative path is what gets stored
//! on the post, so a post only ever references a file that is already fully
//! on disk.
//!
//! Filenames look like `{unix_millis}-{random}.{ext}`, e.g.
//! `1717171717171-482913377.png`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// URL prefix uploads are served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Accepted mime types and the extension files of that type are stored under.
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
];

/// Attempts at finding an unused filename before giving up.
const MAX_NAME_ATTEMPTS: usize = 4;

/// Reasons an upload is refused.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The part was not declared as one of [`IMAGE_TYPES`].
    #[error("only PNG, JPEG, GIF, WebP or AVIF images are allowed, got {0:?}")]
    UnsupportedType(String),

    /// The image is bigger than the configured limit.
    #[error("image exceeds the maximum upload size{}", .limit.map(|l| format!(" of {l} bytes")).unwrap_or_default())]
    TooLarge {
        /// Configured limit, when known.
        limit: Option<usize>,
    },

    /// Writing the file failed.
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// An image that passed validation and is waiting to be written.
#[derive(Debug, Clone)]
pub struct PendingImage {
    /// Validated mime type, one of [`IMAGE_TYPES`].
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Stores uploaded images on the local filesystem.
#[derive(Debug, Clone)]
pub struct UploadGateway {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadGateway {
    /// Create a gateway writing into `dir`, refusing files over `max_bytes`.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Size limit in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Accept only [`IMAGE_TYPES`]. Returns the normalized type without
    /// parameters.
    pub fn check_type(&self, content_type: Option<&str>) -> Result<String, UploadError> {
        let declared = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        let essence = match declared.split(';').next().unwrap_or_default().trim() {
            "image/jpg" | "image/pjpeg" => "image/jpeg",
            other => other,
        };

        if extension_for(essence).is_some() {
            Ok(essence.to_string())
        } else {
            Err(UploadError::UnsupportedType(declared))
        }
    }

    /// Refuse sizes over the limit.
    pub fn check_size(&self, len: usize) -> Result<(), UploadError> {
        if len > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: Some(self.max_bytes),
            });
        }
        Ok(())
    }

    /// Write the image and return its relative path (`/uploads/{name}`).
    pub async fn store(&self, image: PendingImage) -> Result<String, UploadError> {
        self.check_size(image.bytes.len())?;
        let ext = extension_for(&image.content_type)
            .ok_or_else(|| UploadError::UnsupportedType(image.content_type.clone()))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = unique_filename(&ext);
            let path = self.dir.join(&name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, &image.bytes).await {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }

            tracing::info!(
                file = %name,
                bytes = image.bytes.len(),
                content_type = %image.content_type,
                "image stored"
            );
            return Ok(format!("{UPLOADS_ROUTE}/{name}"));
        }

        Err(UploadError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not find an unused upload filename",
        )))
    }
}

async fn write_all(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// `{unix_millis}-{random below 1e9}.{ext}`
fn unique_filename(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = rand::random::<u32>() % 1_000_000_000;
    format!("{millis}-{suffix}.{ext}")
}

/// Stored extension for an accepted mime type.
fn extension_for(content_type: &str) -> Option<&'static str> {
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}
