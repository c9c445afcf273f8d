//! Site photo object storage.

mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use supabase::SupabaseStorage;

/// Object store holding uploaded site photos.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store `bytes` under `path` and return the public URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Cheap connectivity check used by diagnostics.
    async fn check_connection(&self) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage not configured")]
    NotConfigured,
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("storage rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Stand-in used when no object store credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStorage;

#[async_trait]
impl PhotoStorage for UnconfiguredStorage {
    async fn upload(
        &self,
        _path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn delete(&self, _path: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }
}

/// Collision-resistant object path: `<unix millis>_<random>.<ext>`.
pub fn object_path(file_name: &str, now: DateTime<Utc>) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "jpg".to_string());
    format!(
        "{}_{}.{}",
        now.timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        extension
    )
}

/// Content type guessed from the file name, falling back to JPEG.
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string())
}
