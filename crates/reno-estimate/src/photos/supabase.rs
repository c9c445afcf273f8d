use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::debug;

use super::{PhotoStorage, StorageError};
use crate::supabase::{ensure_success, SupabaseClient, UpstreamFailure};

/// Public bucket in Supabase storage.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: SupabaseClient,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        self.client.url(&format!(
            "storage/v1/object/public/{}/{}",
            self.bucket,
            path.trim_start_matches('/')
        ))
    }

    async fn check(response: reqwest::Response) -> Result<(), StorageError> {
        ensure_success(response).await.map(|_| ()).map_err(rejected)
    }
}

fn rejected(failure: UpstreamFailure) -> StorageError {
    StorageError::Rejected {
        status: failure.status,
        body: failure.body,
    }
}

fn request_failed(err: reqwest::Error) -> StorageError {
    StorageError::Request(err.to_string())
}

#[async_trait]
impl PhotoStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let size = bytes.len();
        let response = self
            .client
            .post(&format!("storage/v1/object/{}/{}", self.bucket, path))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response).await?;

        debug!(bucket = %self.bucket, path, size, "photo uploaded");
        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(&format!("storage/v1/object/{}", self.bucket))
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response).await?;

        debug!(bucket = %self.bucket, path, "photo deleted");
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        let response = self
            .client
            .post(&format!("storage/v1/object/list/{}", self.bucket))
            .json(&json!({ "prefix": "", "limit": 1 }))
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response).await
    }
}
