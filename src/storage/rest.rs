use crate::config::{StorageConfig, StoreConfig};
use crate::error::StorageError;
use crate::storage::{content_type, ObjectStorage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Object storage behind a bucket-oriented REST endpoint
pub struct RestObjectStorage {
    client: Client,
    base_url: String,
    bucket: String,
}

impl RestObjectStorage {
    /// Credentials and timeout are shared with the property store.
    pub fn new(storage: &StorageConfig, store: &StoreConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &store.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| StorageError::Credentials(e.to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| StorageError::Credentials(e.to_string()))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(store.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: storage.base_url.trim_end_matches('/').to_string(),
            bucket: storage.bucket.clone(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStorage for RestObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.object_url(path))
            .header(CONTENT_TYPE, content_type(path))
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, path, "Photo upload rejected");
            return Err(StorageError::Status { status, body });
        }

        info!(path, size, "Uploaded photo");
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .delete(format!("{}/object/{}", self.base_url, self.bucket))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, count = paths.len(), "Photo removal rejected");
            return Err(StorageError::Status { status, body });
        }

        debug!(count = paths.len(), "Removed photos");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
