use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

use super::{BlobStore, StoreError};
use crate::config::StorageConfig;

/// Object-storage client speaking the hosted backend's storage REST API
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base: Option<Url>,
    api_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base: Option<&str>, api_key: Option<String>) -> Result<Self, StoreError> {
        let base = match base {
            Some(raw) => {
                // Url::join drops the last segment unless the base ends with '/'
                let normalized = if raw.ends_with('/') { raw.to_string() } else { format!("{}/", raw) };
                Some(Url::parse(&normalized).map_err(|e| StoreError::Upload(format!("invalid storage url: {}", e)))?)
            }
            None => None,
        };
        Ok(Self { client: Client::new(), base, api_key })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        Self::new(config.url.as_deref(), config.api_key.clone())
    }

    fn base(&self) -> Result<&Url, StoreError> {
        self.base
            .as_ref()
            .ok_or_else(|| StoreError::Upload("blob storage is not configured".to_string()))
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<Url, StoreError> {
        self.base()?
            .join(&format!("object/{}/{}", bucket, path))
            .map_err(|e| StoreError::Upload(e.to_string()))
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String, StoreError> {
        self.base()?
            .join(&format!("object/public/{}/{}", bucket, path))
            .map(String::from)
            .map_err(|e| StoreError::Upload(e.to_string()))
    }
}

/// Content type derived from the file extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload_blob(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let url = self.object_url(bucket, path)?;
        debug!("Uploading {} bytes to {}/{}", bytes.len(), bucket, path);

        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(path))
            .header("x-upsert", "false")
            .body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Blob upload request failed: {}", e);
            StoreError::Upload(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Blob upload rejected with {}: {}", status, body);
            return Err(StoreError::Upload(format!("storage responded {}", status)));
        }

        self.public_url(bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_public_url_under_base_path() {
        let store = HttpBlobStore::new(Some("https://example.supabase.co/storage/v1"), None).unwrap();
        assert_eq!(
            store.public_url("images", "abc.png").unwrap(),
            "https://example.supabase.co/storage/v1/object/public/images/abc.png"
        );
    }

    #[tokio::test]
    async fn unconfigured_store_fails_upload() {
        let store = HttpBlobStore::new(None, None).unwrap();
        let err = store.upload_blob("images", "a.png", vec![1]).await.unwrap_err();
        assert!(matches!(err, StoreError::Upload(_)));
    }

    #[test]
    fn guesses_image_content_types() {
        assert_eq!(content_type_for("x.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x.bin"), "application/octet-stream");
    }
}
