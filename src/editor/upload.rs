use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::store::{BlobStore, StoreError};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "avif"];

/// A file picked for upload
#[derive(Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Lowercased extension, if the name has one
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Where images go and how large they may be
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    pub bucket: String,
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self { bucket: config.bucket.clone(), max_bytes: config.max_upload_bytes }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self { bucket: "images".to_string(), max_bytes: 2 * 1024 * 1024 }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("File is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("'{0}' is not a supported image type")]
    UnsupportedType(String),

    #[error("Field '{0}' does not hold an image")]
    NotImageField(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::TooLarge { max, .. } => {
                format!("The file is too large (max {} MB).", max / (1024 * 1024))
            }
            UploadError::UnsupportedType(_) => "Only image files can be uploaded.".to_string(),
            UploadError::NotImageField(_) => self.to_string(),
            UploadError::Store(e) => e.user_message(),
        }
    }
}

/// Validate and store an image under a random `<uuid>.<ext>` name; returns its public URL
pub async fn upload_image_file(
    blobs: &dyn BlobStore,
    policy: &UploadPolicy,
    file: &UploadFile,
) -> Result<String, UploadError> {
    if file.bytes.len() > policy.max_bytes {
        warn!("Rejected upload of {} bytes (limit {})", file.bytes.len(), policy.max_bytes);
        return Err(UploadError::TooLarge { size: file.bytes.len(), max: policy.max_bytes });
    }

    let ext = file
        .extension()
        .filter(|ext| IMAGE_EXTENSIONS.iter().any(|allowed| *allowed == ext.as_str()))
        .ok_or_else(|| UploadError::UnsupportedType(file.name.clone()))?;

    let path = format!("{}.{}", Uuid::new_v4().simple(), ext);
    let url = blobs.upload_blob(&policy.bucket, &path, file.bytes.clone()).await?;
    info!("Uploaded image {} to bucket {}", path, policy.bucket);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn stores_under_random_name_with_original_extension() {
        let store = MemoryStore::new();
        let url = upload_image_file(&store, &UploadPolicy::default(), &UploadFile::new("Team Photo.JPG", vec![1, 2, 3]))
            .await
            .unwrap();
        assert!(url.starts_with("memory://images/"));
        assert!(url.ends_with(".jpg"));
        assert!(!url.contains("Team"));
    }

    #[tokio::test]
    async fn rejects_oversized_files_before_upload() {
        let store = MemoryStore::new();
        let policy = UploadPolicy { bucket: "images".into(), max_bytes: 2 };
        let err = upload_image_file(&store, &policy, &UploadFile::new("a.png", vec![0; 3])).await.unwrap_err();
        assert_eq!(err, UploadError::TooLarge { size: 3, max: 2 });
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let store = MemoryStore::new();
        let err = upload_image_file(&store, &UploadPolicy::default(), &UploadFile::new("cv.pdf", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
        let err = upload_image_file(&store, &UploadPolicy::default(), &UploadFile::new("png", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }
}
