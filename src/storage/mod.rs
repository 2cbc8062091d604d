//! Media storage
//!
//! Local-disk blob store for uploaded images. The rest of the system only
//! sees the returned path; callers treat the store as opaque.

use std::path::PathBuf;

use crate::config::UploadStorageConfig;
use crate::data::EntityId;
use crate::error::AppError;

/// Public URL prefix uploaded images are served under
pub const PUBLIC_PREFIX: &str = "/uploads/images";

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(_, ext)| *ext == extension)
        .map(|(ct, _)| *ct)
}

/// Image blob store rooted at a local directory
pub struct MediaStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl MediaStorage {
    /// Initialize the store, creating the upload directory if needed
    pub async fn new(config: &UploadStorageConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.dir)
            .await
            .map_err(|e| AppError::Storage(format!("failed to create upload dir: {e}")))?;

        Ok(Self {
            root: config.dir.clone(),
            max_bytes: config.max_bytes,
        })
    }

    /// Store an uploaded image
    ///
    /// Rejects payloads over the configured size limit and content types
    /// outside jpeg/png/gif/webp.
    ///
    /// # Returns
    /// The public path the image can be fetched from
    pub async fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("No image file provided".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "The image may not exceed {} bytes.",
                self.max_bytes
            )));
        }

        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(
                "Image must be one of: image/jpeg, image/png, image/gif, image/webp".to_string(),
            )
        })?;

        let file_name = format!("{}.{}", EntityId::new().0, extension);
        let path = self.root.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("failed to write image: {e}")))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Image stored");

        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }

    /// Read a stored image back
    ///
    /// # Returns
    /// The raw bytes and the content type inferred from the extension
    pub async fn open(&self, file_name: &str) -> Result<(Vec<u8>, &'static str), AppError> {
        // A file name must not address outside the upload directory.
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(AppError::NotFound("Image not found.".to_string()));
        }

        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        let content_type = content_type_for(extension)
            .ok_or_else(|| AppError::NotFound("Image not found.".to_string()))?;

        let bytes = tokio::fs::read(self.root.join(file_name))
            .await
            .map_err(|_| AppError::NotFound("Image not found.".to_string()))?;

        Ok((bytes, content_type))
    }
}
