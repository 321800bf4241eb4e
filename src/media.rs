//! Background image upload validation.
//!
//! Runs synchronously before any network call. A rejected upload never
//! reaches the remote API or the item buffer.

#[cfg(test)]
#[path = "media_test.rs"]
mod media_test;

use crate::config::DEFAULT_UPLOAD_MAX_BYTES;

/// Metadata of a file the user picked as a background image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    /// MIME type reported by the picker, e.g. `image/png`.
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("{file_name} is not an image (got {content_type})")]
    NotAnImage { file_name: String, content_type: String },
    #[error("{file_name} is empty")]
    Empty { file_name: String },
    #[error("{file_name} is too large ({size} bytes, max {max_bytes})")]
    TooLarge { file_name: String, size: u64, max_bytes: u64 },
}

impl crate::error::ErrorCode for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAnImage { .. } => "E_UPLOAD_NOT_IMAGE",
            Self::Empty { .. } => "E_UPLOAD_EMPTY",
            Self::TooLarge { .. } => "E_UPLOAD_TOO_LARGE",
        }
    }
}

/// Size cap applied to background images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_UPLOAD_MAX_BYTES }
    }
}

impl UploadPolicy {
    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule; its `Display` is meant for the user.
    pub fn validate(&self, upload: &ImageUpload) -> Result<(), UploadError> {
        let essence = upload
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !essence.starts_with("image/") || essence.len() == "image/".len() {
            return Err(UploadError::NotAnImage {
                file_name: upload.file_name.clone(),
                content_type: upload.content_type.clone(),
            });
        }
        if upload.size == 0 {
            return Err(UploadError::Empty { file_name: upload.file_name.clone() });
        }
        if upload.size > self.max_bytes {
            return Err(UploadError::TooLarge {
                file_name: upload.file_name.clone(),
                size: upload.size,
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}
