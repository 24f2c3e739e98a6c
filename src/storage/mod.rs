mod error;
mod traits;

pub mod memory;
pub mod s3;

pub use error::StorageError;
pub use traits::ImageStore;

use uuid::Uuid;

use crate::error::AppError;

/// MIME types accepted for course and team-member images.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// File extension for an allowed image MIME type, `None` for anything else.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// A successfully stored image: the public URL handed to clients plus the
/// opaque key used to delete the blob later.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub url: String,
    pub key: String,
}

/// Validate and upload image bytes under a type-specific folder
/// (`courses` or `team`).
///
/// A rejected MIME type is a validation error; a store failure aborts the
/// enclosing mutation before any record is written.
pub async fn store_image(
    store: &dyn ImageStore,
    data: &[u8],
    content_type: &str,
    folder: &str,
) -> Result<StoredImage, AppError> {
    let ext = image_extension(content_type).ok_or_else(|| {
        AppError::Validation(
            "Only image files (JPEG, JPG, PNG, WebP) are allowed".into(),
        )
    })?;

    let key = format!("{folder}/{}.{ext}", Uuid::new_v4());
    let url = store.upload(data, &key, content_type).await?;

    Ok(StoredImage { url, key })
}

/// Best-effort blob deletion for compensating cleanup.
///
/// Used after the primary record write has already committed, so a failure
/// here is logged and swallowed rather than surfaced to the caller. An
/// already-absent blob is not a failure.
pub async fn discard_image(store: &dyn ImageStore, key: &str) {
    match store.delete(key).await {
        Ok(true) => tracing::debug!(key, "deleted stale image"),
        Ok(false) => tracing::debug!(key, "stale image already absent"),
        Err(err) => tracing::warn!(key, error = %err, "failed to delete stale image"),
    }
}
