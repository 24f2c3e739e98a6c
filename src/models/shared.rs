use axum::extract::multipart::Field;
use bytes::Bytes;

use crate::error::AppError;

/// An image file lifted out of a multipart request, held in memory until it
/// is handed to the blob store.
pub struct ImageUpload {
    pub data: Bytes,
    pub content_type: String,
}

/// Read an `image` multipart field into memory, enforcing the size cap.
pub async fn read_image_field(
    field: Field<'_>,
    max_size: u64,
) -> Result<ImageUpload, AppError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Validation("Image field must have a content type".into()))?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;

    if data.is_empty() {
        return Err(AppError::Validation("Image file is empty".into()));
    }
    if data.len() as u64 > max_size {
        return Err(AppError::Validation(format!(
            "Image exceeds maximum size of {max_size} bytes"
        )));
    }

    Ok(ImageUpload { data, content_type })
}

/// Read a text multipart field, naming it in the error message.
pub async fn read_text_field(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}
