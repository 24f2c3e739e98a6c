use async_trait::async_trait;

use super::error::StorageError;

/// Blob store holding uploaded images, independent of the record store.
///
/// Implementations return durable public URLs; callers keep the object key
/// as an opaque deletion handle.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `data` under `key` and return the public URL it is served from.
    async fn upload(
        &self,
        data: &[u8],
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `true` if an object was deleted, `false` if none existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
