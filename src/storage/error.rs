use thiserror::Error;

/// Errors from the blob-store collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob store request failed: {0}")]
    Request(String),
    #[error("blob store returned status {0}")]
    UnexpectedStatus(u16),
}
