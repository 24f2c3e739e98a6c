use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::ImageStore;
use crate::config::StorageConfig;

/// S3-compatible bucket store. Objects are world-readable through the
/// configured public base URL (typically a CDN domain in front of the
/// bucket).
pub struct S3ImageStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn from_config(cfg: &StorageConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: cfg.region.clone(),
            endpoint: cfg.endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(&cfg.access_key),
            Some(&cfg.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Request(e.to_string()))?;

        let bucket = Bucket::new(&cfg.bucket, region, credentials)
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(Self {
            bucket,
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(
        &self,
        data: &[u8],
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        if response.status_code() != 200 {
            return Err(StorageError::UnexpectedStatus(response.status_code()));
        }

        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status_code() {
            200 | 204 => Ok(true),
            // S3 DELETE is idempotent, but some compatible stores 404.
            404 => Ok(false),
            status => Err(StorageError::UnexpectedStatus(status)),
        }
    }
}
