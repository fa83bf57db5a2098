//! Remote object storage seam.
//!
//! The worker talks to two buckets: a raw-input bucket it downloads from and
//! a processed-output bucket it uploads to. [`BlobStore`] hides which backend
//! serves them so the job processor can be driven by fakes in tests.

pub mod s3;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The object was stored under its final name, but the public-read grant
    /// failed afterwards.
    #[error("Object {object} uploaded but could not be made public: {reason}")]
    MakePublic { object: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetches `object_name` from the raw bucket into `destination`.
    /// A short or interrupted transfer is an error, never a silent success.
    async fn download(&self, object_name: &str, destination: &Path) -> Result<(), BlobStoreError>;

    /// Pushes `source` to the processed bucket as `object_name`, then marks it
    /// publicly readable.
    async fn upload(&self, source: &Path, object_name: &str) -> Result<(), BlobStoreError>;

    /// Whether `object_name` exists in the processed bucket.
    async fn exists(&self, object_name: &str) -> Result<bool, BlobStoreError>;
}
