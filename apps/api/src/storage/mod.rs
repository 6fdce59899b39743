//! File storage for uploaded resumes. Backends hand back a public URL.
//!
//! Backends: S3-compatible object storage (`S3FileStore`) and Yandex Disk
//! (`YandexDiskStore`). Both create their destination folder once, idempotently,
//! before the first upload.

pub mod s3;
pub mod yandex;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use s3::S3FileStore;
pub use yandex::YandexDiskStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file store unavailable: {0}")]
    Unavailable(String),

    #[error("file store rejected credentials: {0}")]
    Auth(String),

    #[error("file store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Creates the destination folder if it does not exist. Safe to call repeatedly.
    async fn ensure_folder(&self) -> Result<(), StoreError>;

    /// Uploads `bytes` as `destination` and returns a publicly addressable URL.
    async fn upload(
        &self,
        bytes: Bytes,
        destination: &str,
        content_type: &str,
    ) -> Result<String, StoreError>;
}
