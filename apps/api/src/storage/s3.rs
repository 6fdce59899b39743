use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::info;

use super::{FileStore, StoreError};

const KEY_PREFIX: &str = "resumes";

pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    folder_ready: OnceCell<()>,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            folder_ready: OnceCell::new(),
        }
    }

    async fn create_bucket_if_missing(&self) -> Result<(), StoreError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                if let StoreError::Auth(msg) = classify(&e) {
                    return Err(StoreError::Auth(msg));
                }
            }
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Created bucket {}", self.bucket);
                Ok(())
            }
            Err(e) if matches!(e.code(), Some("BucketAlreadyOwnedByYou" | "BucketAlreadyExists")) => {
                Ok(())
            }
            Err(e) => Err(classify(&e)),
        }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn ensure_folder(&self) -> Result<(), StoreError> {
        self.folder_ready
            .get_or_try_init(|| self.create_bucket_if_missing())
            .await
            .map(|_| ())
    }

    async fn upload(
        &self,
        bytes: Bytes,
        destination: &str,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.ensure_folder().await?;

        let key = format!("{KEY_PREFIX}/{destination}");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        info!("Uploaded resume file to s3://{}/{}", self.bucket, key);
        Ok(public_url(&self.public_base_url, &self.bucket, &key))
    }
}

fn classify<E>(err: &E) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let detail = DisplayErrorContext(err).to_string();
    match err.code() {
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            StoreError::Auth(detail)
        }
        _ => StoreError::Unavailable(detail),
    }
}

fn public_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}
