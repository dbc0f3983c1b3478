//! Object storage access.
//!
//! The pipeline talks to storage through the [`ObjectStore`] trait so tests
//! can substitute an in-memory store. The production implementation wraps
//! the AWS S3 SDK; download failures classify as `FetchError` and upload
//! failures as `UploadError`.

use crate::config::S3Config;
use crate::error::{ProcessError, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object body.
    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Write an object, overwriting any existing one under the same key.
    async fn upload(&self, bucket: &str, key: &str, data: Bytes, content_type: &str)
        -> Result<()>;
}

/// Initialize an AWS S3 client with credentials from config.
///
/// Uses the default credential chain unless static keys are provided.
/// A custom endpoint enables S3-compatible storage like MinIO.
pub async fn get_s3_client(config: &S3Config) -> Client {
    use aws_sdk_s3::config::Region;

    let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "thumbnail_service_s3",
        );

        aws_config_builder = aws_config_builder.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.endpoint {
        aws_config_builder = aws_config_builder.endpoint_url(endpoint);
    }

    let aws_config = aws_config_builder.load().await;

    Client::new(&aws_config)
}

/// S3-backed object store.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ProcessError::Fetch(format!("get {bucket}/{key}: {e}")))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| ProcessError::Fetch(format!("read body of {bucket}/{key}: {e}")))?;

        Ok(body.into_bytes())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    ProcessError::Upload(format!(
                        "put {bucket}/{key}: auth failed (403), check AWS credentials"
                    ))
                } else if error_msg.contains("NoSuchBucket") {
                    ProcessError::Upload(format!("put {key}: bucket not found: {bucket}"))
                } else {
                    ProcessError::Upload(format!("put {bucket}/{key}: {e}"))
                }
            })?;

        Ok(())
    }
}
