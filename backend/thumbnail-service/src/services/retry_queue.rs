//! Retry queue delivery for failed invocations.
//!
//! Failed events become a [`FailureRecord`] on a durable queue where
//! operators inspect them and decide whether to replay (transient
//! classifications) or discard (permanent ones, e.g. `DecodeError` on a
//! non-image upload). Delivery is best-effort: a queue outage must not
//! change the invocation outcome.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Message body delivered to the retry queue on unrecoverable failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailureRecord {
    pub bucket: String,
    pub key: String,
    /// Error classification, e.g. `DecodeError`
    pub error: String,
    pub detail: String,
}

#[async_trait]
pub trait RetryQueue: Send + Sync {
    async fn publish(&self, record: &FailureRecord) -> Result<()>;
}

/// Initialize an AWS SQS client using the same credential handling as the
/// object store: default chain unless static keys are configured.
pub async fn get_sqs_client(config: &crate::config::S3Config) -> aws_sdk_sqs::Client {
    use aws_sdk_sqs::config::Region;

    let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        use aws_sdk_sqs::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "thumbnail_service_sqs",
        );

        aws_config_builder = aws_config_builder.credentials_provider(credentials);
    }

    let aws_config = aws_config_builder.load().await;

    aws_sdk_sqs::Client::new(&aws_config)
}

/// SQS-backed retry queue.
pub struct SqsRetryQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsRetryQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: &str) -> Self {
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl RetryQueue for SqsRetryQueue {
    async fn publish(&self, record: &FailureRecord) -> Result<()> {
        let body =
            serde_json::to_string(record).context("Failed to serialize failure record")?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .with_context(|| {
                format!("Failed to deliver failure record to '{}'", self.queue_url)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_record_wire_shape() {
        let record = FailureRecord {
            bucket: "uploads".to_string(),
            key: "uploads/notanimage.txt".to_string(),
            error: "DecodeError".to_string(),
            detail: "decode failed: unsupported format".to_string(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(json["bucket"], "uploads");
        assert_eq!(json["key"], "uploads/notanimage.txt");
        assert_eq!(json["error"], "DecodeError");
        assert!(json["detail"].as_str().unwrap().contains("decode failed"));
    }
}
