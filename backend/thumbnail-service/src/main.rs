//! Thumbnail Worker - processes one S3 event delivery per run
//!
//! The host trigger invokes this binary with an S3 `ObjectCreated`
//! notification document, either as a file path argument or on stdin.
//! Every record is processed independently; failures are reported through
//! the retry queue rather than the exit code, so host-side redelivery
//! stays the only retry mechanism.
//!
//! Environment variables:
//! - OUTPUT_BUCKET: destination bucket for thumbnails (required)
//! - THUMB_WIDTHS: comma-separated widths (default: "128,512")
//! - WEBP_QUALITY: WebP quality 1-100 (default: 85)
//! - RETRY_QUEUE_URL: SQS queue URL for failure records (optional)
//! - AWS_REGION / AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY / S3_ENDPOINT

use anyhow::Context;
use std::io::Read;
use std::sync::Arc;
use thumbnail_service::config::Config;
use thumbnail_service::events::S3Event;
use thumbnail_service::services::retry_queue::{get_sqs_client, RetryQueue, SqsRetryQueue};
use thumbnail_service::services::storage::{get_s3_client, S3ObjectStore};
use thumbnail_service::services::thumbnail::{ThumbnailPipeline, ThumbnailSpec};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with JSON output
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thumbnail_service=info".parse().expect("valid directive"))
                .add_directive("thumbnail_worker=info".parse().expect("valid directive")),
        )
        .init();

    info!("Starting Thumbnail Worker");

    // Load configuration. Bad widths or quality abort here, before any
    // event is accepted.
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Configuration error")?;
    info!(
        output_bucket = %config.output_bucket,
        widths = ?config.widths,
        quality = config.quality,
        retry_queue = config.retry_queue_url.is_some(),
        "Configuration loaded"
    );

    // Construct AWS clients
    let s3_client = get_s3_client(&config.s3).await;
    let store = Arc::new(S3ObjectStore::new(s3_client));

    let retry_queue: Option<Arc<dyn RetryQueue>> = match &config.retry_queue_url {
        Some(url) => {
            let sqs_client = get_sqs_client(&config.s3).await;
            Some(Arc::new(SqsRetryQueue::new(sqs_client, url)))
        }
        None => {
            info!("RETRY_QUEUE_URL not set, failure records disabled");
            None
        }
    };

    let pipeline = ThumbnailPipeline::new(
        store,
        retry_queue,
        ThumbnailSpec {
            widths: config.widths.clone(),
            quality: config.quality,
        },
        &config.output_bucket,
    );

    // Read the event document from the argument path or stdin
    let event = read_event().context("Failed to read event document")?;
    info!(records = event.records.len(), "Event delivery received");

    let outcomes = pipeline.handle_event(&event).await;
    let failures = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(
        processed = outcomes.len(),
        failed = failures,
        "Event delivery handled"
    );

    Ok(())
}

fn read_event() -> anyhow::Result<S3Event> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event file '{path}'"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    serde_json::from_str(&raw).context("Malformed event document")
}
