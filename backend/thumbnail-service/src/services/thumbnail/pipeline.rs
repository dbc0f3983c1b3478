//! The per-event processing pipeline.
//!
//! One invocation runs fetch → decode → resize → encode → upload strictly
//! in sequence and terminates in exactly one of two ways: a `complete` log
//! with metrics, or an `error` log plus a failure record on the retry
//! queue. Errors never cross the `process` boundary.

use super::processor::{output_key, ThumbnailProcessor, ThumbnailSpec};
use crate::error::Result;
use crate::events::{S3Event, SourceReference};
use crate::metrics::PipelineMetrics;
use crate::services::retry_queue::{FailureRecord, RetryQueue};
use crate::services::storage::ObjectStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success {
        /// Widths produced, in configured order
        produced_widths: Vec<u32>,
        duration_ms: u64,
        input_bytes: usize,
        output_bytes_total: usize,
    },
    Failure {
        classification: &'static str,
        detail: String,
    },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

/// Converts one source object into its thumbnail variants.
pub struct ThumbnailPipeline {
    store: Arc<dyn ObjectStore>,
    retry_queue: Option<Arc<dyn RetryQueue>>,
    processor: Arc<ThumbnailProcessor>,
    spec_widths: Vec<u32>,
    output_bucket: String,
    metrics: PipelineMetrics,
}

impl ThumbnailPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        retry_queue: Option<Arc<dyn RetryQueue>>,
        spec: ThumbnailSpec,
        output_bucket: &str,
    ) -> Self {
        let spec_widths = spec.widths.clone();
        Self {
            store,
            retry_queue,
            processor: Arc::new(ThumbnailProcessor::new(spec)),
            spec_widths,
            output_bucket: output_bucket.to_string(),
            metrics: PipelineMetrics::new("thumbnail-service"),
        }
    }

    /// Process every record in a delivery independently. A failing record
    /// never prevents the remaining ones from being processed; malformed
    /// records are logged and skipped.
    pub async fn handle_event(&self, event: &S3Event) -> Vec<ProcessingOutcome> {
        let mut outcomes = Vec::with_capacity(event.records.len());
        for record in &event.records {
            match record.source() {
                Some(source) => outcomes.push(self.process(&source).await),
                None => {
                    error!(action = "malformed_record", "Event record missing bucket or key, skipping");
                }
            }
        }
        outcomes
    }

    /// Run the full pipeline for one source object.
    ///
    /// Never returns an error and never panics past this boundary: every
    /// failure path ends in error telemetry and, when a retry queue is
    /// configured, a failure record.
    pub async fn process(&self, source: &SourceReference) -> ProcessingOutcome {
        info!(action = "start", bucket = %source.bucket, key = %source.key);
        let started = Instant::now();

        match self.run(source).await {
            Ok((input_bytes, output_bytes_total)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                info!(
                    action = "complete",
                    bucket = %source.bucket,
                    key = %source.key,
                    thumbnails = ?self.spec_widths,
                );
                self.metrics.record_success(
                    &source.bucket,
                    &source.key,
                    self.spec_widths.len(),
                    duration_ms,
                    input_bytes,
                    output_bytes_total,
                );
                ProcessingOutcome::Success {
                    produced_widths: self.spec_widths.clone(),
                    duration_ms,
                    input_bytes,
                    output_bytes_total,
                }
            }
            Err(e) => {
                let classification = e.classification();
                let detail = e.to_string();
                error!(
                    action = "error",
                    bucket = %source.bucket,
                    key = %source.key,
                    classification,
                    error = %detail,
                    retryable = e.is_retryable(),
                );
                self.metrics.record_failure(classification);
                self.send_failure_record(source, classification, &detail).await;
                ProcessingOutcome::Failure {
                    classification,
                    detail,
                }
            }
        }
    }

    /// The fallible portion of the pipeline. Returns (input bytes, total
    /// output bytes) on success.
    async fn run(&self, source: &SourceReference) -> Result<(usize, usize)> {
        // Fetch
        let body = self.store.download(&source.bucket, &source.key).await?;
        let input_bytes = body.len();

        // Decode, resize, and encode on the blocking pool
        let artifacts = self.processor.clone().render_async(body).await?;

        // Upload each variant under its derived key. The first failure
        // aborts the invocation; variants already written stay in place
        // and are overwritten on replay rather than rolled back.
        let mut output_bytes_total = 0usize;
        for artifact in &artifacts {
            let dest_key = output_key(&source.key, artifact.width);
            self.store
                .upload(
                    &self.output_bucket,
                    &dest_key,
                    artifact.data.clone(),
                    "image/webp",
                )
                .await?;
            output_bytes_total += artifact.data.len();
        }

        Ok((input_bytes, output_bytes_total))
    }

    /// Best-effort failure record delivery. A queue outage is logged but
    /// does not change the invocation outcome.
    async fn send_failure_record(
        &self,
        source: &SourceReference,
        classification: &'static str,
        detail: &str,
    ) {
        let Some(queue) = &self.retry_queue else {
            return;
        };

        let record = FailureRecord {
            bucket: source.bucket.clone(),
            key: source.key.clone(),
            error: classification.to_string(),
            detail: detail.to_string(),
        };

        match queue.publish(&record).await {
            Ok(()) => {
                info!(
                    action = "sent_to_retry_queue",
                    bucket = %source.bucket,
                    key = %source.key,
                    classification,
                );
            }
            Err(e) => {
                warn!(
                    action = "retry_queue_failed",
                    bucket = %source.bucket,
                    key = %source.key,
                    error = %e,
                );
            }
        }
    }
}
