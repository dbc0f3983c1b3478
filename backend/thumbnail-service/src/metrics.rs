//! Prometheus metrics for the pipeline, plus the embedded metrics payload
//! logged on every successful invocation for log-based aggregation.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};
use serde_json::json;
use tracing::{info, warn};

#[derive(Clone)]
pub struct PipelineMetrics {
    pub thumbnails_generated: IntCounter,
    pub bytes_in: IntCounter,
    pub bytes_out: IntCounter,
    pub duration_ms: Histogram,
    pub failures: IntCounterVec,
}

impl PipelineMetrics {
    pub fn new(service: &str) -> Self {
        let registry = prometheus::default_registry();

        let thumbnails_generated = IntCounter::with_opts(
            Opts::new(
                "thumbnails_generated_total",
                "Total number of thumbnail artifacts written",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for thumbnails_generated_total");

        let bytes_in = IntCounter::with_opts(
            Opts::new(
                "thumbnail_bytes_in_total",
                "Total source bytes fetched for processing",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for thumbnail_bytes_in_total");

        let bytes_out = IntCounter::with_opts(
            Opts::new(
                "thumbnail_bytes_out_total",
                "Total encoded thumbnail bytes uploaded",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for thumbnail_bytes_out_total");

        let duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "thumbnail_processing_duration_ms",
                "End-to-end processing duration per invocation in milliseconds",
            )
            .const_label("service", service.to_string())
            .buckets(vec![
                10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ]),
        )
        .expect("valid metric opts for thumbnail_processing_duration_ms");

        let failures = IntCounterVec::new(
            Opts::new(
                "thumbnail_failures_total",
                "Failed invocations by error classification",
            )
            .const_label("service", service.to_string()),
            &["classification"],
        )
        .expect("valid metric opts for thumbnail_failures_total");

        for metric in [
            Box::new(thumbnails_generated.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(bytes_in.clone()),
            Box::new(bytes_out.clone()),
            Box::new(duration_ms.clone()),
            Box::new(failures.clone()),
        ] {
            if let Err(e) = registry.register(metric) {
                warn!("Failed to register pipeline metric: {}", e);
            }
        }

        Self {
            thumbnails_generated,
            bytes_in,
            bytes_out,
            duration_ms,
            failures,
        }
    }

    /// Record a completed invocation and log the embedded metrics payload.
    pub fn record_success(
        &self,
        bucket: &str,
        key: &str,
        thumbnails_count: usize,
        duration_ms: u64,
        bytes_in: usize,
        bytes_out: usize,
    ) {
        self.thumbnails_generated.inc_by(thumbnails_count as u64);
        self.bytes_in.inc_by(bytes_in as u64);
        self.bytes_out.inc_by(bytes_out as u64);
        self.duration_ms.observe(duration_ms as f64);

        // Structured measurement record co-located with the logs, for
        // downstream aggregation without scraping the registry.
        let payload = json!({
            "namespace": "ImagePipeline",
            "bucket": bucket,
            "key": key,
            "thumbnails_count": thumbnails_count,
            "duration_ms": duration_ms,
            "size_in_bytes": bytes_in,
            "size_out_bytes": bytes_out,
        });
        info!(target: "image_pipeline::metrics", "{payload}");
    }

    pub fn record_failure(&self, classification: &str) {
        self.failures.with_label_values(&[classification]).inc();
    }
}
