//! Configuration management for the thumbnail service.
//!
//! Loads configuration from environment variables once at process start.
//! Width and quality values are validated here so that a bad deployment
//! fails on boot instead of failing per event.

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct Config {
    /// Destination bucket for generated thumbnails
    pub output_bucket: String,
    /// Thumbnail widths, in configured order. Duplicates are kept.
    pub widths: Vec<u32>,
    /// WebP encoder quality (1-100)
    pub quality: u8,
    /// SQS queue URL for failure records. Unset disables delivery.
    pub retry_queue_url: Option<String>,
    pub s3: S3Config,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let output_bucket =
            std::env::var("OUTPUT_BUCKET").map_err(|_| ConfigError::Missing("OUTPUT_BUCKET"))?;

        let widths_raw = std::env::var("THUMB_WIDTHS").unwrap_or_else(|_| "128,512".to_string());
        let widths = parse_widths(&widths_raw)?;

        let quality_raw = std::env::var("WEBP_QUALITY").unwrap_or_else(|_| "85".to_string());
        let quality = parse_quality(&quality_raw)?;

        Ok(Config {
            output_bucket,
            widths,
            quality,
            retry_queue_url: std::env::var("RETRY_QUEUE_URL").ok(),
            s3: S3Config {
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
            },
        })
    }
}

/// Parse a comma-separated width list such as `"128,512"`.
///
/// Order is preserved and duplicates are kept: each entry yields one
/// artifact. Any entry that is not a positive integer is a hard error;
/// silently skipping bad entries would hide a broken deployment. An
/// empty list is valid and produces zero artifacts per event.
pub fn parse_widths(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let mut widths = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let width: u32 = part.parse().map_err(|_| ConfigError::Invalid {
            var: "THUMB_WIDTHS",
            detail: format!("'{part}' is not a positive integer"),
        })?;
        if width == 0 {
            return Err(ConfigError::Invalid {
                var: "THUMB_WIDTHS",
                detail: "width 0 is not allowed".to_string(),
            });
        }
        widths.push(width);
    }
    Ok(widths)
}

fn parse_quality(raw: &str) -> Result<u8, ConfigError> {
    let quality: u8 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: "WEBP_QUALITY",
        detail: format!("'{raw}' is not an integer"),
    })?;
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::Invalid {
            var: "WEBP_QUALITY",
            detail: format!("{quality} is outside 1-100"),
        });
    }
    Ok(quality)
}
