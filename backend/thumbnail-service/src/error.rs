//! Error types for the thumbnail service.
//!
//! Each pipeline step maps its failures onto one classification. The
//! classification names are part of the wire contract: they appear in
//! error logs and in the failure records delivered to the retry queue,
//! and operators use them to decide whether a replay is worthwhile.

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ProcessError>;

/// A failure in one step of the processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Source object could not be retrieved (missing, denied, transient I/O)
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Payload is not a decodable image (permanent, retry will not help)
    #[error("decode failed: {0}")]
    Decode(String),

    /// Resize stage failed
    #[error("resize failed: {0}")]
    Resize(String),

    /// WebP encoding failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Artifact could not be written to the output bucket
    #[error("upload failed: {0}")]
    Upload(String),
}

impl ProcessError {
    /// Stable classification name used in logs and failure records.
    pub fn classification(&self) -> &'static str {
        match self {
            ProcessError::Fetch(_) => "FetchError",
            ProcessError::Decode(_) => "DecodeError",
            ProcessError::Resize(_) => "ResizeError",
            ProcessError::Encode(_) => "EncodeError",
            ProcessError::Upload(_) => "UploadError",
        }
    }

    /// Whether a redelivery of the same event is likely to succeed.
    ///
    /// Fetch and upload failures are infrastructure-side and usually
    /// transient. Decode/resize/encode failures are content or library
    /// failures and are treated as permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessError::Fetch(_) | ProcessError::Upload(_))
    }
}

/// Startup configuration errors. These abort the process before any
/// event is accepted; they are never produced per invocation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {detail}")]
    Invalid { var: &'static str, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_names_are_stable() {
        assert_eq!(
            ProcessError::Fetch("x".into()).classification(),
            "FetchError"
        );
        assert_eq!(
            ProcessError::Decode("x".into()).classification(),
            "DecodeError"
        );
        assert_eq!(
            ProcessError::Resize("x".into()).classification(),
            "ResizeError"
        );
        assert_eq!(
            ProcessError::Encode("x".into()).classification(),
            "EncodeError"
        );
        assert_eq!(
            ProcessError::Upload("x".into()).classification(),
            "UploadError"
        );
    }

    #[test]
    fn retryability_follows_taxonomy() {
        assert!(ProcessError::Fetch("x".into()).is_retryable());
        assert!(ProcessError::Upload("x".into()).is_retryable());
        assert!(!ProcessError::Decode("x".into()).is_retryable());
        assert!(!ProcessError::Resize("x".into()).is_retryable());
        assert!(!ProcessError::Encode("x".into()).is_retryable());
    }
}
