//! Thumbnail Service
//!
//! Worker that turns uploaded images into resized WebP variants. Each
//! invocation fetches one source object, renders a thumbnail per configured
//! width, and writes the results to the output bucket. Unrecoverable
//! failures are routed to a retry queue instead of propagating.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{ProcessError, Result};
