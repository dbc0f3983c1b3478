//! Thumbnail generation: CPU-side rendering and the per-event pipeline.

pub mod pipeline;
pub mod processor;

pub use pipeline::{ProcessingOutcome, ThumbnailPipeline};
pub use processor::{output_key, ThumbnailArtifact, ThumbnailProcessor, ThumbnailSpec};
