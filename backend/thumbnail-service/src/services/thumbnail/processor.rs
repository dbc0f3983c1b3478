//! Thumbnail processor - decodes a source image and renders one WebP
//! variant per configured width, preserving aspect ratio.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the
//! async runtime.

use crate::error::{ProcessError, Result};
use bytes::Bytes;
// image 0.24 still ships the lossy quality constructor; it is gone in 0.25.
#[allow(deprecated)]
use image::codecs::webp::{WebPEncoder, WebPQuality};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tracing::debug;

/// Configuration for thumbnail generation, fixed per invocation.
#[derive(Clone, Debug)]
pub struct ThumbnailSpec {
    /// Target widths in pixels, rendered in this order.
    pub widths: Vec<u32>,
    /// WebP quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            widths: vec![128, 512],
            quality: 85,
        }
    }
}

/// One encoded thumbnail variant.
#[derive(Debug, Clone)]
pub struct ThumbnailArtifact {
    pub width: u32,
    pub data: Bytes,
}

/// Renders thumbnail variants from raw image bytes.
pub struct ThumbnailProcessor {
    spec: ThumbnailSpec,
}

impl ThumbnailProcessor {
    pub fn new(spec: ThumbnailSpec) -> Self {
        Self { spec }
    }

    /// Decode, resize, and encode all configured variants (blocking version).
    ///
    /// **Note:** CPU-intensive; call `render_async` from async code.
    ///
    /// The whole invocation fails on the first bad variant: either every
    /// configured width is produced or none are.
    pub fn render(&self, original_data: &[u8]) -> Result<Vec<ThumbnailArtifact>> {
        let img = image::load_from_memory(original_data)
            .map_err(|e| ProcessError::Decode(format!("not a decodable image: {e}")))?;

        let (orig_w, orig_h) = img.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            "Decoded source image"
        );

        let mut artifacts = Vec::with_capacity(self.spec.widths.len());
        for &width in &self.spec.widths {
            let resized = self.resize_to_width(&img, width)?;
            let data = self.encode_webp(&resized)?;
            debug!(width, size = data.len(), "Thumbnail variant rendered");
            artifacts.push(ThumbnailArtifact { width, data });
        }

        Ok(artifacts)
    }

    /// Render all variants on the blocking thread pool.
    pub async fn render_async(self: Arc<Self>, original_data: Bytes) -> Result<Vec<ThumbnailArtifact>> {
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.render(&original_data))
            .await
            .map_err(|e| ProcessError::Resize(format!("render task panicked: {e}")))?
    }

    /// Resize to the target width, height computed from the source aspect
    /// ratio. Targets wider than the source are upscaled through the same
    /// path; clamping to the source size would break the one-artifact-per-
    /// width contract.
    fn resize_to_width(&self, img: &DynamicImage, width: u32) -> Result<DynamicImage> {
        if width == 0 {
            return Err(ProcessError::Resize("target width 0".to_string()));
        }
        let (orig_w, orig_h) = img.dimensions();
        let height = target_height(orig_w, orig_h, width);
        Ok(img.resize_exact(width, height, FilterType::Lanczos3))
    }

    /// Encode as lossy WebP at the configured quality.
    fn encode_webp(&self, img: &DynamicImage) -> Result<Bytes> {
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();

        #[allow(deprecated)]
        let encoder = WebPEncoder::new_with_quality(&mut buf, WebPQuality::lossy(self.spec.quality));
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| ProcessError::Encode(format!("webp encode: {e}")))?;

        Ok(Bytes::from(buf))
    }
}

/// Height for a target width, preserving the source aspect ratio.
pub fn target_height(orig_w: u32, orig_h: u32, width: u32) -> u32 {
    let height = (width as f64 * orig_h as f64 / orig_w as f64).round() as u32;
    height.max(1)
}

/// Derive the destination key for one variant.
///
/// The filename stem (up to the first `.`) gets `_{width}w.webp` appended,
/// keeping the directory prefix: `uploads/cat.jpg` at width 128 becomes
/// `uploads/cat_128w.webp`. Same source key and width always map to the
/// same output key, so a replay overwrites instead of duplicating.
pub fn output_key(src_key: &str, width: u32) -> String {
    let (prefix, filename) = match src_key.rsplit_once('/') {
        Some((prefix, filename)) => (Some(prefix), filename),
        None => (None, src_key),
    };
    let stem = filename.split('.').next().unwrap_or(filename);
    match prefix {
        Some(prefix) => format!("{prefix}/{stem}_{width}w.webp"),
        None => format!("{stem}_{width}w.webp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn target_height_preserves_aspect_ratio() {
        assert_eq!(target_height(800, 600, 128), 96);
        assert_eq!(target_height(800, 600, 512), 384);
        assert_eq!(target_height(1000, 1000, 600), 600);
        // Rounds rather than truncates
        assert_eq!(target_height(3, 2, 100), 67);
    }

    #[test]
    fn target_height_never_zero() {
        assert_eq!(target_height(10000, 1, 10), 1);
    }

    #[test]
    fn output_key_with_directory_prefix() {
        assert_eq!(output_key("uploads/cat.jpg", 128), "uploads/cat_128w.webp");
        assert_eq!(output_key("a/b/photo.png", 512), "a/b/photo_512w.webp");
    }

    #[test]
    fn output_key_without_prefix() {
        assert_eq!(output_key("cat.jpg", 128), "cat_128w.webp");
        assert_eq!(output_key("noextension", 64), "noextension_64w.webp");
    }

    #[test]
    fn output_key_stem_stops_at_first_dot() {
        assert_eq!(output_key("uploads/cat.tar.jpg", 128), "uploads/cat_128w.webp");
    }

    #[test]
    fn output_key_is_deterministic() {
        assert_eq!(output_key("uploads/cat.jpg", 128), output_key("uploads/cat.jpg", 128));
    }

    #[test]
    fn renders_one_artifact_per_width_with_correct_dimensions() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec {
            widths: vec![128, 512],
            quality: 85,
        });
        let artifacts = processor.render(&png_fixture(800, 600)).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].width, 128);
        assert_eq!(artifacts[1].width, 512);

        let thumb = image::load_from_memory(&artifacts[0].data).unwrap();
        assert_eq!(thumb.dimensions(), (128, 96));
        let thumb = image::load_from_memory(&artifacts[1].data).unwrap();
        assert_eq!(thumb.dimensions(), (512, 384));
    }

    #[test]
    fn renders_widths_in_configured_order_with_duplicates() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec {
            widths: vec![512, 128, 128],
            quality: 85,
        });
        let artifacts = processor.render(&png_fixture(800, 600)).unwrap();
        let widths: Vec<u32> = artifacts.iter().map(|a| a.width).collect();
        assert_eq!(widths, vec![512, 128, 128]);
    }

    #[test]
    fn upscales_when_target_exceeds_source_width() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec {
            widths: vec![1600],
            quality: 85,
        });
        let artifacts = processor.render(&png_fixture(800, 600)).unwrap();
        assert_eq!(artifacts.len(), 1);
        let thumb = image::load_from_memory(&artifacts[0].data).unwrap();
        assert_eq!(thumb.dimensions(), (1600, 1200));
    }

    #[test]
    fn empty_width_list_renders_nothing() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec {
            widths: vec![],
            quality: 85,
        });
        let artifacts = processor.render(&png_fixture(800, 600)).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn non_image_payload_is_a_decode_error() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec::default());
        let err = processor.render(b"this is plain text, not an image").unwrap_err();
        assert_eq!(err.classification(), "DecodeError");
    }

    #[test]
    fn empty_payload_is_a_decode_error() {
        let processor = ThumbnailProcessor::new(ThumbnailSpec::default());
        let err = processor.render(b"").unwrap_err();
        assert_eq!(err.classification(), "DecodeError");
    }

    #[tokio::test]
    async fn render_async_matches_blocking_render() {
        let processor = Arc::new(ThumbnailProcessor::new(ThumbnailSpec {
            widths: vec![64],
            quality: 70,
        }));
        let artifacts = processor
            .render_async(Bytes::from(png_fixture(400, 300)))
            .await
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        let thumb = image::load_from_memory(&artifacts[0].data).unwrap();
        assert_eq!(thumb.dimensions(), (64, 48));
    }
}
