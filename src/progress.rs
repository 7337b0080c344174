//! Progress-callback trait for per-image captioning events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while the assembler walks the document. Captioning dominates the
//! wall-clock time of a conversion, so events are emitted per image.
//!
//! # Example
//!
//! ```rust
//! use lecture_a11y::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captioned: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_caption_complete(&self, unit: usize, image: usize, caption_len: usize) {
//!         self.captioned.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("unit {unit} image {image}: {caption_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { captioned: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the document assembler as it captions each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: the server
/// shares one config between concurrent requests.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after extraction, before the first caption request.
    ///
    /// # Arguments
    /// * `total_units`: pages or slides in the document
    /// * `total_images`: images that will be captioned
    fn on_conversion_start(&self, total_units: usize, total_images: usize) {
        let _ = (total_units, total_images);
    }

    /// Called just before the caption request for an image is sent.
    fn on_caption_start(&self, unit_index: usize, image_index: usize) {
        let _ = (unit_index, image_index);
    }

    /// Called when an image was captioned.
    ///
    /// # Arguments
    /// * `caption_len`: byte length of the cleaned caption
    fn on_caption_complete(&self, unit_index: usize, image_index: usize, caption_len: usize) {
        let _ = (unit_index, image_index, caption_len);
    }

    /// Called when captioning an image failed. The conversion aborts right
    /// after this event.
    fn on_caption_error(&self, unit_index: usize, image_index: usize, error: &str) {
        let _ = (unit_index, image_index, error);
    }

    /// Called once after every unit and caption has been assembled.
    fn on_conversion_complete(&self, total_units: usize, captioned: usize) {
        let _ = (total_units, captioned);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
