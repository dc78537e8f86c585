//! Progress-callback trait for conversion lifecycle events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to hear about
//! each conversion the orchestrator runs: a UI can disable its convert
//! button on start, show the bitmap on completion, and surface the message
//! on error.
//!
//! # Example
//!
//! ```rust
//! use edgequake_svg2png::{ConversionProgressCallback, ConverterConfig, RequestId};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     started: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_conversion_start(&self, request: RequestId, width: u32, height: u32, scale: f64) {
//!         self.started.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{request}: {width}x{height} @ {scale}x");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { started: AtomicUsize::new(0) });
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::RasterError;
use crate::output::RasterResult;
use crate::session::RequestId;
use std::sync::Arc;

/// Called by the orchestrator around each conversion.
///
/// Implementations must be `Send + Sync` because rendering runs on a
/// blocking thread pool and configs are shared freely. All methods have
/// default no-op implementations so callers only override what they care
/// about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before rasterisation starts.
    ///
    /// # Arguments
    /// * `request` — id tagging this conversion
    /// * `width`, `height` — requested base size
    /// * `scale` — supersampling factor
    fn on_conversion_start(&self, request: RequestId, width: u32, height: u32, scale: f64) {
        let _ = (request, width, height, scale);
    }

    /// Called when a conversion produced a bitmap.
    fn on_conversion_complete(&self, request: RequestId, result: &RasterResult) {
        let _ = (request, result);
    }

    /// Called when a conversion failed.
    fn on_conversion_error(&self, request: RequestId, error: &RasterError) {
        let _ = (request, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
