//! Display-only scaling so a document fits the preview box.
//!
//! Nothing here touches the document or the conversion settings. The factor
//! only ever shrinks: a small icon is shown at its native size, never
//! magnified.

use crate::pipeline::extract::IntrinsicSize;
use serde::{Deserialize, Serialize};

/// The box the preview is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewViewport {
    pub width: f64,
    pub height: f64,
    /// Total padding subtracted from each axis (both sides combined).
    pub padding: f64,
}

impl Default for PreviewViewport {
    fn default() -> Self {
        Self {
            width: 350.0,
            height: 256.0,
            padding: 16.0,
        }
    }
}

impl PreviewViewport {
    /// Usable width and height after padding, never below one pixel.
    pub fn available(&self) -> (f64, f64) {
        (
            (self.width - self.padding).max(1.0),
            (self.height - self.padding).max(1.0),
        )
    }
}

/// Factor in `(0, 1]` that fits `intrinsic_w × intrinsic_h` inside the
/// padded viewport.
pub fn scale_for(
    intrinsic_w: f64,
    intrinsic_h: f64,
    viewport_w: f64,
    viewport_h: f64,
    padding: f64,
) -> f64 {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(intrinsic_w) || !valid(intrinsic_h) {
        return 1.0;
    }
    let viewport = PreviewViewport {
        width: if viewport_w.is_nan() { 1.0 } else { viewport_w },
        height: if viewport_h.is_nan() { 1.0 } else { viewport_h },
        padding: if padding.is_finite() { padding } else { 0.0 },
    };
    let (avail_w, avail_h) = viewport.available();
    (avail_w / intrinsic_w).min(avail_h / intrinsic_h).min(1.0)
}

/// What the preview shows: the document's size and the factor applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewState {
    pub width: f64,
    pub height: f64,
    pub factor: f64,
    /// `true` when the document declared no size and the default was used.
    pub is_fallback: bool,
}

impl PreviewState {
    /// Derive the preview for a document, substituting `default_size` on
    /// both axes when the intrinsic size is absent.
    pub fn derive(
        intrinsic: Option<IntrinsicSize>,
        default_size: f64,
        viewport: &PreviewViewport,
    ) -> Self {
        let (width, height, is_fallback) = match intrinsic {
            Some(size) => (size.width, size.height, false),
            None => (default_size, default_size, true),
        };
        Self {
            width,
            height,
            factor: scale_for(width, height, viewport.width, viewport.height, viewport.padding),
            is_fallback,
        }
    }

    /// On-screen size after scaling.
    pub fn display_size(&self) -> (f64, f64) {
        (self.width * self.factor, self.height * self.factor)
    }
}
