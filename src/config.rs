//! Configuration for the SVG-to-PNG converter.
//!
//! Every knob that is not part of the per-document [`crate::settings`] lives
//! in [`ConverterConfig`], built via its [`ConverterConfigBuilder`]. The
//! builder clamps what it can and `build()` rejects what it cannot.

use crate::error::SvgPngError;
use crate::preview::PreviewViewport;
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use crate::settings::MAX_DIMENSION;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default preview size for documents that declare no intrinsic size.
pub const DEFAULT_PREVIEW_SIZE: f64 = 300.0;

/// Largest raster surface, in pixels, that will be allocated by default.
///
/// 16384 × 16384: the canvas area limit shared by common browsers.
pub const DEFAULT_MAX_SURFACE_PIXELS: u64 = 268_435_456;

/// Converter-wide configuration.
///
/// # Example
/// ```rust
/// use edgequake_svg2png::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .load_system_fonts(false)
///     .max_surface_pixels(4096 * 4096)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_surface_pixels, 4096 * 4096);
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Preview width and height used when the document declares no size.
    /// Default: 300.
    pub default_preview_size: f64,

    /// The box previews are fitted into. Default: 350 × 256, 16 px padding.
    pub viewport: PreviewViewport,

    /// Quality passed to the encoder. PNG is lossless and ignores it; the
    /// value is kept for parity with lossy formats. Range: 0–1. Default: 1.
    pub png_quality: f32,

    /// Upper bound on `pixel_width × pixel_height` of the output surface.
    /// Default: [`DEFAULT_MAX_SURFACE_PIXELS`].
    pub max_surface_pixels: u64,

    /// Load the system font database (once per process) so `<text>` renders.
    /// Default: true.
    pub load_system_fonts: bool,

    /// Directory used to resolve relative `href`s (embedded images).
    /// Set automatically when a document is loaded from a file.
    pub resources_dir: Option<PathBuf>,

    /// Receives conversion lifecycle events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            default_preview_size: DEFAULT_PREVIEW_SIZE,
            viewport: PreviewViewport::default(),
            png_quality: 1.0,
            max_surface_pixels: DEFAULT_MAX_SURFACE_PIXELS,
            load_system_fonts: true,
            resources_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("default_preview_size", &self.default_preview_size)
            .field("viewport", &self.viewport)
            .field("png_quality", &self.png_quality)
            .field("max_surface_pixels", &self.max_surface_pixels)
            .field("load_system_fonts", &self.load_system_fonts)
            .field("resources_dir", &self.resources_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn default_preview_size(mut self, size: f64) -> Self {
        self.config.default_preview_size = size;
        self
    }

    pub fn viewport(mut self, viewport: PreviewViewport) -> Self {
        self.config.viewport = viewport;
        self
    }

    pub fn png_quality(mut self, quality: f32) -> Self {
        self.config.png_quality = quality.clamp(0.0, 1.0);
        self
    }

    pub fn max_surface_pixels(mut self, px: u64) -> Self {
        self.config.max_surface_pixels = px.max(1);
        self
    }

    pub fn load_system_fonts(mut self, v: bool) -> Self {
        self.config.load_system_fonts = v;
        self
    }

    pub fn resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resources_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, SvgPngError> {
        let c = &self.config;
        let size = c.default_preview_size;
        if !size.is_finite() || size < 1.0 || size > MAX_DIMENSION as f64 {
            return Err(SvgPngError::InvalidConfig(format!(
                "default preview size must be 1–{MAX_DIMENSION}, got {size}"
            )));
        }
        let v = &c.viewport;
        if !(v.width.is_finite() && v.width > 0.0 && v.height.is_finite() && v.height > 0.0) {
            return Err(SvgPngError::InvalidConfig(format!(
                "preview viewport must be positive, got {}x{}",
                v.width, v.height
            )));
        }
        if !v.padding.is_finite() || v.padding < 0.0 {
            return Err(SvgPngError::InvalidConfig(format!(
                "preview padding must be ≥ 0, got {}",
                v.padding
            )));
        }
        if c.png_quality.is_nan() {
            return Err(SvgPngError::InvalidConfig("PNG quality is NaN".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConverterConfig::builder().build().unwrap();
        assert_eq!(c.default_preview_size, 300.0);
        assert_eq!(c.viewport, PreviewViewport::default());
        assert_eq!(c.png_quality, 1.0);
        assert!(c.load_system_fonts);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn quality_is_clamped() {
        let c = ConverterConfig::builder().png_quality(7.0).build().unwrap();
        assert_eq!(c.png_quality, 1.0);
    }

    #[test]
    fn invalid_preview_size_is_rejected() {
        for size in [0.0, -1.0, f64::NAN, 20_000.0] {
            let err = ConverterConfig::builder()
                .default_preview_size(size)
                .build()
                .unwrap_err();
            assert!(matches!(err, SvgPngError::InvalidConfig(_)), "size {size}");
        }
    }

    #[test]
    fn invalid_viewport_is_rejected() {
        let err = ConverterConfig::builder()
            .viewport(PreviewViewport {
                width: 0.0,
                height: 100.0,
                padding: 0.0,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("viewport"));

        let err = ConverterConfig::builder()
            .viewport(PreviewViewport {
                width: 100.0,
                height: 100.0,
                padding: -2.0,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("padding"));
    }

    #[test]
    fn debug_hides_callback() {
        let c = ConverterConfig::builder()
            .progress_callback(Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ConversionProgressCallback>"), "{dbg}");
    }
}
