//! Conversion output: the encoded bitmap and the size it was produced at.

use crate::error::SvgPngError;
use crate::pipeline::encode;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A successfully rasterised document.
///
/// Cloning is cheap: the PNG bytes are shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterResult {
    #[serde(skip)]
    png: Arc<[u8]>,
    /// Requested base width in pixels.
    pub width: u32,
    /// Requested base height in pixels.
    pub height: u32,
    /// Supersampling factor the bitmap was rendered at.
    pub scale: f64,
    /// Actual bitmap width (`round(width × scale)`).
    pub pixel_width: u32,
    /// Actual bitmap height (`round(height × scale)`).
    pub pixel_height: u32,
}

impl RasterResult {
    pub(crate) fn new(
        png: Vec<u8>,
        width: u32,
        height: u32,
        scale: f64,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Self {
        Self {
            png: png.into(),
            width,
            height,
            scale,
            pixel_width,
            pixel_height,
        }
    }

    /// Encoded PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Always `"image/png"`.
    pub fn mime_type(&self) -> &'static str {
        encode::PNG_MIME
    }

    /// The bitmap as a `data:image/png;base64,…` URI.
    pub fn to_data_uri(&self) -> String {
        encode::to_data_uri(&self.png)
    }

    /// Write the PNG to `path`.
    ///
    /// Uses atomic write (temp file + rename) so a reader never sees a
    /// partial file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SvgPngError> {
        let path = path.as_ref();
        let write_failed = |source| SvgPngError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let tmp_path = path.with_extension("png.tmp");
        tokio::fs::write(&tmp_path, &self.png)
            .await
            .map_err(write_failed)?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(write_failed)?;

        debug!("Wrote {} bytes to {}", self.png.len(), path.display());
        Ok(())
    }
}

/// Download name for a converted document: a trailing `.svg` becomes `.png`.
///
/// Names without the extension are left untouched apart from gaining `.png`.
pub fn png_file_name(document_name: &str) -> String {
    match document_name.strip_suffix(".svg") {
        Some(stem) => format!("{stem}.png"),
        None => format!("{document_name}.png"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RasterResult {
        RasterResult::new(vec![1, 2, 3], 10, 5, 2.0, 20, 10)
    }

    #[test]
    fn file_name_replaces_svg_extension() {
        assert_eq!(png_file_name("logo.svg"), "logo.png");
        assert_eq!(png_file_name("pasted-svg.svg"), "pasted-svg.png");
        assert_eq!(png_file_name("archive.svg.bak"), "archive.svg.bak.png");
        assert_eq!(png_file_name("drawing"), "drawing.png");
    }

    #[test]
    fn clones_share_bytes() {
        let a = sample();
        let b = a.clone();
        assert_eq!(a.png_bytes().as_ptr(), b.png_bytes().as_ptr());
    }

    #[test]
    fn data_uri_and_mime() {
        let r = sample();
        assert_eq!(r.mime_type(), "image/png");
        assert!(r.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn save_writes_bytes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        sample().save(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert!(!path.with_extension("png.tmp").exists());
    }
}
