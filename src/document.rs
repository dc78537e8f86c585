//! The vector document: validated markup, a display name, and the intrinsic
//! size derived from it.

use crate::error::SvgPngError;
use crate::output::png_file_name;
use crate::pipeline::{extract, input, markup};
use crate::settings::{MAX_DIMENSION, MIN_DIMENSION};
use std::path::Path;
use tracing::debug;

/// Size stamped by [`VectorDocument::with_dimensions`] when a value is unusable.
pub const FALLBACK_DOCUMENT_SIZE: u32 = 300;

/// A validated SVG document.
///
/// Construction parses the markup once; an invalid document never exists.
/// Edits produce a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    name: String,
    markup: String,
    intrinsic: Option<extract::IntrinsicSize>,
}

impl VectorDocument {
    /// Validate `text` and derive its intrinsic size.
    ///
    /// # Errors
    /// [`SvgPngError::EmptyInput`] for blank text,
    /// [`SvgPngError::InvalidDocument`] when the text is not an SVG document.
    pub fn parse(text: &str, name: impl Into<String>) -> Result<Self, SvgPngError> {
        if text.trim().is_empty() {
            return Err(SvgPngError::EmptyInput);
        }
        let extraction = extract::extract(text)?;
        let name = name.into();
        debug!(
            "Loaded '{}' ({} bytes, intrinsic {:?})",
            name,
            extraction.markup.len(),
            extraction.size
        );
        Ok(Self {
            name,
            markup: extraction.markup,
            intrinsic: extraction.size,
        })
    }

    /// Build a document from text pasted into an editor.
    pub fn from_pasted(text: &str) -> Result<Self, SvgPngError> {
        let (text, name) = input::resolve_pasted(text)?;
        Self::parse(&text, name)
    }

    /// Read and validate an SVG file. The file name becomes the display name.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SvgPngError> {
        let (text, name) = input::resolve_file(path.as_ref()).await?;
        Self::parse(&text, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Intrinsic size, or `None` when the document declares none reliably.
    pub fn intrinsic_size(&self) -> Option<extract::IntrinsicSize> {
        self.intrinsic
    }

    /// Replace the markup, keeping the name. The new text is revalidated.
    pub fn with_markup(&self, text: &str) -> Result<Self, SvgPngError> {
        Self::parse(text, self.name.clone())
    }

    /// Write `width`/`height` onto the root element.
    ///
    /// Values are rounded and clamped to `[1, 10000]`; non-finite or
    /// non-positive values become [`FALLBACK_DOCUMENT_SIZE`].
    pub fn with_dimensions(&self, width: f64, height: f64) -> Result<Self, SvgPngError> {
        let width = document_dimension(width);
        let height = document_dimension(height);
        let stamped = markup::stamp_dimensions(&self.markup, width, height)?;
        Self::parse(&stamped, self.name.clone())
    }

    /// Suggested download name: `logo.svg` → `logo.png`.
    pub fn png_file_name(&self) -> String {
        png_file_name(&self.name)
    }
}

fn document_dimension(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return FALLBACK_DOCUMENT_SIZE;
    }
    value
        .round()
        .clamp(MIN_DIMENSION as f64, MAX_DIMENSION as f64) as u32
}
