//! Error types for the edgequake-svg2png library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SvgPngError`] — **Load-time / setup**: the document cannot enter the
//!   pipeline at all (not SVG, unreadable file, bad configuration). Returned
//!   as `Err(SvgPngError)` from loading and configuration functions, before
//!   any conversion settings exist.
//!
//! * [`RasterError`] — **Per conversion**: one rasterisation attempt failed
//!   (the vector decoder rejected the markup, the output surface could not be
//!   allocated, PNG encoding failed). The orchestrator stores it next to the
//!   document so the user can fix the input and convert again.
//!
//! Invalid numeric edits (width, height, scale) are not errors: they are
//! clamped or ignored by [`crate::settings`] at the point of entry.

use std::path::PathBuf;
use thiserror::Error;

/// All load-time and setup errors returned by the edgequake-svg2png library.
///
/// Conversion failures use [`RasterError`] and are stored in
/// [`crate::session::Session`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SvgPngError {
    // ── Document errors ───────────────────────────────────────────────────
    /// Text is not an SVG document: unparsable XML or a root element other
    /// than `<svg>`.
    #[error("Invalid SVG document: {reason}")]
    InvalidDocument { reason: String },

    /// Pasted text was empty or whitespace only.
    #[error("No SVG content provided\nPaste SVG markup or upload an .svg file.")]
    EmptyInput,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("SVG file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but neither its name nor its content looks like SVG.
    #[error("File is not an SVG image: '{path}'\nPlease upload an .svg file.")]
    NotAnSvg { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PNG file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed conversion attempt.
///
/// Decode and encode failures are separate variants so that a malformed
/// upload can be told apart from an output-side problem.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize)]
pub enum RasterError {
    /// The vector decoder rejected the markup.
    #[error("Failed to decode SVG: {detail}")]
    DecodeFailed { detail: String },

    /// The rendered surface could not be encoded as PNG.
    #[error("Failed to encode PNG: {detail}")]
    EncodeFailed { detail: String },

    /// `width × scale` or `height × scale` rounds to less than one pixel.
    #[error("Output has zero area: {width}x{height} at scale {scale}")]
    ZeroArea { width: u32, height: u32, scale: f64 },

    /// The raster surface is too large or could not be allocated.
    #[error("Cannot allocate a {width}x{height} px raster surface")]
    SurfaceUnavailable { width: u32, height: u32 },

    /// The background render task panicked or was cancelled.
    #[error("Render task interrupted: {detail}")]
    Interrupted { detail: String },
}

/// Failure to rewrite the root element of a markup string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// The markup is not well-formed XML.
    #[error("malformed markup at byte {position}: {detail}")]
    Malformed { position: u64, detail: String },

    /// The markup contains no element at all.
    #[error("markup has no root element")]
    MissingRoot,
}

impl From<MarkupError> for RasterError {
    fn from(e: MarkupError) -> Self {
        RasterError::DecodeFailed {
            detail: e.to_string(),
        }
    }
}

impl From<MarkupError> for SvgPngError {
    fn from(e: MarkupError) -> Self {
        SvgPngError::InvalidDocument {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_document_display() {
        let e = SvgPngError::InvalidDocument {
            reason: "root element is <notsvg>".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("<notsvg>"), "got: {msg}");
    }

    #[test]
    fn zero_area_display() {
        let e = RasterError::ZeroArea {
            width: 1,
            height: 0,
            scale: 2.0,
        };
        assert!(e.to_string().contains("1x0"));
    }

    #[test]
    fn decode_and_encode_are_distinct() {
        let decode = RasterError::DecodeFailed {
            detail: "x".into(),
        };
        let encode = RasterError::EncodeFailed {
            detail: "x".into(),
        };
        assert_ne!(decode, encode);
        assert!(decode.to_string().contains("decode SVG"));
        assert!(encode.to_string().contains("encode PNG"));
    }

    #[test]
    fn markup_error_maps_to_decode_failure() {
        let e: RasterError = MarkupError::MissingRoot.into();
        assert!(matches!(e, RasterError::DecodeFailed { .. }));
    }

    #[test]
    fn markup_error_maps_to_invalid_document() {
        let e: SvgPngError = MarkupError::Malformed {
            position: 4,
            detail: "unexpected end".into(),
        }
        .into();
        assert!(e.to_string().contains("byte 4"), "got: {e}");
    }
}
