//! # edgequake-svg2png
//!
//! Convert SVG documents to PNG at any resolution, with supersampling and a
//! live preview model for interactive front-ends.
//!
//! ## Why this crate?
//!
//! An SVG rarely says how big it wants to be in a way a rasteriser can use
//! directly: sizes come in `mm` or `%`, hide in a `viewBox`, or are missing.
//! This crate settles the intrinsic size once, keeps the user's width,
//! height, scale and aspect lock consistent through every edit, and renders
//! exactly `round(width × scale) × round(height × scale)` pixels.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SVG
//!  │
//!  ├─ 1. Input    file (tokio::fs) or pasted text
//!  ├─ 2. Extract  validate XML, intrinsic size: width/height → viewBox → none
//!  ├─ 3. Settle   width / height / scale / aspect lock / preset
//!  ├─ 4. Stamp    rewrite root width/height to the requested size
//!  ├─ 5. Render   usvg + resvg (CPU-bound, spawn_blocking)
//!  └─ 6. Encode   PNG bytes, data URI, or atomic file write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_svg2png::{convert, ConverterConfig, Session, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new(ConverterConfig::default())
//!         .apply(SessionEvent::Paste(r#"<svg width="100" height="50"/>"#.into()))?
//!         .apply(SessionEvent::SetWidth(400.0))?
//!         .apply(SessionEvent::SetScale(2.0))?;
//!
//!     let session = convert(&session).await?;
//!     if let Some(result) = session.result() {
//!         result.save("logo.png").await?;
//!     } else if let Some(err) = session.last_error() {
//!         eprintln!("conversion failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sizing rules
//!
//! | Edit | Effect |
//! |------|--------|
//! | width / height | preset becomes `custom`; with the lock on, the other side follows |
//! | preset S/M/L/XL | both sides set to 256 / 512 / 1024 / 2048 |
//! | scale | clamped to 0.5–4; size untouched, preset becomes `custom` |
//! | lock on | captures the current `width / height` |
//!
//! Dimensions are always whole pixels in 1–10000.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod session;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use convert::{
    convert, convert_markup, convert_sync, load_document, load_document_file, open_file,
    run_request,
};
pub use document::VectorDocument;
pub use error::{MarkupError, RasterError, SvgPngError};
pub use output::{png_file_name, RasterResult};
pub use pipeline::extract::IntrinsicSize;
pub use preview::{PreviewState, PreviewViewport};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{ConversionRequest, RequestId, Session, SessionEvent, Stage};
pub use settings::{ConversionSettings, Preset};
