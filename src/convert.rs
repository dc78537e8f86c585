//! Conversion entry points.
//!
//! [`convert`] drives a [`Session`] through one full conversion:
//! `ConvertRequested` → rasterise → `ConversionFinished`. The lower-level
//! [`run_request`] is for callers that own their event loop and want to
//! spawn the render themselves; they feed the returned event back into
//! [`Session::apply`] whenever it arrives.

use crate::config::ConverterConfig;
use crate::document::VectorDocument;
use crate::error::{RasterError, SvgPngError};
use crate::output::RasterResult;
use crate::pipeline::render;
use crate::session::{ConversionRequest, Session, SessionEvent};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Validate pasted markup and build a document named `pasted-svg.svg`.
pub fn load_document(text: &str) -> Result<VectorDocument, SvgPngError> {
    VectorDocument::from_pasted(text)
}

/// Read and validate an SVG file.
pub async fn load_document_file(path: impl AsRef<Path>) -> Result<VectorDocument, SvgPngError> {
    VectorDocument::from_file(path).await
}

/// Load an SVG file into `session`.
///
/// The file's directory becomes the config's `resources_dir`, so relative
/// image references inside the document resolve next to it.
pub async fn open_file(session: &Session, path: impl AsRef<Path>) -> Result<Session, SvgPngError> {
    let path = path.as_ref();
    let document = load_document_file(path).await?;

    let mut config = session.config().clone();
    config.resources_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);

    session
        .with_config(config)
        .apply(SessionEvent::LoadDocument(document))
}

/// Rasterise raw markup at `width × height`, supersampled by `scale`.
///
/// The markup is not validated beforehand; anything the renderer cannot
/// decode comes back as [`RasterError::DecodeFailed`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_svg2png::{convert_markup, ConverterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConverterConfig::default();
/// let svg = r#"<svg width="100" height="50"><rect width="100" height="50"/></svg>"#;
/// let result = convert_markup(svg, 400, 200, 2.0, &config).await?;
/// assert_eq!((result.pixel_width, result.pixel_height), (800, 400));
/// # Ok(())
/// # }
/// ```
pub async fn convert_markup(
    markup: &str,
    width: u32,
    height: u32,
    scale: f64,
    config: &ConverterConfig,
) -> Result<RasterResult, RasterError> {
    render::rasterize(markup, width, height, scale, config).await
}

/// Run one captured request and produce the event that completes it.
///
/// Progress callbacks fire here: start before rendering, then either
/// complete or error.
pub async fn run_request(request: &ConversionRequest, config: &ConverterConfig) -> SessionEvent {
    let start = Instant::now();
    info!(
        "Converting {}: {}x{} @ {}x",
        request.id, request.width, request.height, request.scale
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(request.id, request.width, request.height, request.scale);
    }

    let outcome = convert_markup(
        &request.markup,
        request.width,
        request.height,
        request.scale,
        config,
    )
    .await;

    match &outcome {
        Ok(result) => {
            info!(
                "{} done: {}x{} px, {} bytes in {}ms",
                request.id,
                result.pixel_width,
                result.pixel_height,
                result.png_bytes().len(),
                start.elapsed().as_millis()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_complete(request.id, result);
            }
        }
        Err(e) => {
            warn!("{} failed: {}", request.id, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_error(request.id, e);
            }
        }
    }

    SessionEvent::ConversionFinished {
        request: request.id,
        outcome,
    }
}

/// Convert the session's document with its current settings.
///
/// Returns the session unchanged when no document is loaded. A failed
/// conversion is not an `Err`: it is stored and readable through
/// [`Session::last_error`].
pub async fn convert(session: &Session) -> Result<Session, SvgPngError> {
    let requested = session.apply(SessionEvent::ConvertRequested)?;
    let Some(request) = requested.pending_request().cloned() else {
        return Ok(requested);
    };
    let event = run_request(&request, requested.config()).await;
    requested.apply(event)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(session: &Session) -> Result<Session, SvgPngError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SvgPngError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(session))
}
