//! Input resolution: turn a file or pasted text into SVG markup.
//!
//! Two collaborators feed documents in: a file picker / drop zone (a path)
//! and a code editor (a string). Both end up as `(markup, display name)`;
//! structural validation happens afterwards in
//! [`crate::pipeline::extract`].

use crate::error::SvgPngError;
use std::path::Path;
use tracing::debug;

/// Display name given to pasted markup.
pub const PASTED_NAME: &str = "pasted-svg.svg";

/// Check whether a path carries an `.svg` extension (any case).
pub fn is_svg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Cheap content sniff: does the text contain an `<svg` tag at all?
pub fn looks_like_svg(text: &str) -> bool {
    text.contains("<svg")
}

/// Validate pasted text before it is parsed.
pub fn resolve_pasted(text: &str) -> Result<(String, String), SvgPngError> {
    if text.trim().is_empty() {
        return Err(SvgPngError::EmptyInput);
    }
    if !looks_like_svg(text) {
        return Err(SvgPngError::InvalidDocument {
            reason: "no <svg> element found".into(),
        });
    }
    Ok((text.to_string(), PASTED_NAME.to_string()))
}

/// Read an SVG file, returning its text and file name.
///
/// A file is accepted when it has an `.svg` extension or its content
/// contains an `<svg` tag.
pub async fn resolve_file(path: &Path) -> Result<(String, String), SvgPngError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SvgPngError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SvgPngError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(SvgPngError::Internal(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) if !is_svg_path(path) => {
            return Err(SvgPngError::NotAnSvg {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(SvgPngError::InvalidDocument {
                reason: format!("'{}' is not UTF-8 text", path.display()),
            });
        }
    };

    if !is_svg_path(path) && !looks_like_svg(&text) {
        return Err(SvgPngError::NotAnSvg {
            path: path.to_path_buf(),
        });
    }
    if !looks_like_svg(&text) {
        return Err(SvgPngError::InvalidDocument {
            reason: format!("'{}' contains no <svg> element", path.display()),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.svg".to_string());

    debug!("Read {} bytes of SVG from {}", text.len(), path.display());
    Ok((text, name))
}
