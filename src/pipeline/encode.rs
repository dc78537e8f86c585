//! Image encoding: rendered surface → PNG bytes, and PNG → data URI.
//!
//! The raster surface stores premultiplied RGBA; PNG stores straight alpha,
//! so every pixel is demultiplied on the way out. The `image` crate does the
//! actual PNG compression.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, RgbaImage};
use resvg::tiny_skia::Pixmap;
use std::io::Cursor;
use tracing::debug;

/// MIME type of every bitmap this crate produces.
pub const PNG_MIME: &str = "image/png";

/// Convert a premultiplied surface into a straight-alpha RGBA image.
///
/// Returns `None` only if the surface's buffer does not match its
/// dimensions.
pub fn pixmap_to_image(pixmap: &Pixmap) -> Option<DynamicImage> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba).map(DynamicImage::ImageRgba8)
}

/// Encode an image as PNG.
///
/// `quality` is accepted so callers can treat every output format alike;
/// PNG is lossless and ignores it.
pub fn encode_png(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG (quality {} ignored)",
        img.width(),
        img.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}

/// Wrap PNG bytes in a `data:` URI usable wherever an image URL is accepted.
pub fn to_data_uri(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}
