//! SVG rasterisation: markup + target size + supersampling scale → PNG.
//!
//! ## Steps
//!
//! 1. Stamp `width`/`height` onto the root so the decoder lays the document
//!    out at exactly the requested base resolution.
//! 2. Decode the stamped markup with usvg.
//! 3. Allocate a surface of `round(width × scale) × round(height × scale)`.
//! 4. Draw with a uniform `scale` transform, so the document occupies
//!    `width × height` base units and lands on the full output surface.
//! 5. Encode as PNG.
//!
//! ## Why spawn_blocking?
//!
//! Decoding and rendering are CPU-bound and can take hundreds of
//! milliseconds for large surfaces. `tokio::task::spawn_blocking` keeps that
//! work off the async worker threads; awaiting it is the only suspension
//! point of a conversion.
//!
//! ## Why cap pixels?
//!
//! `10000 × 10000` at scale 4 is 1.6 billion pixels (6.4 GB of RGBA).
//! Allocation failure aborts the process in Rust, so oversized surfaces are
//! refused up front with [`RasterError::SurfaceUnavailable`]. The default cap
//! matches the canvas area limit of common browsers.

use crate::config::ConverterConfig;
use crate::error::RasterError;
use crate::output::RasterResult;
use crate::pipeline::{encode, markup};
use once_cell::sync::Lazy;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// System fonts, loaded once per process on first use.
static SYSTEM_FONTS: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!("Loaded {} system font faces", db.len());
    Arc::new(db)
});

/// The subset of [`ConverterConfig`] the blocking render needs.
#[derive(Debug, Clone)]
struct RenderOptions {
    png_quality: f32,
    max_surface_pixels: u64,
    load_system_fonts: bool,
    resources_dir: Option<PathBuf>,
}

impl From<&ConverterConfig> for RenderOptions {
    fn from(config: &ConverterConfig) -> Self {
        Self {
            png_quality: config.png_quality,
            max_surface_pixels: config.max_surface_pixels,
            load_system_fonts: config.load_system_fonts,
            resources_dir: config.resources_dir.clone(),
        }
    }
}

/// Final pixel dimensions for a `width × height` request at `scale`.
///
/// # Errors
/// [`RasterError::ZeroArea`] when the scale is not a positive finite number
/// or either side rounds to less than one pixel.
pub fn output_dimensions(width: u32, height: u32, scale: f64) -> Result<(u32, u32), RasterError> {
    let zero_area = || RasterError::ZeroArea {
        width,
        height,
        scale,
    };
    if !scale.is_finite() || scale <= 0.0 {
        return Err(zero_area());
    }
    let w = (width as f64 * scale).round();
    let h = (height as f64 * scale).round();
    if w < 1.0 || h < 1.0 {
        return Err(zero_area());
    }
    if w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(RasterError::SurfaceUnavailable {
            width: u32::MAX,
            height: u32::MAX,
        });
    }
    Ok((w as u32, h as u32))
}

/// Rasterise `markup` at `width × height` base pixels, supersampled by
/// `scale`.
///
/// The returned bitmap is always `round(width × scale) × round(height × scale)`
/// pixels.
pub async fn rasterize(
    markup: &str,
    width: u32,
    height: u32,
    scale: f64,
    config: &ConverterConfig,
) -> Result<RasterResult, RasterError> {
    let markup = markup.to_string();
    let options = RenderOptions::from(config);

    tokio::task::spawn_blocking(move || rasterize_with(&markup, width, height, scale, &options))
        .await
        .map_err(|e| RasterError::Interrupted {
            detail: e.to_string(),
        })?
}

/// Blocking implementation of [`rasterize`].
pub fn rasterize_blocking(
    markup: &str,
    width: u32,
    height: u32,
    scale: f64,
    config: &ConverterConfig,
) -> Result<RasterResult, RasterError> {
    rasterize_with(markup, width, height, scale, &RenderOptions::from(config))
}

fn rasterize_with(
    svg: &str,
    width: u32,
    height: u32,
    scale: f64,
    options: &RenderOptions,
) -> Result<RasterResult, RasterError> {
    let (pixel_width, pixel_height) = output_dimensions(width, height, scale)?;
    if pixel_width as u64 * pixel_height as u64 > options.max_surface_pixels {
        return Err(RasterError::SurfaceUnavailable {
            width: pixel_width,
            height: pixel_height,
        });
    }

    let stamped = markup::stamp_dimensions(svg, width, height)?;
    let tree = decode(&stamped, options)?;

    let mut pixmap =
        Pixmap::new(pixel_width, pixel_height).ok_or(RasterError::SurfaceUnavailable {
            width: pixel_width,
            height: pixel_height,
        })?;

    let size = tree.size();
    let factor = scale as f32;
    let transform = Transform::from_scale(factor, factor)
        .pre_scale(width as f32 / size.width(), height as f32 / size.height());
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let image = encode::pixmap_to_image(&pixmap).ok_or_else(|| RasterError::EncodeFailed {
        detail: format!("surface buffer does not match {pixel_width}x{pixel_height}"),
    })?;
    let png = encode::encode_png(&image, options.png_quality).map_err(|e| {
        RasterError::EncodeFailed {
            detail: e.to_string(),
        }
    })?;

    info!(
        "Rasterised {}x{} @ {}x → {}x{} px ({} bytes)",
        width,
        height,
        scale,
        pixel_width,
        pixel_height,
        png.len()
    );

    Ok(RasterResult::new(
        png,
        width,
        height,
        scale,
        pixel_width,
        pixel_height,
    ))
}

fn decode(svg: &str, options: &RenderOptions) -> Result<Tree, RasterError> {
    let mut opt = Options {
        resources_dir: options.resources_dir.clone(),
        ..Options::default()
    };
    if options.load_system_fonts {
        opt.fontdb = Arc::clone(&SYSTEM_FONTS);
    }

    let tree = Tree::from_str(svg, &opt).map_err(|e| RasterError::DecodeFailed {
        detail: e.to_string(),
    })?;
    debug!(
        "Decoded SVG tree: {}x{}",
        tree.size().width(),
        tree.size().height()
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn config() -> ConverterConfig {
        ConverterConfig::builder()
            .load_system_fonts(false)
            .build()
            .unwrap()
    }

    const RED_SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
        <rect width="10" height="10" fill="red"/></svg>"#;

    #[test]
    fn output_dimensions_supersample() {
        assert_eq!(output_dimensions(400, 200, 2.0).unwrap(), (800, 400));
        assert_eq!(output_dimensions(100, 100, 0.5).unwrap(), (50, 50));
        assert_eq!(output_dimensions(3, 3, 1.5).unwrap(), (5, 5));
    }

    #[test]
    fn output_dimensions_zero_area() {
        assert!(matches!(
            output_dimensions(0, 10, 1.0),
            Err(RasterError::ZeroArea { .. })
        ));
        assert!(matches!(
            output_dimensions(10, 10, 0.0),
            Err(RasterError::ZeroArea { .. })
        ));
        assert!(matches!(
            output_dimensions(10, 10, f64::NAN),
            Err(RasterError::ZeroArea { .. })
        ));
        assert!(matches!(
            output_dimensions(1, 1, 0.25),
            Err(RasterError::ZeroArea { .. })
        ));
    }

    #[test]
    fn renders_at_supersampled_size() {
        let out = rasterize_blocking(RED_SQUARE, 20, 10, 2.0, &config()).unwrap();
        assert_eq!((out.pixel_width, out.pixel_height), (40, 20));
        let img = image::load_from_memory(out.png_bytes()).unwrap();
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn fills_the_whole_surface() {
        let out = rasterize_blocking(RED_SQUARE, 8, 8, 2.0, &config()).unwrap();
        let img = image::load_from_memory(out.png_bytes()).unwrap();
        for (x, y) in [(2, 2), (13, 13), (2, 13), (8, 8)] {
            let px = img.get_pixel(x, y);
            assert_eq!(px.0, [255, 0, 0, 255], "pixel ({x},{y})");
        }
    }

    #[test]
    fn malformed_markup_is_a_decode_failure() {
        let err = rasterize_blocking("<svg><g></svg>", 10, 10, 1.0, &config()).unwrap_err();
        assert!(matches!(err, RasterError::DecodeFailed { .. }), "got {err:?}");
    }

    #[test]
    fn surface_cap_is_enforced() {
        let capped = ConverterConfig::builder()
            .load_system_fonts(false)
            .max_surface_pixels(100)
            .build()
            .unwrap();
        let err = rasterize_blocking(RED_SQUARE, 20, 20, 1.0, &capped).unwrap_err();
        assert_eq!(
            err,
            RasterError::SurfaceUnavailable {
                width: 20,
                height: 20
            }
        );
    }

    #[tokio::test]
    async fn async_rasterize_matches_blocking() {
        let cfg = config();
        let a = rasterize(RED_SQUARE, 30, 15, 1.0, &cfg).await.unwrap();
        let b = rasterize_blocking(RED_SQUARE, 30, 15, 1.0, &cfg).unwrap();
        assert_eq!(
            (a.pixel_width, a.pixel_height),
            (b.pixel_width, b.pixel_height)
        );
        assert_eq!(a.png_bytes(), b.png_bytes());
    }
}
