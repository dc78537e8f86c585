//! Dimension extraction: validate SVG markup and derive its intrinsic size.
//!
//! ## Fallback chain
//!
//! 1. `width` + `height` on the root element, both finite and > 0
//! 2. `viewBox` with exactly four numbers, using the 3rd and 4th
//! 3. nothing — the size is reported as absent and the caller applies a
//!    documented default
//!
//! Explicit pixel dimensions win over the viewBox because the viewBox
//! describes a user coordinate space, which need not match the raster size
//! the author intended. A viewBox is still a better signal than a default.
//!
//! Percentages and font-relative units (`em`, `ex`) cannot be resolved
//! without a containing box, so they count as absent rather than zero.

use crate::error::SvgPngError;
use crate::pipeline::markup;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Natural size of a vector document in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

impl IntrinsicSize {
    /// Build a size, returning `None` unless both sides are finite and > 0.
    pub fn new(width: f64, height: f64) -> Option<Self> {
        if is_positive(width) && is_positive(height) {
            Some(Self { width, height })
        } else {
            None
        }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Where an [`IntrinsicSize`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeSource {
    Attributes,
    ViewBox,
}

/// Output of [`extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Intrinsic size, if the document declares one reliably.
    pub size: Option<IntrinsicSize>,
    /// Which rule of the fallback chain produced `size`.
    pub source: Option<SizeSource>,
    /// Markup with a leading BOM and surrounding whitespace removed, and
    /// undeclared `xlink:` prefixes declared on the root.
    pub markup: String,
}

/// Validate `markup` as an SVG document and derive its intrinsic size.
///
/// # Errors
/// [`SvgPngError::InvalidDocument`] when the text is not well-formed XML or
/// its root element is not `<svg>`.
pub fn extract(markup: &str) -> Result<Extraction, SvgPngError> {
    let normalized = normalize(markup);

    let repaired;
    let (text, doc) = match parse(normalized) {
        Ok(doc) => (normalized, doc),
        Err(roxmltree::Error::UnknownNamespace(prefix, _)) => {
            debug!("Declaring missing namespace prefix '{}'", prefix);
            repaired = markup::declare_namespaces(normalized)?;
            let doc = parse(&repaired).map_err(invalid_document)?;
            (repaired.as_str(), doc)
        }
        Err(e) => return Err(invalid_document(e)),
    };

    let root = doc.root_element();
    let tag = root.tag_name().name();
    if tag != "svg" {
        return Err(SvgPngError::InvalidDocument {
            reason: format!("root element is <{tag}>, expected <svg>"),
        });
    }

    let from_attributes = match (root.attribute("width"), root.attribute("height")) {
        (Some(w), Some(h)) => parse_length(w)
            .zip(parse_length(h))
            .and_then(|(w, h)| IntrinsicSize::new(w, h)),
        _ => None,
    };

    let (size, source) = if let Some(size) = from_attributes {
        (Some(size), Some(SizeSource::Attributes))
    } else if let Some(size) = root.attribute("viewBox").and_then(parse_view_box_size) {
        (Some(size), Some(SizeSource::ViewBox))
    } else {
        (None, None)
    };

    debug!("Extracted intrinsic size {:?} from {:?}", size, source);

    Ok(Extraction {
        size,
        source,
        markup: text.to_string(),
    })
}

fn parse(text: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, options)
}

fn invalid_document(e: roxmltree::Error) -> SvgPngError {
    SvgPngError::InvalidDocument {
        reason: e.to_string(),
    }
}

fn normalize(markup: &str) -> &str {
    markup.trim_start_matches('\u{FEFF}').trim()
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

static RE_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*(px|in|cm|mm|pt|pc)?$").unwrap()
});

/// Parse an SVG `<length>` into pixels at 96 DPI.
///
/// Returns `None` for percentages, relative units, garbage, non-finite
/// values and anything ≤ 0.
pub fn parse_length(raw: &str) -> Option<f64> {
    let caps = RE_LENGTH.captures(raw.trim())?;
    let value: f64 = caps[1].parse().ok()?;
    let px = match caps.get(2).map(|m| m.as_str()) {
        None | Some("px") => value,
        Some("in") => value * 96.0,
        Some("cm") => value * 96.0 / 2.54,
        Some("mm") => value * 96.0 / 25.4,
        Some("pt") => value * 4.0 / 3.0,
        Some("pc") => value * 16.0,
        Some(_) => return None,
    };
    is_positive(px).then_some(px)
}

/// Parse a `viewBox` and return its width/height as a size.
///
/// Exactly four numeric components are required (whitespace and/or comma
/// separated).
pub fn parse_view_box_size(raw: &str) -> Option<IntrinsicSize> {
    let parts: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 4 {
        return None;
    }
    let mut numbers = [0.0_f64; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    if !numbers[0].is_finite() || !numbers[1].is_finite() {
        return None;
    }
    IntrinsicSize::new(numbers[2], numbers[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_of(markup: &str) -> Option<(f64, f64)> {
        extract(markup)
            .expect("valid svg")
            .size
            .map(|s| (s.width, s.height))
    }

    #[test]
    fn explicit_attributes_win_over_view_box() {
        let svg = r#"<svg width="100" height="50" viewBox="0 0 20 10"></svg>"#;
        assert_eq!(size_of(svg), Some((100.0, 50.0)));
        assert_eq!(extract(svg).unwrap().source, Some(SizeSource::Attributes));
    }

    #[test]
    fn view_box_only() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10"></svg>"#;
        assert_eq!(size_of(svg), Some((20.0, 10.0)));
        assert_eq!(extract(svg).unwrap().source, Some(SizeSource::ViewBox));
    }

    #[test]
    fn comma_separated_view_box() {
        assert_eq!(size_of(r#"<svg viewBox="0,0,64,32"/>"#), Some((64.0, 32.0)));
    }

    #[test]
    fn neither_source_is_absent() {
        let ex = extract("<svg/>").unwrap();
        assert_eq!(ex.size, None);
        assert_eq!(ex.source, None);
    }

    #[test]
    fn percentage_falls_through_to_view_box() {
        let svg = r#"<svg width="100%" height="100%" viewBox="0 0 40 30"/>"#;
        assert_eq!(size_of(svg), Some((40.0, 30.0)));
    }

    #[test]
    fn only_one_attribute_uses_view_box() {
        let svg = r#"<svg width="200" viewBox="0 0 40 30"/>"#;
        assert_eq!(size_of(svg), Some((40.0, 30.0)));
    }

    #[test]
    fn zero_width_is_absent_not_zero() {
        assert_eq!(size_of(r#"<svg width="0" height="10"/>"#), None);
    }

    #[test]
    fn malformed_view_box_is_absent() {
        assert_eq!(size_of(r#"<svg viewBox="0 0 20"/>"#), None);
        assert_eq!(size_of(r#"<svg viewBox="0 0 20 10 5"/>"#), None);
        assert_eq!(size_of(r#"<svg viewBox="0 0 -20 10"/>"#), None);
        assert_eq!(size_of(r#"<svg viewBox="a b c d"/>"#), None);
    }

    #[test]
    fn non_svg_root_is_rejected() {
        let err = extract("<notsvg/>").unwrap_err();
        assert!(matches!(err, SvgPngError::InvalidDocument { .. }));
    }

    #[test]
    fn unparsable_text_is_rejected() {
        assert!(extract("<svg width='1'").is_err());
        assert!(extract("not markup at all").is_err());
        assert!(extract("").is_err());
    }

    #[test]
    fn bom_and_whitespace_are_normalized() {
        let ex = extract("\u{FEFF}  \n<svg width=\"3\" height=\"4\"/>\n").unwrap();
        assert_eq!(ex.markup, "<svg width=\"3\" height=\"4\"/>");
    }

    #[test]
    fn prolog_and_doctype_are_accepted() {
        let svg = "<?xml version=\"1.0\"?>\n<!-- exported -->\n\
                   <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"12\" height=\"8\"></svg>";
        assert_eq!(size_of(svg), Some((12.0, 8.0)));

        let svg = "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \
                   \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\
                   <svg width=\"5\" height=\"6\"/>";
        assert_eq!(size_of(svg), Some((5.0, 6.0)));
    }

    #[test]
    fn undeclared_xlink_prefix_is_declared() {
        let svg = r##"<svg width="10" height="10"><defs><rect id="a" width="1" height="1"/></defs><use xlink:href="#a"/></svg>"##;
        let ex = extract(svg).unwrap();
        assert_eq!(ex.size, IntrinsicSize::new(10.0, 10.0));
        assert!(ex.markup.contains(markup::XLINK_NAMESPACE), "got: {}", ex.markup);
    }

    #[test]
    fn unknown_prefixes_stay_invalid() {
        let err = extract(r#"<svg><foo:bar/></svg>"#).unwrap_err();
        assert!(matches!(err, SvgPngError::InvalidDocument { .. }));
    }

    #[test]
    fn length_units() {
        assert_eq!(parse_length("100"), Some(100.0));
        assert_eq!(parse_length(" 12.5px "), Some(12.5));
        assert_eq!(parse_length("1in"), Some(96.0));
        assert_eq!(parse_length("3pt"), Some(4.0));
        assert_eq!(parse_length("1pc"), Some(16.0));
        assert!((parse_length("25.4mm").unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(parse_length("1e2"), Some(100.0));
        assert_eq!(parse_length(".5"), Some(0.5));
    }

    #[test]
    fn unresolvable_lengths() {
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_length("2em"), None);
        assert_eq!(parse_length("auto"), None);
        assert_eq!(parse_length("NaN"), None);
        assert_eq!(parse_length("inf"), None);
        assert_eq!(parse_length("-4"), None);
        assert_eq!(parse_length(""), None);
    }
}
