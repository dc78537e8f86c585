//! Root-element rewriting: stamp explicit `width`/`height` onto a document,
//! or only declare the namespaces it forgot.
//!
//! The markup is streamed through quick-xml and written back event by event,
//! so everything except the root start tag (prolog, comments, doctype,
//! entity references, whitespace) is reproduced byte for byte.
//!
//! While the root tag is open for rewriting, two namespace declarations are
//! added when missing: the default SVG namespace (browsers render
//! `<svg>` without it inline, a strict decoder does not) and `xmlns:xlink`
//! when the document uses `xlink:` attributes without declaring the prefix.

use crate::error::MarkupError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Return `markup` with the root element's `width` and `height` set to the
/// given pixel values, overwriting any existing ones.
pub fn stamp_dimensions(markup: &str, width: u32, height: u32) -> Result<String, MarkupError> {
    rewrite_root(markup, Some((width, height)))
}

/// Return `markup` with the missing namespace declarations added to the root
/// element. Dimensions are left as they are.
pub fn declare_namespaces(markup: &str) -> Result<String, MarkupError> {
    rewrite_root(markup, None)
}

fn rewrite_root(markup: &str, size: Option<(u32, u32)>) -> Result<String, MarkupError> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + 96));
    let uses_xlink = markup.contains("xlink:");
    let mut stamped = false;

    loop {
        let event = reader.read_event().map_err(|e| MarkupError::Malformed {
            position: reader.error_position(),
            detail: e.to_string(),
        })?;

        let written = match event {
            Event::Eof => break,
            Event::Start(root) if !stamped => {
                stamped = true;
                let root = stamp_root(&root, size, uses_xlink, reader.buffer_position())?;
                writer.write_event(Event::Start(root))
            }
            Event::Empty(root) if !stamped => {
                stamped = true;
                let root = stamp_root(&root, size, uses_xlink, reader.buffer_position())?;
                writer.write_event(Event::Empty(root))
            }
            other => writer.write_event(other),
        };
        written.map_err(|e| MarkupError::Malformed {
            position: reader.buffer_position(),
            detail: e.to_string(),
        })?;
    }

    if !stamped {
        return Err(MarkupError::MissingRoot);
    }

    String::from_utf8(writer.into_inner()).map_err(|e| MarkupError::Malformed {
        position: e.utf8_error().valid_up_to() as u64,
        detail: "output is not valid UTF-8".into(),
    })
}

fn stamp_root<'a>(
    root: &BytesStart<'a>,
    size: Option<(u32, u32)>,
    uses_xlink: bool,
    position: u64,
) -> Result<BytesStart<'a>, MarkupError> {
    let mut stamped = root.clone();
    stamped.clear_attributes();

    let mut has_default_ns = false;
    let mut has_xlink_ns = false;

    for attr in root.attributes() {
        let attr = attr.map_err(|e| MarkupError::Malformed {
            position,
            detail: e.to_string(),
        })?;
        match attr.key.as_ref() {
            b"width" | b"height" if size.is_some() => continue,
            b"xmlns" => has_default_ns = true,
            b"xmlns:xlink" => has_xlink_ns = true,
            _ => {}
        }
        stamped.push_attribute(attr);
    }

    if !has_default_ns && root.name().prefix().is_none() {
        stamped.push_attribute(("xmlns", SVG_NAMESPACE));
    }
    if uses_xlink && !has_xlink_ns {
        stamped.push_attribute(("xmlns:xlink", XLINK_NAMESPACE));
    }

    if let Some((width, height)) = size {
        let width = width.to_string();
        let height = height.to_string();
        stamped.push_attribute(("width", width.as_str()));
        stamped.push_attribute(("height", height.as_str()));
    }
    Ok(stamped)
}
