//! Pipeline stages for SVG-to-PNG conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rendering backend can change without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ markup ──▶ render ──▶ encode
//! (file/text) (size)    (stamp)    (resvg)    (PNG)
//! ```
//!
//! 1. [`input`]   — read a file or accept pasted text; cheap SVG sniffing
//! 2. [`extract`] — validate the XML and derive the intrinsic size
//!    (attributes, then viewBox, then absent)
//! 3. [`markup`]  — rewrite `width`/`height` on the root element so the
//!    document declares the requested base size
//! 4. [`render`]  — decode with usvg and rasterise with resvg; runs in
//!    `spawn_blocking` because it is CPU-bound
//! 5. [`encode`]  — un-premultiply, PNG-encode, and optionally base64-wrap

pub mod encode;
pub mod extract;
pub mod input;
pub mod markup;
pub mod render;
