//! Converter session state and its transitions.
//!
//! A [`Session`] is a single-owner value. Every change goes through
//! [`Session::apply`], which returns the next state and leaves the old one
//! untouched, so a caller can drop a failed transition without any rollback.
//!
//! ## Stale conversions
//!
//! Each [`SessionEvent::ConvertRequested`] allocates a fresh [`RequestId`].
//! Edits that change what would be rendered invalidate the pending id, and a
//! [`SessionEvent::ConversionFinished`] carrying anything but the current id
//! is discarded. A slow render can therefore never overwrite the result of a
//! newer one.

use crate::config::ConverterConfig;
use crate::document::VectorDocument;
use crate::error::{RasterError, SvgPngError};
use crate::output::RasterResult;
use crate::preview::{PreviewState, PreviewViewport};
use crate::settings::{ConversionSettings, Preset};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Tag identifying one conversion request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request #{}", self.0)
    }
}

/// Everything the rasteriser needs, captured when the request was made.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub id: RequestId,
    pub markup: String,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// Which screen a front-end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// No document loaded.
    Upload,
    /// A document is loaded and can be converted.
    Convert,
}

/// State attached to the loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDocument {
    pub document: VectorDocument,
    pub settings: ConversionSettings,
    pub preview: PreviewState,
    pub result: Option<RasterResult>,
    pub error: Option<RasterError>,
}

/// Inputs that drive a [`Session`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Validate and load markup under a display name. Clears the config's
    /// `resources_dir`.
    Load { text: String, name: String },
    /// Load an already validated document.
    LoadDocument(VectorDocument),
    /// Load pasted markup (named `pasted-svg.svg`). Clears the config's
    /// `resources_dir`.
    Paste(String),
    /// Replace the markup of the loaded document.
    EditMarkup(String),
    /// Write `width`/`height` into the loaded document itself.
    ResizeDocument { width: f64, height: f64 },
    SetWidth(f64),
    SetHeight(f64),
    SetScale(f64),
    ToggleAspectLock,
    ApplyPreset(Preset),
    /// The preview box changed size. Non-finite or non-positive sizes are
    /// ignored.
    ViewportResized { width: f64, height: f64 },
    /// Start a conversion of the current document with the current settings.
    ConvertRequested,
    /// A conversion finished.
    ConversionFinished {
        request: RequestId,
        outcome: Result<RasterResult, RasterError>,
    },
    /// Discard the document and go back to the upload stage.
    Reset,
}

/// The converter's whole state.
#[derive(Debug, Clone)]
pub struct Session {
    config: ConverterConfig,
    viewport: PreviewViewport,
    active: Option<ActiveDocument>,
    pending: Option<ConversionRequest>,
    next_request: u64,
}

impl Session {
    /// An empty session in the upload stage.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            viewport: config.viewport,
            config,
            active: None,
            pending: None,
            next_request: 1,
        }
    }

    /// Same state, different configuration. The preview is re-derived
    /// against the new default size.
    pub fn with_config(&self, config: ConverterConfig) -> Self {
        let mut next = self.clone();
        next.config = config;
        next.refresh_preview();
        next
    }

    /// Compute the state that follows `event`.
    ///
    /// # Errors
    /// Only document-producing events fail: [`SvgPngError::InvalidDocument`]
    /// or [`SvgPngError::EmptyInput`] when the new markup is rejected. On
    /// error `self` is still the current state.
    pub fn apply(&self, event: SessionEvent) -> Result<Session, SvgPngError> {
        let mut next = self.clone();
        match event {
            SessionEvent::Load { text, name } => {
                next.config.resources_dir = None;
                next.load(VectorDocument::parse(&text, name)?);
            }
            SessionEvent::LoadDocument(document) => next.load(document),
            SessionEvent::Paste(text) => {
                next.config.resources_dir = None;
                next.load(VectorDocument::from_pasted(&text)?);
            }
            SessionEvent::EditMarkup(text) => {
                if let Some(active) = &self.active {
                    let document = active.document.with_markup(&text)?;
                    next.replace_document(document);
                }
            }
            SessionEvent::ResizeDocument { width, height } => {
                if let Some(active) = &self.active {
                    let document = active.document.with_dimensions(width, height)?;
                    next.replace_document(document);
                }
            }
            SessionEvent::SetWidth(width) => next.update_settings(|s| s.set_width(width)),
            SessionEvent::SetHeight(height) => next.update_settings(|s| s.set_height(height)),
            SessionEvent::ApplyPreset(preset) => next.update_settings(|s| s.apply_preset(preset)),
            SessionEvent::SetScale(scale) => next.update_settings(|s| s.set_scale(scale)),
            SessionEvent::ToggleAspectLock => next.update_settings(|s| s.toggle_aspect_lock()),
            SessionEvent::ViewportResized { width, height } => {
                let usable = |v: f64| v.is_finite() && v > 0.0;
                if !usable(width) || !usable(height) {
                    debug!("Ignoring viewport size {}x{}", width, height);
                    return Ok(next);
                }
                next.viewport = PreviewViewport {
                    width,
                    height,
                    ..self.viewport
                };
                next.refresh_preview();
            }
            SessionEvent::ConvertRequested => next.request_conversion(),
            SessionEvent::ConversionFinished { request, outcome } => {
                next.finish_conversion(request, outcome)
            }
            SessionEvent::Reset => {
                next.active = None;
                next.pending = None;
            }
        }
        Ok(next)
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn viewport(&self) -> PreviewViewport {
        self.viewport
    }

    pub fn stage(&self) -> Stage {
        if self.active.is_some() {
            Stage::Convert
        } else {
            Stage::Upload
        }
    }

    pub fn active(&self) -> Option<&ActiveDocument> {
        self.active.as_ref()
    }

    pub fn document(&self) -> Option<&VectorDocument> {
        self.active.as_ref().map(|a| &a.document)
    }

    pub fn settings(&self) -> Option<&ConversionSettings> {
        self.active.as_ref().map(|a| &a.settings)
    }

    pub fn preview(&self) -> Option<&PreviewState> {
        self.active.as_ref().map(|a| &a.preview)
    }

    /// The bitmap from the last successful conversion of the current state.
    pub fn result(&self) -> Option<&RasterResult> {
        self.active.as_ref().and_then(|a| a.result.as_ref())
    }

    pub fn last_error(&self) -> Option<&RasterError> {
        self.active.as_ref().and_then(|a| a.error.as_ref())
    }

    pub fn pending_request(&self) -> Option<&ConversionRequest> {
        self.pending.as_ref()
    }

    /// `true` while a conversion is outstanding.
    pub fn is_converting(&self) -> bool {
        self.pending.is_some()
    }

    // ── transitions ──────────────────────────────────────────────────────

    fn load(&mut self, document: VectorDocument) {
        let settings = ConversionSettings::seeded(document.intrinsic_size());
        let preview = self.preview_for(&document);
        debug!(
            "Session loaded '{}' at {}x{}",
            document.name(),
            settings.width(),
            settings.height()
        );
        self.active = Some(ActiveDocument {
            document,
            settings,
            preview,
            result: None,
            error: None,
        });
        self.pending = None;
    }

    fn replace_document(&mut self, document: VectorDocument) {
        let preview = self.preview_for(&document);
        if let Some(active) = self.active.as_mut() {
            active.document = document;
            active.preview = preview;
            active.result = None;
            active.error = None;
        }
        self.pending = None;
    }

    fn update_settings(&mut self, op: impl FnOnce(ConversionSettings) -> ConversionSettings) {
        let Some(active) = self.active.as_mut() else {
            debug!("Ignoring settings change without a document");
            return;
        };
        let before = active.settings;
        active.settings = op(before);
        let resized = (before.width(), before.height())
            != (active.settings.width(), active.settings.height());
        if resized {
            active.result = None;
            active.error = None;
            self.pending = None;
        }
    }

    fn request_conversion(&mut self) {
        let Some(active) = self.active.as_mut() else {
            debug!("Ignoring conversion request without a document");
            return;
        };
        let id = RequestId::new(self.next_request);
        self.next_request += 1;
        if let Some(previous) = &self.pending {
            debug!("{} supersedes {}", id, previous.id);
        }
        active.error = None;
        self.pending = Some(ConversionRequest {
            id,
            markup: active.document.markup().to_string(),
            width: active.settings.width(),
            height: active.settings.height(),
            scale: active.settings.scale(),
        });
    }

    fn finish_conversion(
        &mut self,
        request: RequestId,
        outcome: Result<RasterResult, RasterError>,
    ) {
        let current = self.pending.as_ref().map(|p| p.id);
        if current != Some(request) {
            warn!("Discarding stale {} (current: {:?})", request, current);
            return;
        }
        self.pending = None;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        match outcome {
            Ok(result) => {
                active.result = Some(result);
                active.error = None;
            }
            Err(e) => {
                active.result = None;
                active.error = Some(e);
            }
        }
    }

    fn refresh_preview(&mut self) {
        if let Some(active) = &self.active {
            let preview = self.preview_for(&active.document);
            if let Some(active) = self.active.as_mut() {
                active.preview = preview;
            }
        }
    }

    fn preview_for(&self, document: &VectorDocument) -> PreviewState {
        PreviewState::derive(
            document.intrinsic_size(),
            self.config.default_preview_size,
            &self.viewport,
        )
    }
}
