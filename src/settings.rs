//! Conversion settings and the edit operations that keep them consistent.
//!
//! Every operation takes the current [`ConversionSettings`] by value and
//! returns the next one, so no half-applied edit is ever observable. Bad
//! numeric input never raises an error: non-finite or non-positive values
//! are ignored, everything else is rounded and clamped.
//!
//! ## Aspect lock
//!
//! The ratio is captured only when the lock goes from off to on, from the
//! width and height at that instant. Turning the lock off keeps the old
//! ratio around but inert; turning it on again always captures afresh.

use crate::pipeline::extract::IntrinsicSize;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest allowed output dimension in pixels.
pub const MIN_DIMENSION: u32 = 1;
/// Largest allowed output dimension in pixels.
pub const MAX_DIMENSION: u32 = 10_000;
/// Smallest supersampling factor.
pub const MIN_SCALE: f64 = 0.5;
/// Largest supersampling factor.
pub const MAX_SCALE: f64 = 4.0;

/// Named size shortcut. Fixed presets pin both dimensions to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 256 × 256
    Small,
    /// 512 × 512 (default)
    #[default]
    Medium,
    /// 1024 × 1024
    Large,
    /// 2048 × 2048
    XLarge,
    /// Free-form width and height.
    Custom,
}

impl Preset {
    /// The fixed presets, smallest first.
    pub const FIXED: [Preset; 4] = [Preset::Small, Preset::Medium, Preset::Large, Preset::XLarge];

    /// Side length for fixed presets, `None` for [`Preset::Custom`].
    pub fn size(self) -> Option<u32> {
        match self {
            Preset::Small => Some(256),
            Preset::Medium => Some(512),
            Preset::Large => Some(1024),
            Preset::XLarge => Some(2048),
            Preset::Custom => None,
        }
    }

    /// Short button label: S, M, L, XL.
    pub fn label(self) -> &'static str {
        match self {
            Preset::Small => "S",
            Preset::Medium => "M",
            Preset::Large => "L",
            Preset::XLarge => "XL",
            Preset::Custom => "Custom",
        }
    }
}

/// Target size, supersampling and aspect-lock state for one document.
///
/// Fields are private: the only way to change settings is through the edit
/// operations below, which uphold `1 <= width, height <= 10000` and
/// `0.5 <= scale <= 4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionSettings {
    width: u32,
    height: u32,
    scale: f64,
    aspect_locked: bool,
    locked_ratio: Option<f64>,
    preset: Preset,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            scale: 1.0,
            aspect_locked: true,
            locked_ratio: None,
            preset: Preset::Medium,
        }
    }
}

impl ConversionSettings {
    /// Initial settings for a freshly loaded document.
    ///
    /// With an intrinsic size the target starts at that size (rounded and
    /// clamped) in [`Preset::Custom`]; without one the defaults apply.
    pub fn seeded(intrinsic: Option<IntrinsicSize>) -> Self {
        let defaults = Self::default();
        match intrinsic {
            Some(size) => Self {
                width: sanitize_dimension(size.width, defaults.width),
                height: sanitize_dimension(size.height, defaults.height),
                preset: Preset::Custom,
                ..defaults
            },
            None => defaults,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn aspect_locked(&self) -> bool {
        self.aspect_locked
    }

    /// The captured ratio, whether or not the lock is currently on.
    pub fn locked_ratio(&self) -> Option<f64> {
        self.locked_ratio
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// The ratio edits are coupled through right now, if any.
    pub fn active_ratio(&self) -> Option<f64> {
        if self.aspect_locked {
            self.locked_ratio
        } else {
            None
        }
    }

    /// Set the width; with an active ratio the height follows.
    ///
    /// Always switches the preset to [`Preset::Custom`], even when the input
    /// is rejected.
    #[must_use]
    pub fn set_width(self, width: f64) -> Self {
        let mut next = Self {
            preset: Preset::Custom,
            ..self
        };
        if !is_usable(width) {
            debug!("Ignoring invalid width {}", width);
            return next;
        }
        next.width = sanitize_dimension(width, self.width);
        if let Some(ratio) = self.active_ratio() {
            next.height = clamp_dimension(next.width as f64 / ratio);
        }
        next
    }

    /// Set the height; with an active ratio the width follows.
    ///
    /// Always switches the preset to [`Preset::Custom`].
    #[must_use]
    pub fn set_height(self, height: f64) -> Self {
        let mut next = Self {
            preset: Preset::Custom,
            ..self
        };
        if !is_usable(height) {
            debug!("Ignoring invalid height {}", height);
            return next;
        }
        next.height = sanitize_dimension(height, self.height);
        if let Some(ratio) = self.active_ratio() {
            next.width = clamp_dimension(next.height as f64 * ratio);
        }
        next
    }

    /// Set the supersampling factor, clamped to `[0.5, 4]`.
    ///
    /// Leaves width and height alone. Like the dimension edits it switches
    /// the preset to [`Preset::Custom`], even when the input is rejected.
    #[must_use]
    pub fn set_scale(self, scale: f64) -> Self {
        let next = Self {
            preset: Preset::Custom,
            ..self
        };
        if scale.is_nan() {
            debug!("Ignoring NaN scale");
            return next;
        }
        Self {
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
            ..next
        }
    }

    /// Flip the aspect lock.
    ///
    /// Turning it on captures `width / height`; turning it off keeps the
    /// captured ratio but stops applying it.
    #[must_use]
    pub fn toggle_aspect_lock(self) -> Self {
        if self.aspect_locked {
            return Self {
                aspect_locked: false,
                ..self
            };
        }
        if self.height == 0 {
            return self;
        }
        Self {
            aspect_locked: true,
            locked_ratio: Some(self.width as f64 / self.height as f64),
            ..self
        }
    }

    /// Select a preset. Fixed presets set both dimensions; `Custom` only
    /// changes the selection.
    #[must_use]
    pub fn apply_preset(self, preset: Preset) -> Self {
        match preset.size() {
            Some(side) => Self {
                width: side,
                height: side,
                preset,
                ..self
            },
            None => Self { preset, ..self },
        }
    }
}

fn is_usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Round and clamp to `[MIN_DIMENSION, MAX_DIMENSION]`.
fn clamp_dimension(value: f64) -> u32 {
    if value.is_nan() {
        return MIN_DIMENSION;
    }
    value
        .round()
        .clamp(MIN_DIMENSION as f64, MAX_DIMENSION as f64) as u32
}

/// Like [`clamp_dimension`], but unusable input keeps `previous`.
pub fn sanitize_dimension(value: f64, previous: u32) -> u32 {
    if is_usable(value) {
        clamp_dimension(value)
    } else {
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked(width: f64, height: f64) -> ConversionSettings {
        ConversionSettings::default()
            .toggle_aspect_lock() // default is on without a ratio
            .set_width(width)
            .set_height(height)
            .toggle_aspect_lock()
    }

    #[test]
    fn defaults_match_medium_preset() {
        let s = ConversionSettings::default();
        assert_eq!((s.width(), s.height()), (512, 512));
        assert_eq!(s.preset(), Preset::Medium);
        assert!(s.aspect_locked());
        assert_eq!(s.active_ratio(), None);
    }

    #[test]
    fn set_width_always_goes_custom() {
        for value in [100.0, -5.0, f64::NAN, 999_999.0, 512.0] {
            let s = ConversionSettings::default().set_width(value);
            assert_eq!(s.preset(), Preset::Custom, "value {value}");
        }
    }

    #[test]
    fn width_clamps_high_and_rejects_non_positive() {
        let s = ConversionSettings::default().set_width(999_999.0);
        assert_eq!(s.width(), MAX_DIMENSION);

        let s = ConversionSettings::default().set_width(300.0).set_width(-5.0);
        assert_eq!(s.width(), 300);

        let s = s.set_width(0.0).set_width(f64::INFINITY);
        assert_eq!(s.width(), 300);
    }

    #[test]
    fn fractional_input_rounds() {
        let s = ConversionSettings::default().set_width(99.5).set_height(0.4);
        assert_eq!((s.width(), s.height()), (100, 1));
    }

    #[test]
    fn inert_lock_does_not_couple() {
        let s = ConversionSettings::default().set_width(800.0);
        assert_eq!((s.width(), s.height()), (800, 512));
    }

    #[test]
    fn lock_couples_width_to_height() {
        let s = locked(400.0, 200.0);
        assert_eq!(s.active_ratio(), Some(2.0));

        let s = s.set_width(1000.0);
        assert_eq!((s.width(), s.height()), (1000, 500));

        let s = s.set_height(30.0);
        assert_eq!((s.width(), s.height()), (60, 30));
    }

    #[test]
    fn lock_invariant_holds_over_width_sequences() {
        let mut s = locked(1920.0, 1080.0);
        let ratio = s.active_ratio().unwrap();
        for w in [1.0, 7.0, 333.0, 1024.0, 1921.0, 5000.0, 17.5, 9999.0] {
            s = s.set_width(w);
            let expected = (s.width() as f64 / ratio).round() as i64;
            assert!(
                (s.height() as i64 - expected).abs() <= 1,
                "w={} h={} expected {}",
                s.width(),
                s.height(),
                expected
            );
        }
    }

    #[test]
    fn coupled_dimension_stays_in_range() {
        let s = locked(10_000.0, 1.0).set_width(5.0);
        assert_eq!(s.height(), MIN_DIMENSION);

        let s = locked(1.0, 10_000.0).set_width(10.0);
        assert_eq!(s.height(), MAX_DIMENSION);
    }

    #[test]
    fn unlock_keeps_ratio_but_stops_applying_it() {
        let s = locked(400.0, 200.0).toggle_aspect_lock();
        assert!(!s.aspect_locked());
        assert_eq!(s.locked_ratio(), Some(2.0));

        let s = s.set_width(100.0);
        assert_eq!((s.width(), s.height()), (100, 200));
    }

    #[test]
    fn relock_recomputes_from_current_size() {
        let s = locked(400.0, 200.0)
            .toggle_aspect_lock()
            .set_width(300.0)
            .toggle_aspect_lock();
        assert_eq!(s.active_ratio(), Some(1.5));
    }

    #[test]
    fn relock_without_edit_is_idempotent() {
        let s = locked(400.0, 200.0);
        let again = s.toggle_aspect_lock().toggle_aspect_lock();
        assert_eq!(again.active_ratio(), s.active_ratio());
    }

    #[test]
    fn scale_clamps_and_switches_to_custom() {
        let s = ConversionSettings::default().set_scale(10.0);
        assert_eq!(s.scale(), MAX_SCALE);
        assert_eq!(s.preset(), Preset::Custom);

        let s = s.set_scale(0.1);
        assert_eq!(s.scale(), MIN_SCALE);

        let s = s.set_scale(2.5).set_scale(f64::NAN);
        assert_eq!(s.scale(), 2.5);
        assert_eq!((s.width(), s.height()), (512, 512));
    }

    #[test]
    fn fixed_presets_pin_both_sides() {
        for preset in Preset::FIXED {
            let s = ConversionSettings::default()
                .set_width(37.0)
                .apply_preset(preset);
            let side = preset.size().unwrap();
            assert_eq!((s.width(), s.height()), (side, side));
            assert_eq!(s.preset(), preset);
        }
    }

    #[test]
    fn custom_preset_keeps_dimensions() {
        let s = ConversionSettings::default()
            .apply_preset(Preset::Large)
            .apply_preset(Preset::Custom);
        assert_eq!((s.width(), s.height()), (1024, 1024));
        assert_eq!(s.preset(), Preset::Custom);
    }

    #[test]
    fn seeded_from_intrinsic_size() {
        let s = ConversionSettings::seeded(IntrinsicSize::new(100.4, 50.6));
        assert_eq!((s.width(), s.height()), (100, 51));
        assert_eq!(s.preset(), Preset::Custom);

        let s = ConversionSettings::seeded(IntrinsicSize::new(20_000.0, 5.0));
        assert_eq!((s.width(), s.height()), (MAX_DIMENSION, 5));

        assert_eq!(ConversionSettings::seeded(None), ConversionSettings::default());
    }

    #[test]
    fn preset_labels() {
        let labels: Vec<_> = Preset::FIXED.iter().map(|p| p.label()).collect();
        assert_eq!(labels, ["S", "M", "L", "XL"]);
    }
}
