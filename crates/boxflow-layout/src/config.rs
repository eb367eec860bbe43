#![forbid(unsafe_code)]

//! Engine tuning knobs.

use boxflow_style::{Rgb, WCAG_AA_GRAPHICS, WCAG_AA_LARGE_TEXT, WCAG_AA_NORMAL_TEXT};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::tree::TextStyle;

/// Thresholds and tolerances used by every engine pass.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Vectors at or below this extent on both axes are icons.
    pub icon_max_extent: f64,
    /// Width/height difference under which a vector or image is a circle.
    pub circle_tolerance: f64,
    /// Size difference tolerated between corresponding grid descendants.
    pub grid_tolerance: f64,
    /// Gap used by clone when the parent has no measurable sibling gaps.
    pub fallback_gap: f64,
    /// Upper bound on gap-replay passes after a resize.
    pub gap_replay_passes: u32,
    /// Bisection steps for contrast correction.
    pub contrast_iterations: u32,
    pub normal_text_threshold: f64,
    pub large_text_threshold: f64,
    pub graphic_threshold: f64,
    /// Font size (points) from which text counts as large.
    pub large_text_pt: f64,
    /// Font size (points) from which bold text counts as large.
    pub large_bold_text_pt: f64,
    /// Background assumed when no ancestor has a solid fill.
    pub default_background: Rgb,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            icon_max_extent: 48.0,
            circle_tolerance: 1.0,
            grid_tolerance: 1.0,
            fallback_gap: 16.0,
            gap_replay_passes: 2,
            contrast_iterations: boxflow_style::DEFAULT_SEARCH_ITERATIONS,
            normal_text_threshold: WCAG_AA_NORMAL_TEXT,
            large_text_threshold: WCAG_AA_LARGE_TEXT,
            graphic_threshold: WCAG_AA_GRAPHICS,
            large_text_pt: 18.0,
            large_bold_text_pt: 14.0,
            default_background: Rgb::WHITE,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_icon_max_extent(mut self, extent: f64) -> Self {
        self.icon_max_extent = extent;
        self
    }

    #[must_use]
    pub fn with_fallback_gap(mut self, gap: f64) -> Self {
        self.fallback_gap = gap;
        self
    }

    #[must_use]
    pub fn with_gap_replay_passes(mut self, passes: u32) -> Self {
        self.gap_replay_passes = passes;
        self
    }

    #[must_use]
    pub fn with_default_background(mut self, background: Rgb) -> Self {
        self.default_background = background;
        self
    }

    /// Reject values no pass can work with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("icon_max_extent", self.icon_max_extent),
            ("circle_tolerance", self.circle_tolerance),
            ("grid_tolerance", self.grid_tolerance),
            ("fallback_gap", self.fallback_gap),
            ("large_text_pt", self.large_text_pt),
            ("large_bold_text_pt", self.large_bold_text_pt),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid(format!(
                    "{field} must be a finite non-negative number, got {value}"
                )));
            }
        }
        let ratios = [
            ("normal_text_threshold", self.normal_text_threshold),
            ("large_text_threshold", self.large_text_threshold),
            ("graphic_threshold", self.graphic_threshold),
        ];
        for (field, value) in ratios {
            if !(1.0..=21.0).contains(&value) {
                return Err(EngineError::invalid(format!(
                    "{field} must lie in [1, 21], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `style` renders as large text.
    #[must_use]
    pub fn is_large_text(&self, style: &TextStyle) -> bool {
        style.font_size >= self.large_text_pt
            || (style.bold && style.font_size >= self.large_bold_text_pt)
    }

    /// Contrast threshold for a text style.
    #[must_use]
    pub fn text_threshold(&self, style: &TextStyle) -> f64 {
        if self.is_large_text(style) {
            self.large_text_threshold
        } else {
            self.normal_text_threshold
        }
    }
}
