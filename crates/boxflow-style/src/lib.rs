#![forbid(unsafe_code)]

//! Color types and WCAG contrast math for boxflow.
//!
//! # Role in boxflow
//! `boxflow-style` is the shared vocabulary for colors. Box fills and text
//! colors in `boxflow-layout` are [`Rgb`] values, and the contrast
//! remediation pass is built on [`ensure_contrast`].
//!
//! # This crate provides
//! - [`Rgb`] with hex parsing and channel blending.
//! - WCAG relative luminance and contrast ratio.
//! - AA thresholds for normal text, large text, and graphics.
//! - [`ensure_contrast`], the minimal black/white blend that reaches a ratio.

/// Opaque sRGB colors.
pub mod color;
/// WCAG contrast utilities.
pub mod contrast;

pub use color::{ColorParseError, Rgb};
pub use contrast::{
    ContrastFix, DEFAULT_SEARCH_ITERATIONS, WCAG_AA_GRAPHICS, WCAG_AA_LARGE_TEXT,
    WCAG_AA_NORMAL_TEXT, best_text_color, contrast_extreme, contrast_ratio, ensure_contrast,
    relative_luminance,
};
