#![forbid(unsafe_code)]

//! WCAG contrast utilities and minimal foreground correction.
//!
//! [`ensure_contrast`] moves a foreground color toward pure black or pure
//! white, whichever contrasts better with the background, by the smallest
//! blend fraction that reaches the requested ratio. The fraction is found by
//! bisection: along a straight blend toward black or white the luminance is
//! monotone, so "ratio >= threshold" flips from false to true exactly once.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Minimum ratio for body text (WCAG 2.x AA).
pub const WCAG_AA_NORMAL_TEXT: f64 = 4.5;
/// Minimum ratio for large text (WCAG 2.x AA).
pub const WCAG_AA_LARGE_TEXT: f64 = 3.0;
/// Minimum ratio for icons and other graphical objects (WCAG 2.x 1.4.11).
pub const WCAG_AA_GRAPHICS: f64 = 3.0;
/// Bisection steps; 24 halvings resolve the blend below 1/16,777,216.
pub const DEFAULT_SEARCH_ITERATIONS: u32 = 24;

/// Convert one normalized sRGB channel to linear light.
#[inline]
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn luminance_of(channels: [f64; 3]) -> f64 {
    let [r, g, b] = channels.map(|c| srgb_to_linear(c / 255.0));
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// WCAG relative luminance in `[0, 1]`.
pub fn relative_luminance(color: Rgb) -> f64 {
    luminance_of(color.channels().map(f64::from))
}

/// Contrast ratio between two luminances, in `[1, 21]`.
#[inline]
pub fn ratio_from_luminance(a: f64, b: f64) -> f64 {
    let lighter = a.max(b);
    let darker = a.min(b);
    (lighter + 0.05) / (darker + 0.05)
}

/// WCAG contrast ratio between two colors, in `[1, 21]`.
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    ratio_from_luminance(relative_luminance(fg), relative_luminance(bg))
}

/// Pick the candidate with the highest contrast against `bg`.
///
/// Ties keep the earlier candidate. Returns `None` for an empty slice.
pub fn best_text_color(bg: Rgb, candidates: &[Rgb]) -> Option<Rgb> {
    let (&first, rest) = candidates.split_first()?;
    let mut best = first;
    let mut best_ratio = contrast_ratio(best, bg);
    for &candidate in rest {
        let ratio = contrast_ratio(candidate, bg);
        if ratio > best_ratio {
            best = candidate;
            best_ratio = ratio;
        }
    }
    Some(best)
}

/// The extreme (black or white) with the higher ratio against `bg`.
///
/// Black wins ties.
pub fn contrast_extreme(bg: Rgb) -> Rgb {
    best_text_color(bg, &[Rgb::BLACK, Rgb::WHITE]).unwrap_or(Rgb::BLACK)
}

/// A foreground correction produced by [`ensure_contrast`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastFix {
    pub original: Rgb,
    pub corrected: Rgb,
    /// Black or white.
    pub toward: Rgb,
    /// Blend fraction applied toward `toward`.
    pub blend: f64,
    pub ratio_before: f64,
    pub ratio_after: f64,
}

/// Correct `fg` so that it reaches `threshold` against `bg`.
///
/// Returns `None` when no change is needed or none is possible:
/// - `fg` already meets the threshold;
/// - `fg == bg`, which is treated as deliberately invisible content;
/// - no blend toward the better extreme improves the ratio.
///
/// When the threshold is out of reach even at the extreme, the extreme itself
/// is returned, since it is the best ratio a foreground-only change can give.
pub fn ensure_contrast(fg: Rgb, bg: Rgb, threshold: f64, iterations: u32) -> Option<ContrastFix> {
    let ratio_before = contrast_ratio(fg, bg);
    if ratio_before >= threshold || fg == bg {
        return None;
    }

    let toward = contrast_extreme(bg);
    let bg_luminance = relative_luminance(bg);
    let ratio_at = |t: f64| -> f64 {
        let blended = [
            (fg.r, toward.r),
            (fg.g, toward.g),
            (fg.b, toward.b),
        ]
        .map(|(from, to)| f64::from(from) + (f64::from(to) - f64::from(from)) * t);
        ratio_from_luminance(luminance_of(blended), bg_luminance)
    };

    let blend = if ratio_at(1.0) < threshold {
        1.0
    } else {
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..iterations {
            let mid = (lo + hi) / 2.0;
            if ratio_at(mid) >= threshold {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    };

    let mut corrected = fg.blend_toward(toward, blend);
    let mut ratio_after = contrast_ratio(corrected, bg);
    if ratio_after < threshold && ratio_at(1.0) >= threshold {
        // Quantized channels landed a hair short; the extreme always clears it.
        corrected = toward;
        ratio_after = contrast_ratio(corrected, bg);
    }
    if ratio_after <= ratio_before {
        tracing::trace!(%fg, %bg, ratio_before, "no blend improves contrast");
        return None;
    }

    Some(ContrastFix {
        original: fg,
        corrected,
        toward,
        blend,
        ratio_before,
        ratio_after,
    })
}
