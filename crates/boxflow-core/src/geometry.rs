#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are real-valued design units. A box's `x`/`y` are relative
//! to its parent's top-left corner; roots are relative to the canvas.

use serde::{Deserialize, Serialize};

/// One of the two layout axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Axis {
    /// Both axes, horizontal first.
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    /// The perpendicular axis.
    #[inline]
    #[must_use]
    pub const fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Set the extent along `axis`.
    #[inline]
    pub fn set_along(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.width = value,
            Axis::Vertical => self.height = value,
        }
    }
}

/// A rectangle for box bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge, relative to the parent.
    pub x: f64,
    /// Top edge, relative to the parent.
    pub y: f64,
    /// Width in units.
    pub width: f64,
    /// Height in units.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Leading edge along `axis`.
    #[inline]
    pub const fn origin(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Trailing edge along `axis`.
    #[inline]
    pub fn trailing(&self, axis: Axis) -> f64 {
        self.origin(axis) + self.extent(axis)
    }

    /// Set the leading edge along `axis`.
    #[inline]
    pub fn set_origin(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.x = value,
            Axis::Vertical => self.y = value,
        }
    }

    /// Set the extent along `axis`.
    #[inline]
    pub fn set_extent(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.width = value,
            Axis::Vertical => self.height = value,
        }
    }

    /// Check whether the two rectangles share any span along `axis`.
    #[inline]
    pub fn overlaps_on(&self, other: &Rect, axis: Axis) -> bool {
        self.origin(axis) < other.trailing(axis) && other.origin(axis) < self.trailing(axis)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Create a new rectangle inside the current one with the given padding.
    pub fn inner(&self, padding: Sides) -> Rect {
        Rect {
            x: self.x + padding.left,
            y: self.y + padding.top,
            width: (self.width - padding.horizontal_sum()).max(0.0),
            height: (self.height - padding.vertical_sum()).max(0.0),
        }
    }

    /// The smallest rectangle that contains both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Round every component to the nearest whole unit.
    #[must_use]
    pub fn rounded(&self) -> Rect {
        Rect::new(
            round_unit(self.x),
            round_unit(self.y),
            round_unit(self.width),
            round_unit(self.height),
        )
    }

    /// Check that every component is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// Sides for padding and margins.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f64) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }

    /// Leading side along `axis` (left or top).
    #[inline]
    pub const fn leading(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// Trailing side along `axis` (right or bottom).
    #[inline]
    pub const fn trailing(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }

    /// Sum of both sides along `axis`.
    #[inline]
    pub fn sum(&self, axis: Axis) -> f64 {
        self.leading(axis) + self.trailing(axis)
    }

    /// Scale horizontal sides by `sx` and vertical sides by `sy`, rounding each.
    #[must_use]
    pub fn scaled(&self, sx: f64, sy: f64) -> Sides {
        Sides {
            top: round_unit(self.top * sy),
            right: round_unit(self.right * sx),
            bottom: round_unit(self.bottom * sy),
            left: round_unit(self.left * sx),
        }
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

impl From<(f64, f64)> for Sides {
    fn from((vertical, horizontal): (f64, f64)) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

impl From<(f64, f64, f64, f64)> for Sides {
    fn from((top, right, bottom, left): (f64, f64, f64, f64)) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Round to the nearest whole unit, halves away from zero.
///
/// Negative zero is folded to zero so hashes of equal geometry agree.
#[inline]
pub fn round_unit(value: f64) -> f64 {
    let rounded = value.round();
    if rounded == 0.0 { 0.0 } else { rounded }
}
