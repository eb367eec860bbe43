#![forbid(unsafe_code)]

//! Proportional subtree scaling.
//!
//! When a container changes from `old` to `new` size, each descendant is
//! handled by category:
//!
//! | Category | Size | Position (free parents only) |
//! |----------|------|------------------------------|
//! | text | unchanged | scaled origin |
//! | icon-like | unchanged | scaled origin |
//! | circle | `round(max(sx*w, sy*h))` on both axes | re-centered on the scaled box |
//! | other | `round(sx*w) x round(sy*h)` | scaled origin |
//!
//! Positions in free parents are then clamped so the box does not cross the
//! scaled leading or trailing margin it had before. Children of stack and
//! grid parents keep their positions; the next flow pass places them.
//!
//! Scaling is depth-first: a box's subtree is finished before its next
//! sibling is touched.

use boxflow_core::{Axis, Rect, Size, round_unit};

use crate::config::EngineConfig;
use crate::tree::{BoxId, BoxKind, BoxNode, BoxTree, LayoutMode};

/// How the scaler treats one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleCategory {
    Text,
    IconLike,
    Circle,
    Proportional,
}

/// Classify `id` for scaling.
#[must_use]
pub fn category(tree: &BoxTree, id: BoxId, config: &EngineConfig) -> ScaleCategory {
    let Some(node) = tree.node(id) else {
        return ScaleCategory::Proportional;
    };
    if node.kind.is_text() {
        ScaleCategory::Text
    } else if is_icon_like(tree, id, config) {
        ScaleCategory::IconLike
    } else if node.is_circular(config.circle_tolerance) {
        ScaleCategory::Circle
    } else {
        ScaleCategory::Proportional
    }
}

fn is_small(node: &BoxNode, config: &EngineConfig) -> bool {
    node.rect.width <= config.icon_max_extent && node.rect.height <= config.icon_max_extent
}

/// Whether `id` is an icon: a small vector, or a container made only of
/// icons.
#[must_use]
pub fn is_icon_like(tree: &BoxTree, id: BoxId, config: &EngineConfig) -> bool {
    let Some(node) = tree.node(id) else {
        return false;
    };
    match node.kind {
        BoxKind::Vector(_) => is_small(node, config),
        BoxKind::Container => {
            !node.children().is_empty()
                && node
                    .children()
                    .iter()
                    .all(|&child| is_icon_like(tree, child, config))
        }
        BoxKind::Text(_) | BoxKind::Image => false,
    }
}

/// Frame of the parent whose children are being scaled.
#[derive(Debug, Clone, Copy)]
struct ParentFrame {
    free: bool,
    old: Size,
    new: Size,
}

/// Scale every child of `parent`, whose size changed from `old` to its
/// current size, by `(sx, sy)`. Returns the number of boxes visited.
pub fn scale_children(
    tree: &mut BoxTree,
    parent: BoxId,
    old: Size,
    sx: f64,
    sy: f64,
    config: &EngineConfig,
) -> usize {
    let Some(node) = tree.node(parent) else {
        return 0;
    };
    let frame = ParentFrame {
        free: node.layout.is_free(),
        old,
        new: node.rect.size(),
    };
    let children = node.children().to_vec();
    let mut visited = 0;
    for child in children {
        visited += scale_box(tree, child, frame, sx, sy, config);
    }
    visited
}

fn scale_box(
    tree: &mut BoxTree,
    id: BoxId,
    frame: ParentFrame,
    sx: f64,
    sy: f64,
    config: &EngineConfig,
) -> usize {
    let category = category(tree, id, config);
    let Some(node) = tree.node_mut(id) else {
        return 0;
    };
    let old = node.rect;

    let (next, child_sx, child_sy) = match category {
        ScaleCategory::Text | ScaleCategory::IconLike => {
            let mut next = old;
            next.x = round_unit(old.x * sx);
            next.y = round_unit(old.y * sy);
            (next, sx, sy)
        }
        ScaleCategory::Circle => {
            let naive = Rect::new(old.x * sx, old.y * sy, old.width * sx, old.height * sy);
            let diameter = round_unit(naive.width.max(naive.height));
            let center_x = naive.x + naive.width / 2.0;
            let center_y = naive.y + naive.height / 2.0;
            let next = Rect::new(
                round_unit(center_x - diameter / 2.0),
                round_unit(center_y - diameter / 2.0),
                diameter,
                diameter,
            );
            (next, ratio(diameter, old.width), ratio(diameter, old.height))
        }
        ScaleCategory::Proportional => {
            let next = Rect::new(
                round_unit(old.x * sx),
                round_unit(old.y * sy),
                scaled_extent(old.width, sx),
                scaled_extent(old.height, sy),
            );
            (next, sx, sy)
        }
    };

    let next = if frame.free {
        clamp_to_margins(next, old, frame, sx, sy)
    } else {
        Rect::new(old.x, old.y, next.width, next.height)
    };
    node.rect = next;

    if matches!(category, ScaleCategory::Circle | ScaleCategory::Proportional) {
        node.corner_radius = round_unit(node.corner_radius * sx.max(sy));
        if let Some(min) = node.min_size.as_mut() {
            min.width = scaled_extent(min.width, child_sx);
            min.height = scaled_extent(min.height, child_sy);
        }
        scale_own_spacing(node, child_sx, child_sy);
    }
    tracing::trace!(box_id = %id, ?category, from = ?old, to = ?next, "scaled box");

    let mut visited = 1;
    if matches!(category, ScaleCategory::Circle | ScaleCategory::Proportional) {
        visited += scale_children(tree, id, old.size(), child_sx, child_sy, config);
    }
    visited
}

/// Scale a box's own padding and auto-layout gaps.
pub(crate) fn scale_own_spacing(node: &mut BoxNode, sx: f64, sy: f64) {
    node.padding = node.padding.scaled(sx, sy);
    match &mut node.layout {
        LayoutMode::Free => {}
        LayoutMode::Stack(stack) => {
            let factor = match stack.direction {
                Axis::Horizontal => sx,
                Axis::Vertical => sy,
            };
            stack.gap = round_unit(stack.gap * factor);
        }
        LayoutMode::Grid(grid) => {
            grid.column_gap = round_unit(grid.column_gap * sx);
            grid.row_gap = round_unit(grid.row_gap * sy);
        }
    }
}

fn scaled_extent(extent: f64, factor: f64) -> f64 {
    let scaled = round_unit(extent * factor);
    if extent > 0.0 { scaled.max(1.0) } else { scaled }
}

pub(crate) fn ratio(new: f64, old: f64) -> f64 {
    if old > 0.0 { new / old } else { 1.0 }
}

/// Keep `next` between the scaled leading and trailing margins `old` had in
/// its parent. When the box no longer fits between them the leading margin
/// wins.
fn clamp_to_margins(mut next: Rect, old: Rect, frame: ParentFrame, sx: f64, sy: f64) -> Rect {
    for (axis, factor) in [(Axis::Horizontal, sx), (Axis::Vertical, sy)] {
        let leading = old.origin(axis);
        let trailing = frame.old.along(axis) - old.trailing(axis);
        let mut origin = next.origin(axis);
        if trailing >= 0.0 {
            let limit = frame.new.along(axis) - round_unit(trailing * factor) - next.extent(axis);
            origin = origin.min(limit);
        }
        if leading >= 0.0 {
            origin = origin.max(round_unit(leading * factor));
        }
        next.set_origin(axis, round_unit(origin));
    }
    next
}
