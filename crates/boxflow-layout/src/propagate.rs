#![forbid(unsafe_code)]

//! Carry a size change up the ancestor chain.
//!
//! [`propagate`] starts from a box whose bounds changed from `before` to its
//! current bounds and visits each ancestor in turn:
//!
//! - **Stack or grid parent**: hug axes re-measure, a fixed axis grows when
//!   the content overflows it on an axis that grew, then children are placed.
//! - **Free parent**: siblings at or below the child's old bottom edge move by
//!   the bottom-edge delta; siblings at or right of its old right edge that
//!   share a row with it move by the right-edge delta. The parent grows to
//!   contain its children, or shrinks by at most the child's shrink while
//!   still containing them.
//!
//! The walk stops at a root or at the first ancestor whose size did not
//! change.

use boxflow_core::{Axis, Rect, round_unit};

use crate::config::EngineConfig;
use crate::flow;
use crate::gap::EDGE_EPSILON;
use crate::tree::{BoxId, BoxTree, LayoutMode, SizingMode};

/// Propagate the change of `changed` (previously `before`) to its
/// ancestors. Returns the ancestors whose size changed, nearest first.
pub fn propagate(
    tree: &mut BoxTree,
    changed: BoxId,
    before: Rect,
    config: &EngineConfig,
) -> Vec<BoxId> {
    let mut resized = Vec::new();
    let mut child = changed;
    let mut child_before = before;
    while let Some(parent) = tree.parent(child) {
        let Some(parent_before) = tree.rect(parent) else {
            break;
        };
        let Some(child_now) = tree.rect(child) else {
            break;
        };
        let layout = tree.node(parent).map(|node| node.layout);
        match layout {
            Some(LayoutMode::Free) => free_step(tree, parent, child, child_before, child_now),
            Some(LayoutMode::Stack(_) | LayoutMode::Grid(_)) => {
                flow_step(tree, parent, child_before, child_now, config);
            }
            None => break,
        }
        let Some(parent_now) = tree.rect(parent) else {
            break;
        };
        tracing::trace!(
            parent = %parent,
            dw = parent_now.width - parent_before.width,
            dh = parent_now.height - parent_before.height,
            "propagated to ancestor"
        );
        if parent_now.size() == parent_before.size() {
            break;
        }
        resized.push(parent);
        child = parent;
        child_before = parent_before;
    }
    resized
}

/// Re-measure and re-place a stack or grid container after one of its
/// children changed from `before` to `now`.
pub(crate) fn flow_step(
    tree: &mut BoxTree,
    parent: BoxId,
    before: Rect,
    now: Rect,
    config: &EngineConfig,
) {
    flow::fit_hug(tree, parent);
    for axis in Axis::BOTH {
        if now.extent(axis) <= before.extent(axis) {
            continue;
        }
        let Some(needed) = flow::hug_extent(tree, parent, axis) else {
            continue;
        };
        if let Some(node) = tree.node_mut(parent)
            && node.sizing.along(axis) == SizingMode::Fixed
            && needed > node.rect.extent(axis)
        {
            node.rect.set_extent(axis, round_unit(needed));
        }
    }
    flow::place_subtree(tree, parent, config);
}

fn free_step(tree: &mut BoxTree, parent: BoxId, child: BoxId, before: Rect, now: Rect) {
    let dh = now.bottom() - before.bottom();
    let dw = now.right() - before.right();
    let siblings: Vec<BoxId> = tree
        .children(parent)
        .iter()
        .copied()
        .filter(|&sibling| sibling != child)
        .collect();

    for sibling in siblings {
        let Some(node) = tree.node_mut(sibling) else {
            continue;
        };
        let rect = node.rect;
        if dh != 0.0 && rect.y >= before.bottom() - EDGE_EPSILON {
            node.rect.y = round_unit(rect.y + dh);
        }
        if dw != 0.0
            && rect.x >= before.right() - EDGE_EPSILON
            && rect.overlaps_on(&before, Axis::Vertical)
        {
            node.rect.x = round_unit(rect.x + dw);
        }
    }

    for (axis, delta) in [(Axis::Horizontal, dw), (Axis::Vertical, dh)] {
        let Some(needed) = flow::hug_extent(tree, parent, axis) else {
            continue;
        };
        let Some(node) = tree.node_mut(parent) else {
            return;
        };
        let current = node.rect.extent(axis);
        let next = match node.sizing.along(axis) {
            SizingMode::Hug => needed.max(node.min_extent(axis)),
            SizingMode::Fill => current,
            SizingMode::Fixed if needed > current => needed,
            SizingMode::Fixed if delta < 0.0 => needed.max(current + delta).min(current),
            SizingMode::Fixed => current,
        };
        node.rect.set_extent(axis, round_unit(next));
    }
}
