#![forbid(unsafe_code)]

//! Grid cell uniformity.
//!
//! Grid cells are usually copies of one design. After scaling, rounding can
//! leave corresponding descendants of different cells a unit or two apart.
//! [`normalize`] takes the first cell as the reference (an edit inside a
//! cell makes that cell the reference instead) and walks every other cell in
//! parallel with it; wherever a pair of same-kind boxes differs by
//! more than the grid tolerance, the other box is forced to the reference
//! size and its own subtree is rescaled to match.

use boxflow_core::Axis;

use crate::config::EngineConfig;
use crate::scale;
use crate::tree::{BoxId, BoxTree, LayoutMode, SizingMode};

/// Normalize the cells of the grid container `grid` against its first cell.
/// Returns how many boxes were forced to the reference size.
pub fn normalize(tree: &mut BoxTree, grid: BoxId, config: &EngineConfig) -> usize {
    let Some(&reference) = tree.children(grid).first() else {
        return 0;
    };
    normalize_from(tree, grid, reference, config)
}

/// Normalize the cells of `grid` against `reference`, one of its cells.
/// Returns how many boxes were forced to the reference size.
pub fn normalize_from(
    tree: &mut BoxTree,
    grid: BoxId,
    reference: BoxId,
    config: &EngineConfig,
) -> usize {
    let is_grid = tree
        .node(grid)
        .is_some_and(|node| matches!(node.layout, LayoutMode::Grid(_)));
    if !is_grid || tree.parent(reference) != Some(grid) {
        return 0;
    }
    let others: Vec<BoxId> = tree
        .children(grid)
        .iter()
        .copied()
        .filter(|&cell| cell != reference)
        .collect();
    let mut forced = 0;
    for cell in others {
        forced += match_children(tree, reference, cell, config);
    }
    if forced > 0 {
        tracing::debug!(grid = %grid, reference = %reference, forced, "normalized grid cells");
    }
    forced
}

/// Grids enclosing `id`, nearest first, each paired with its cell that
/// holds `id`.
#[must_use]
pub fn enclosing_grids(tree: &BoxTree, id: BoxId) -> Vec<(BoxId, BoxId)> {
    let mut cell = id;
    let mut grids = Vec::new();
    for ancestor in tree.ancestors(id) {
        if tree
            .node(ancestor)
            .is_some_and(|node| matches!(node.layout, LayoutMode::Grid(_)))
        {
            grids.push((ancestor, cell));
        }
        cell = ancestor;
    }
    grids
}

/// Normalize every grid container in the subtree at `root`, outermost first.
pub fn normalize_subtree(tree: &mut BoxTree, root: BoxId, config: &EngineConfig) -> usize {
    let grids: Vec<BoxId> = tree
        .pre_order(root)
        .into_iter()
        .filter(|&id| {
            tree.node(id)
                .is_some_and(|node| matches!(node.layout, LayoutMode::Grid(_)))
        })
        .collect();
    grids
        .into_iter()
        .map(|grid| normalize(tree, grid, config))
        .sum()
}

fn match_children(tree: &mut BoxTree, reference: BoxId, other: BoxId, config: &EngineConfig) -> usize {
    let pairs: Vec<(BoxId, BoxId)> = tree
        .children(reference)
        .iter()
        .copied()
        .zip(tree.children(other).iter().copied())
        .collect();
    let mut forced = 0;
    for (expected, actual) in pairs {
        let (Some(want), Some(have)) = (tree.node(expected), tree.node(actual)) else {
            continue;
        };
        if !want.kind.same_variant(&have.kind) {
            continue;
        }
        let want_rect = want.rect;
        let have_rect = have.rect;
        let differs = |axis: Axis| {
            (want_rect.extent(axis) - have_rect.extent(axis)).abs() > config.grid_tolerance
        };
        if Axis::BOTH.into_iter().any(differs) {
            force_size(tree, actual, want_rect.width, want_rect.height, config);
            forced += 1;
        } else {
            forced += match_children(tree, expected, actual, config);
        }
    }
    forced
}

fn force_size(tree: &mut BoxTree, id: BoxId, width: f64, height: f64, config: &EngineConfig) {
    let Some(node) = tree.node_mut(id) else {
        return;
    };
    let old = node.rect;
    for (axis, extent) in [(Axis::Horizontal, width), (Axis::Vertical, height)] {
        if node.rect.extent(axis) != extent {
            node.sizing.set(axis, SizingMode::Fixed);
            node.rect.set_extent(axis, extent);
        }
    }
    let sx = scale::ratio(width, old.width);
    let sy = scale::ratio(height, old.height);
    scale::scale_own_spacing(node, sx, sy);
    scale::scale_children(tree, id, old.size(), sx, sy, config);
}
