#![forbid(unsafe_code)]

//! Auto-layout flow.
//!
//! Stack and grid containers own their children's positions. This module
//! measures content ([`hug_extent`]), shrink-wraps [`SizingMode::Hug`] axes
//! ([`fit_hug`]), and places children ([`reflow`]). [`settle`] runs both over
//! a subtree: hug bottom-up, then placement top-down.
//!
//! Free containers are measured but never rearranged here.

use boxflow_core::{Axis, round_unit};

use crate::config::EngineConfig;
use crate::tree::{
    BoxId, BoxTree, CrossAlign, GridLayout, LayoutMode, PrimaryAlign, SizingMode, StackLayout,
};

/// Extent along `axis` that exactly fits the content of `id`, padding
/// included.
///
/// Free containers without children have no content extent.
#[must_use]
pub fn hug_extent(tree: &BoxTree, id: BoxId, axis: Axis) -> Option<f64> {
    let node = tree.node(id)?;
    let children = node.children();
    let padding = node.padding;
    match node.layout {
        LayoutMode::Free => children
            .iter()
            .filter_map(|&child| tree.rect(child))
            .map(|rect| rect.trailing(axis))
            .reduce(f64::max)
            .map(|furthest| furthest + padding.trailing(axis)),
        LayoutMode::Stack(stack) => {
            let extents = children
                .iter()
                .filter_map(|&child| tree.rect(child))
                .map(|rect| rect.extent(axis));
            let content = if axis == stack.direction {
                let (sum, count) = extents.fold((0.0, 0usize), |(sum, n), e| (sum + e, n + 1));
                sum + stack.gap * count.saturating_sub(1) as f64
            } else {
                extents.fold(0.0, f64::max)
            };
            Some(content + padding.sum(axis))
        }
        LayoutMode::Grid(grid) => {
            let (columns, rows) = grid_tracks(tree, &grid, children);
            let tracks = match axis {
                Axis::Horizontal => columns,
                Axis::Vertical => rows,
            };
            let gaps = grid.gap_along(axis) * tracks.len().saturating_sub(1) as f64;
            Some(tracks.iter().sum::<f64>() + gaps + padding.sum(axis))
        }
    }
}

/// Column widths and row heights of a grid: the largest cell per track.
#[must_use]
pub fn grid_tracks(tree: &BoxTree, grid: &GridLayout, cells: &[BoxId]) -> (Vec<f64>, Vec<f64>) {
    let columns = grid.columns.max(1);
    let used_columns = cells.len().min(columns);
    let rows = cells.len().div_ceil(columns);
    let mut widths = vec![0.0_f64; used_columns];
    let mut heights = vec![0.0_f64; rows];
    for (index, rect) in cells
        .iter()
        .enumerate()
        .filter_map(|(index, &cell)| tree.rect(cell).map(|rect| (index, rect)))
    {
        let (row, column) = (index / columns, index % columns);
        widths[column] = widths[column].max(rect.width);
        heights[row] = heights[row].max(rect.height);
    }
    (widths, heights)
}

/// Shrink-wrap the hug axes of `id` to its content. Returns whether the box
/// changed size.
///
/// Only containers hug; the box never goes below its minimum size.
pub fn fit_hug(tree: &mut BoxTree, id: BoxId) -> bool {
    let Some(node) = tree.node(id) else {
        return false;
    };
    if !node.kind.is_container() {
        return false;
    }
    let mut targets = Vec::with_capacity(2);
    for axis in Axis::BOTH {
        if node.sizing.along(axis) != SizingMode::Hug {
            continue;
        }
        if let Some(needed) = hug_extent(tree, id, axis) {
            targets.push((axis, round_unit(needed.max(node.min_extent(axis)))));
        }
    }
    let Some(node) = tree.node_mut(id) else {
        return false;
    };
    let mut changed = false;
    for (axis, extent) in targets {
        if node.rect.extent(axis) != extent {
            node.rect.set_extent(axis, extent);
            changed = true;
        }
    }
    changed
}

/// Place the children of a stack or grid container. Free containers are
/// left alone.
pub fn reflow(tree: &mut BoxTree, id: BoxId, config: &EngineConfig) {
    let Some(layout) = tree.node(id).map(|node| node.layout) else {
        return;
    };
    match layout {
        LayoutMode::Free => {}
        LayoutMode::Stack(stack) => reflow_stack(tree, id, stack, config),
        LayoutMode::Grid(grid) => reflow_grid(tree, id, grid),
    }
}

fn reflow_stack(tree: &mut BoxTree, id: BoxId, stack: StackLayout, config: &EngineConfig) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let children = node.children().to_vec();
    if children.is_empty() {
        return;
    }
    let primary = stack.direction;
    let cross = primary.cross();
    let padding = node.padding;
    let inner_primary = (node.rect.extent(primary) - padding.sum(primary)).max(0.0);
    let inner_cross = (node.rect.extent(cross) - padding.sum(cross)).max(0.0);
    let gaps = stack.gap * (children.len() - 1) as f64;

    let fills_along = |tree: &BoxTree, child: BoxId, axis: Axis| {
        tree.node(child).is_some_and(|node| {
            node.sizing.along(axis) == SizingMode::Fill
                && !node.is_circular(config.circle_tolerance)
        })
    };

    let fill_children: Vec<BoxId> = children
        .iter()
        .copied()
        .filter(|&child| fills_along(tree, child, primary))
        .collect();
    if !fill_children.is_empty() {
        let fixed: f64 = children
            .iter()
            .filter(|child| !fill_children.contains(child))
            .filter_map(|&child| tree.rect(child))
            .map(|rect| rect.extent(primary))
            .sum();
        let leftover = (inner_primary - fixed - gaps).max(0.0);
        let share = (leftover / fill_children.len() as f64).floor();
        let mut remaining = leftover;
        for (index, &child) in fill_children.iter().enumerate() {
            // Last fill child absorbs the rounding remainder.
            let extent = if index + 1 == fill_children.len() {
                round_unit(remaining)
            } else {
                share
            };
            remaining -= share;
            if let Some(node) = tree.node_mut(child) {
                let extent = extent.max(node.min_extent(primary));
                node.rect.set_extent(primary, extent);
            }
        }
    }

    for &child in &children {
        if fills_along(tree, child, cross)
            && let Some(node) = tree.node_mut(child)
        {
            let extent = round_unit(inner_cross.max(node.min_extent(cross)));
            node.rect.set_extent(cross, extent);
        }
    }

    let extents: Vec<(f64, f64)> = children
        .iter()
        .map(|&child| {
            tree.rect(child)
                .map_or((0.0, 0.0), |rect| (rect.extent(primary), rect.extent(cross)))
        })
        .collect();
    let total = extents.iter().map(|(p, _)| p).sum::<f64>() + gaps;
    let free = (inner_primary - total).max(0.0);
    let (lead, spacing) = match stack.primary_align {
        PrimaryAlign::Start => (0.0, stack.gap),
        PrimaryAlign::Center => (free / 2.0, stack.gap),
        PrimaryAlign::End => (free, stack.gap),
        PrimaryAlign::SpaceBetween if children.len() > 1 => {
            (0.0, stack.gap + free / (children.len() - 1) as f64)
        }
        PrimaryAlign::SpaceBetween => (0.0, stack.gap),
    };

    let mut cursor = padding.leading(primary) + lead;
    for (&child, &(along, across)) in children.iter().zip(&extents) {
        let slack = (inner_cross - across).max(0.0);
        let offset = match stack.cross_align {
            CrossAlign::Start => 0.0,
            CrossAlign::Center => slack / 2.0,
            CrossAlign::End => slack,
        };
        if let Some(node) = tree.node_mut(child) {
            node.rect.set_origin(primary, round_unit(cursor));
            node.rect
                .set_origin(cross, round_unit(padding.leading(cross) + offset));
        }
        cursor += along + spacing;
    }
}

fn reflow_grid(tree: &mut BoxTree, id: BoxId, grid: GridLayout) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let cells = node.children().to_vec();
    let padding = node.padding;
    let columns = grid.columns.max(1);
    let (widths, heights) = grid_tracks(tree, &grid, &cells);

    let offsets = |tracks: &[f64], gap: f64, start: f64| -> Vec<f64> {
        let mut cursor = start;
        tracks
            .iter()
            .map(|extent| {
                let at = cursor;
                cursor += extent + gap;
                round_unit(at)
            })
            .collect()
    };
    let xs = offsets(&widths, grid.column_gap, padding.left);
    let ys = offsets(&heights, grid.row_gap, padding.top);

    for (index, &cell) in cells.iter().enumerate() {
        let (row, column) = (index / columns, index % columns);
        if let Some(node) = tree.node_mut(cell) {
            node.rect.x = xs[column];
            node.rect.y = ys[row];
        }
    }
}

/// Hug bottom-up, then place top-down, over the subtree at `id`.
pub fn settle(tree: &mut BoxTree, id: BoxId, config: &EngineConfig) {
    for node in tree.post_order(id) {
        fit_hug(tree, node);
    }
    place_subtree(tree, id, config);
}

/// Top-down placement over the subtree at `id` without re-measuring.
pub fn place_subtree(tree: &mut BoxTree, id: BoxId, config: &EngineConfig) {
    for node in tree.pre_order(id) {
        reflow(tree, node, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BoxNode, Sizing};
    use boxflow_core::Rect;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn stack_with(stack: StackLayout, size: (f64, f64), kids: &[(f64, f64)]) -> (BoxTree, BoxId, Vec<BoxId>) {
        let mut tree = BoxTree::new();
        let root = tree.add_root(
            BoxNode::container(Rect::from_size(size.0, size.1))
                .with_stack(stack)
                .with_padding(10.0),
        );
        let ids = kids
            .iter()
            .map(|&(w, h)| {
                tree.push_child(root, BoxNode::container(Rect::from_size(w, h)))
                    .expect("child")
            })
            .collect();
        (tree, root, ids)
    }

    #[test]
    fn vertical_stack_places_children_with_gap() {
        let (mut tree, root, ids) =
            stack_with(StackLayout::vertical(8.0), (200.0, 300.0), &[(50.0, 20.0), (60.0, 30.0)]);
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(ids[0]), Some(Rect::new(10.0, 10.0, 50.0, 20.0)));
        assert_eq!(tree.rect(ids[1]), Some(Rect::new(10.0, 38.0, 60.0, 30.0)));
    }

    #[test]
    fn hug_extent_of_stack_includes_gaps_and_padding() {
        let (tree, root, _) =
            stack_with(StackLayout::vertical(8.0), (200.0, 300.0), &[(50.0, 20.0), (60.0, 30.0)]);
        assert_eq!(hug_extent(&tree, root, Axis::Vertical), Some(78.0));
        assert_eq!(hug_extent(&tree, root, Axis::Horizontal), Some(80.0));
    }

    #[test]
    fn fit_hug_respects_min_size() {
        let (mut tree, root, _) =
            stack_with(StackLayout::vertical(8.0), (200.0, 300.0), &[(50.0, 20.0)]);
        {
            let node = tree.node_mut(root).expect("root");
            node.sizing = Sizing::HUG;
            node.min_size = Some(boxflow_core::Size::new(0.0, 100.0));
        }
        assert!(fit_hug(&mut tree, root));
        assert_eq!(tree.rect(root), Some(Rect::from_size(70.0, 100.0)));
        assert!(!fit_hug(&mut tree, root));
    }

    #[test]
    fn fill_children_share_leftover() {
        let (mut tree, root, ids) = stack_with(
            StackLayout::horizontal(10.0),
            (240.0, 50.0),
            &[(40.0, 20.0), (1.0, 20.0), (1.0, 20.0)],
        );
        for &id in &ids[1..] {
            tree.node_mut(id).expect("child").sizing =
                Sizing::new(SizingMode::Fill, SizingMode::Fill);
        }
        reflow(&mut tree, root, &config());
        // inner 220, fixed 40, gaps 20 -> 160 split two ways.
        assert_eq!(tree.rect(ids[1]), Some(Rect::new(60.0, 10.0, 80.0, 30.0)));
        assert_eq!(tree.rect(ids[2]), Some(Rect::new(150.0, 10.0, 80.0, 30.0)));
    }

    #[test]
    fn fill_never_stretches_circles() {
        let mut tree = BoxTree::new();
        let root = tree.add_root(
            BoxNode::container(Rect::from_size(300.0, 100.0)).with_stack(StackLayout::horizontal(0.0)),
        );
        let avatar = tree
            .push_child(
                root,
                BoxNode::image(Rect::from_size(40.0, 40.0)).with_sizing(Sizing::both(SizingMode::Fill)),
            )
            .expect("avatar");
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(avatar).map(|r| r.size()), Some(boxflow_core::Size::new(40.0, 40.0)));
    }

    #[test]
    fn alignment_variants() {
        let (mut tree, root, ids) =
            stack_with(StackLayout::horizontal(0.0), (120.0, 60.0), &[(20.0, 20.0), (20.0, 20.0)]);
        let set = |tree: &mut BoxTree, stack: StackLayout| {
            tree.node_mut(root).expect("root").layout = LayoutMode::Stack(stack);
        };

        set(&mut tree, StackLayout::horizontal(0.0).primary_align(PrimaryAlign::End));
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(ids[0]).map(|r| r.x), Some(70.0));

        set(
            &mut tree,
            StackLayout::horizontal(0.0)
                .primary_align(PrimaryAlign::SpaceBetween)
                .cross_align(CrossAlign::Center),
        );
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(ids[0]).map(|r| (r.x, r.y)), Some((10.0, 20.0)));
        assert_eq!(tree.rect(ids[1]).map(|r| r.x), Some(90.0));

        set(&mut tree, StackLayout::horizontal(0.0).primary_align(PrimaryAlign::Center));
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(ids[0]).map(|r| r.x), Some(40.0));
    }

    #[test]
    fn grid_places_row_major_on_tracks() {
        let mut tree = BoxTree::new();
        let root = tree.add_root(
            BoxNode::container(Rect::from_size(500.0, 500.0))
                .with_grid(GridLayout::new(2, 10.0, 20.0))
                .with_padding(5.0),
        );
        let cells: Vec<BoxId> = [(100.0, 50.0), (80.0, 70.0), (90.0, 40.0)]
            .iter()
            .map(|&(w, h)| {
                tree.push_child(root, BoxNode::container(Rect::from_size(w, h)))
                    .expect("cell")
            })
            .collect();
        reflow(&mut tree, root, &config());
        assert_eq!(tree.rect(cells[1]).map(|r| (r.x, r.y)), Some((115.0, 5.0)));
        assert_eq!(tree.rect(cells[2]).map(|r| (r.x, r.y)), Some((5.0, 95.0)));
        assert_eq!(hug_extent(&tree, root, Axis::Horizontal), Some(200.0));
        assert_eq!(hug_extent(&tree, root, Axis::Vertical), Some(140.0));
    }

    #[test]
    fn settle_hugs_nested_stacks() {
        let mut tree = BoxTree::new();
        let outer = tree.add_root(
            BoxNode::container(Rect::from_size(10.0, 10.0))
                .with_stack(StackLayout::vertical(4.0))
                .with_sizing(Sizing::HUG),
        );
        let inner = tree
            .push_child(
                outer,
                BoxNode::container(Rect::from_size(10.0, 10.0))
                    .with_stack(StackLayout::horizontal(2.0))
                    .with_padding(3.0)
                    .with_sizing(Sizing::HUG),
            )
            .expect("inner");
        for _ in 0..2 {
            tree.push_child(inner, BoxNode::image(Rect::from_size(20.0, 10.0)))
                .expect("leaf");
        }
        tree.push_child(outer, BoxNode::image(Rect::from_size(30.0, 30.0)))
            .expect("leaf");
        settle(&mut tree, outer, &config());
        assert_eq!(tree.rect(inner), Some(Rect::new(0.0, 0.0, 48.0, 16.0)));
        assert_eq!(tree.rect(outer), Some(Rect::new(0.0, 0.0, 48.0, 50.0)));
    }

    #[test]
    fn free_container_hugs_furthest_child() {
        let mut tree = BoxTree::new();
        let root = tree.add_root(
            BoxNode::container(Rect::from_size(10.0, 10.0))
                .with_padding(6.0)
                .with_sizing(Sizing::new(SizingMode::Fixed, SizingMode::Hug)),
        );
        tree.push_child(root, BoxNode::image(Rect::new(6.0, 40.0, 20.0, 20.0)))
            .expect("leaf");
        settle(&mut tree, root, &config());
        assert_eq!(tree.rect(root), Some(Rect::from_size(10.0, 66.0)));
    }
}
