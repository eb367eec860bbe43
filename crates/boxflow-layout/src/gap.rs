#![forbid(unsafe_code)]

//! Vertical gaps between free-positioned siblings.
//!
//! Before a resize, [`snapshot_chain`] records, for every free-layout level
//! on the path from the target to its root, the gap between the box on that
//! path and each sibling below it. After propagation [`replay`] puts every
//! recorded sibling back at `anchor.bottom + gap`, innermost level first, and
//! lets each parent grow to keep containing its children.

use boxflow_core::{Axis, round_unit};
use serde::{Deserialize, Serialize};

use crate::flow;
use crate::tree::{BoxId, BoxTree, SizingMode};

/// Edges within this distance count as touching.
pub(crate) const EDGE_EPSILON: f64 = 0.5;

/// Most common non-negative vertical gap between consecutive children of
/// `parent`, ordered by `y`.
///
/// Gaps are rounded to whole units before counting; ties go to the gap seen
/// first. `exclude` is left out of the measurement.
#[must_use]
pub fn typical_gap(tree: &BoxTree, parent: BoxId, exclude: Option<BoxId>) -> Option<f64> {
    let mut rects: Vec<_> = tree
        .children(parent)
        .iter()
        .filter(|&&child| Some(child) != exclude)
        .filter_map(|&child| tree.rect(child))
        .collect();
    rects.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut counts: Vec<(f64, usize)> = Vec::new();
    for pair in rects.windows(2) {
        let gap = round_unit(pair[1].y - pair[0].bottom());
        if gap < 0.0 {
            continue;
        }
        match counts.iter_mut().find(|(value, _)| *value == gap) {
            Some((_, count)) => *count += 1,
            None => counts.push((gap, 1)),
        }
    }
    let mut best: Option<(f64, usize)> = None;
    for (gap, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((gap, count));
        }
    }
    best.map(|(gap, _)| gap)
}

/// Recorded gaps below `anchor` inside one free-layout `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapSnapshot {
    pub parent: BoxId,
    pub anchor: BoxId,
    /// `(sibling, gap from anchor bottom to sibling top)`.
    pub below: Vec<(BoxId, f64)>,
}

/// Gap snapshots for every free-layout ancestor level of `target`, innermost
/// first.
#[must_use]
pub fn snapshot_chain(tree: &BoxTree, target: BoxId) -> Vec<GapSnapshot> {
    let mut snapshots = Vec::new();
    let mut anchor = target;
    while let Some(parent) = tree.parent(anchor) {
        let is_free = tree.node(parent).is_some_and(|node| node.layout.is_free());
        if is_free && let Some(anchor_rect) = tree.rect(anchor) {
            let below = tree
                .children(parent)
                .iter()
                .filter(|&&sibling| sibling != anchor)
                .filter_map(|&sibling| tree.rect(sibling).map(|rect| (sibling, rect)))
                .filter(|(_, rect)| rect.y >= anchor_rect.bottom() - EDGE_EPSILON)
                .map(|(sibling, rect)| (sibling, rect.y - anchor_rect.bottom()))
                .collect();
            snapshots.push(GapSnapshot {
                parent,
                anchor,
                below,
            });
        }
        anchor = parent;
    }
    snapshots
}

/// Restore recorded gaps. Returns how many sibling moves were applied.
///
/// Runs at most `passes` rounds over all levels and stops early once a round
/// moves nothing.
pub fn replay(tree: &mut BoxTree, snapshots: &[GapSnapshot], passes: u32) -> usize {
    let mut moves = 0;
    for pass in 0..passes {
        let mut moved_this_pass = 0;
        for snapshot in snapshots {
            moved_this_pass += replay_level(tree, snapshot);
        }
        tracing::trace!(pass, moved = moved_this_pass, "gap replay pass");
        moves += moved_this_pass;
        if moved_this_pass == 0 {
            break;
        }
    }
    moves
}

fn replay_level(tree: &mut BoxTree, snapshot: &GapSnapshot) -> usize {
    let Some(anchor_bottom) = tree.rect(snapshot.anchor).map(|rect| rect.bottom()) else {
        return 0;
    };
    let mut moved = 0;
    for &(sibling, gap) in &snapshot.below {
        let Some(node) = tree.node_mut(sibling) else {
            continue;
        };
        let desired = round_unit(anchor_bottom + gap);
        if (node.rect.y - desired).abs() >= EDGE_EPSILON {
            node.rect.y = desired;
            moved += 1;
        }
    }
    if moved > 0 {
        grow_to_contain(tree, snapshot.parent);
    }
    moved
}

/// Grow a free container so it still contains its children. Hug axes track
/// the content exactly; fill axes belong to the grandparent.
pub(crate) fn grow_to_contain(tree: &mut BoxTree, parent: BoxId) {
    for axis in Axis::BOTH {
        let Some(needed) = flow::hug_extent(tree, parent, axis) else {
            return;
        };
        let Some(node) = tree.node_mut(parent) else {
            return;
        };
        let current = node.rect.extent(axis);
        let next = match node.sizing.along(axis) {
            SizingMode::Hug => round_unit(needed.max(node.min_extent(axis))),
            SizingMode::Fixed if needed > current => round_unit(needed),
            _ => current,
        };
        node.rect.set_extent(axis, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BoxNode;
    use boxflow_core::Rect;

    fn column(ys: &[(f64, f64)]) -> (BoxTree, BoxId, Vec<BoxId>) {
        let mut tree = BoxTree::new();
        let root = tree.add_root(BoxNode::container(Rect::from_size(400.0, 1000.0)));
        let ids = ys
            .iter()
            .map(|&(y, h)| {
                tree.push_child(root, BoxNode::container(Rect::new(0.0, y, 100.0, h)))
                    .expect("child")
            })
            .collect();
        (tree, root, ids)
    }

    #[test]
    fn typical_gap_is_the_mode() {
        let (tree, root, _) = column(&[(0.0, 100.0), (120.0, 50.0), (190.0, 10.0), (230.0, 10.0)]);
        // gaps: 20, 20, 30
        assert_eq!(typical_gap(&tree, root, None), Some(20.0));
    }

    #[test]
    fn typical_gap_ties_go_to_first_seen() {
        let (tree, root, _) = column(&[(0.0, 10.0), (40.0, 10.0), (60.0, 10.0)]);
        // gaps: 30, 10
        assert_eq!(typical_gap(&tree, root, None), Some(30.0));
    }

    #[test]
    fn typical_gap_skips_overlaps_and_exclusions() {
        let (tree, root, ids) = column(&[(0.0, 100.0), (50.0, 100.0)]);
        assert_eq!(typical_gap(&tree, root, None), None);
        assert_eq!(typical_gap(&tree, root, Some(ids[0])), None);
        let (tree, root, _) = column(&[(0.0, 10.0)]);
        assert_eq!(typical_gap(&tree, root, None), None);
    }

    #[test]
    fn snapshot_records_only_siblings_below() {
        let (tree, root, ids) = column(&[(0.0, 100.0), (120.0, 50.0), (0.0, 20.0)]);
        let chain = snapshot_chain(&tree, ids[1]);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].parent, root);
        assert!(chain[0].below.is_empty());

        let chain = snapshot_chain(&tree, ids[0]);
        assert_eq!(chain[0].below, vec![(ids[1], 20.0)]);
    }

    #[test]
    fn replay_restores_gap_and_grows_parent() {
        let (mut tree, root, ids) = column(&[(0.0, 100.0), (120.0, 50.0)]);
        tree.node_mut(root).expect("root").rect.height = 170.0;
        let chain = snapshot_chain(&tree, ids[0]);
        tree.node_mut(ids[0]).expect("anchor").rect.height = 200.0;

        let moved = replay(&mut tree, &chain, 2);
        assert_eq!(moved, 1);
        assert_eq!(tree.rect(ids[1]).map(|r| r.y), Some(220.0));
        assert_eq!(tree.rect(root).map(|r| r.height), Some(270.0));
        assert_eq!(replay(&mut tree, &chain, 2), 0);
    }
}
