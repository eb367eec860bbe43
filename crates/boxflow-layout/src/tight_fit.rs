#![forbid(unsafe_code)]

//! Shrink hugging auto-layout containers onto their content.
//!
//! Proportional scaling can leave a hugging stack larger than what its
//! children now need. [`tight_fit`] walks a subtree bottom-up and shrinks
//! every such axis to the content extent. A minimum size that would block
//! the shrink is lifted and then re-pinned at the new extent.
//!
//! Only [`SizingMode::Hug`] axes are touched, and only downward.

use boxflow_core::{Axis, round_unit};

use crate::flow;
use crate::tree::{BoxId, BoxTree, SizingMode};

/// Shrink hugging stack and grid containers in the subtree at `root`.
/// Returns the number of axes that shrank.
pub fn tight_fit(tree: &mut BoxTree, root: BoxId) -> usize {
    let mut shrunk = 0;
    for id in tree.post_order(root) {
        let Some(node) = tree.node(id) else {
            continue;
        };
        if !node.kind.is_container() || node.layout.is_free() {
            continue;
        }
        let mut targets = Vec::with_capacity(2);
        for axis in Axis::BOTH {
            if node.sizing.along(axis) != SizingMode::Hug {
                continue;
            }
            let Some(content) = flow::hug_extent(tree, id, axis) else {
                continue;
            };
            let content = round_unit(content);
            if content < node.rect.extent(axis) {
                targets.push((axis, content));
            }
        }
        let Some(node) = tree.node_mut(id) else {
            continue;
        };
        for (axis, extent) in targets {
            node.rect.set_extent(axis, extent);
            if let Some(min) = node.min_size.as_mut()
                && min.along(axis) > extent
            {
                min.set_along(axis, extent);
            }
            shrunk += 1;
            tracing::trace!(box_id = %id, ?axis, extent, "tight fit");
        }
    }
    shrunk
}
