#![forbid(unsafe_code)]

//! Editing operations: resize, clone, delete, and contrast remediation.
//!
//! [`Engine`] validates each request completely before touching the tree, so
//! a rejected operation leaves the tree bit-for-bit unchanged (its
//! [`BoxTree::state_hash`] is stable). Successful operations append to the
//! engine's [`ChangeLog`].
//!
//! # Resize pipeline
//!
//! 1. Validate the target and requested extents.
//! 2. Snapshot gaps below the target on every free-layout level above it.
//! 3. Pin the requested axes to [`SizingMode::Fixed`] and apply the extents.
//! 4. Scale the subtree proportionally ([`crate::scale`]).
//! 5. Normalize grid cells inside the subtree ([`crate::grid`]).
//! 6. Shrink oversized hugging stacks ([`crate::tight_fit`]).
//! 7. Settle auto-layout inside the subtree ([`crate::flow`]).
//! 8. Propagate the size change to ancestors ([`crate::propagate`]).
//! 9. Normalize every grid enclosing the target against the cell that holds
//!    it, re-settling and propagating each grid that changed.
//! 10. Replay the gap snapshots ([`crate::gap`]).

use boxflow_core::{Axis, Rect, round_unit};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::contrast::{self, ContrastContext};
use crate::error::{EngineError, Result};
use crate::flow;
use crate::gap::{self, EDGE_EPSILON};
use crate::grid;
use crate::journal::{Change, ChangeLog};
use crate::propagate;
use crate::scale;
use crate::tight_fit;
use crate::tree::{BoxId, BoxKind, BoxTree, LayoutMode, SizingMode};

/// A serializable editing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BoxOperation {
    /// Set the width and/or height of a box.
    Resize {
        target: BoxId,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    /// Deep-copy `source` into `parent`.
    Clone {
        source: BoxId,
        parent: BoxId,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Remove a box and its subtree.
    Delete { target: BoxId },
    /// Fix low-contrast foregrounds under `root`.
    RemediateContrast { root: BoxId },
}

impl BoxOperation {
    /// Operation family.
    #[must_use]
    pub const fn kind(&self) -> BoxOperationKind {
        match self {
            Self::Resize { .. } => BoxOperationKind::Resize,
            Self::Clone { .. } => BoxOperationKind::Clone,
            Self::Delete { .. } => BoxOperationKind::Delete,
            Self::RemediateContrast { .. } => BoxOperationKind::RemediateContrast,
        }
    }
}

/// Stable operation discriminator used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxOperationKind {
    Resize,
    Clone,
    Delete,
    RemediateContrast,
}

/// Result of [`Engine::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub kind: BoxOperationKind,
    /// The box created by a clone.
    pub created: Option<BoxId>,
    /// Boxes mentioned in the changes this operation journaled, in order.
    pub touched: Vec<BoxId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// The geometry propagation engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    changes: ChangeLog,
}

impl Engine {
    /// Create an engine, rejecting unusable configs.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            changes: ChangeLog::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Changes journaled since the last [`Engine::take_changes`].
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        self.changes.entries()
    }

    pub fn take_changes(&mut self) -> Vec<Change> {
        self.changes.take()
    }

    /// Hug and place every auto-layout container under `root`.
    ///
    /// Use this once on freshly built trees so that stored geometry agrees
    /// with the layout rules before the first edit.
    pub fn settle(&self, tree: &mut BoxTree, root: BoxId) -> Result<()> {
        tree.get(root)?;
        flow::settle(tree, root, &self.config);
        Ok(())
    }

    /// Apply a serialized operation and report what it touched.
    pub fn apply(&mut self, tree: &mut BoxTree, operation: BoxOperation) -> Result<OperationOutcome> {
        let kind = operation.kind();
        let before_hash = tree.state_hash();
        let journaled = self.changes.len();
        let created = self.dispatch(tree, operation).inspect_err(|err| {
            tracing::warn!(op = ?kind, error = %err, "operation rejected");
        })?;
        let mut touched = Vec::new();
        for change in &self.changes.entries()[journaled..] {
            if !touched.contains(&change.id()) {
                touched.push(change.id());
            }
        }
        Ok(OperationOutcome {
            kind,
            created,
            touched,
            before_hash,
            after_hash: tree.state_hash(),
        })
    }

    fn dispatch(&mut self, tree: &mut BoxTree, operation: BoxOperation) -> Result<Option<BoxId>> {
        Ok(match operation {
            BoxOperation::Resize {
                target,
                width,
                height,
            } => {
                self.resize(tree, target, width, height)?;
                None
            }
            BoxOperation::Clone {
                source,
                parent,
                index,
            } => Some(self.clone_box(tree, source, parent, index)?),
            BoxOperation::Delete { target } => {
                self.delete(tree, target)?;
                None
            }
            BoxOperation::RemediateContrast { root } => {
                self.remediate_contrast(tree, root)?;
                None
            }
        })
    }

    /// Resize `id` to the given extents; `None` leaves an axis as it is.
    ///
    /// The requested axes end up exactly at the requested (whole-unit) size
    /// and are pinned to [`SizingMode::Fixed`]. A circular vector or image
    /// resized on one axis follows on the other.
    pub fn resize(
        &mut self,
        tree: &mut BoxTree,
        id: BoxId,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<()> {
        let _span = tracing::debug_span!(
            "boxflow.resize",
            box_id = %id,
            width = ?width,
            height = ?height
        )
        .entered();

        let targets = self.resize_targets(tree, id, width, height)?;
        let scope = tree.root_of(id);
        let before = tree.subtree_rects(scope);
        let snapshots = gap::snapshot_chain(tree, id);

        let node = tree.get_mut(id)?;
        let old = node.rect;
        let label = node.label();
        for &(axis, extent) in &targets {
            let mode = node.sizing.along(axis);
            if mode != SizingMode::Fixed {
                node.sizing.set(axis, SizingMode::Fixed);
                self.changes.push(Change::SizingChanged {
                    id,
                    label: label.clone(),
                    axis,
                    from: mode,
                    to: SizingMode::Fixed,
                });
            }
            node.rect.set_extent(axis, extent);
            if let Some(min) = node.min_size.as_mut()
                && min.along(axis) > extent
            {
                min.set_along(axis, extent);
            }
        }
        let sx = scale::ratio(node.rect.width, old.width);
        let sy = scale::ratio(node.rect.height, old.height);
        scale::scale_own_spacing(node, sx, sy);

        let scaled = scale::scale_children(tree, id, old.size(), sx, sy, &self.config);
        let mut forced = grid::normalize_subtree(tree, id, &self.config);
        let shrunk = tight_fit::tight_fit(tree, id);
        flow::settle(tree, id, &self.config);
        let ancestors = propagate::propagate(tree, id, old, &self.config);
        forced += self.normalize_enclosing_grids(tree, id);
        let replayed = gap::replay(tree, &snapshots, self.config.gap_replay_passes);

        tracing::debug!(
            scaled,
            forced,
            shrunk,
            ancestors = ancestors.len(),
            replayed,
            "resize complete"
        );
        self.changes.record_geometry(tree, &before);
        Ok(())
    }

    /// Make every grid around `id` uniform with the cell holding `id`, then
    /// settle each changed grid and carry its new size upward.
    fn normalize_enclosing_grids(&self, tree: &mut BoxTree, id: BoxId) -> usize {
        let mut forced = 0;
        for (container, cell) in grid::enclosing_grids(tree, id) {
            let count = grid::normalize_from(tree, container, cell, &self.config);
            if count == 0 {
                continue;
            }
            let Some(before) = tree.rect(container) else {
                continue;
            };
            flow::settle(tree, container, &self.config);
            propagate::propagate(tree, container, before, &self.config);
            forced += count;
        }
        forced
    }

    fn resize_targets(
        &self,
        tree: &BoxTree,
        id: BoxId,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Vec<(Axis, f64)>> {
        let node = tree.get(id)?;
        if width.is_none() && height.is_none() {
            return Err(EngineError::invalid("resize needs a width, a height, or both"));
        }
        let mut targets = Vec::with_capacity(2);
        for (axis, value) in [(Axis::Horizontal, width), (Axis::Vertical, height)] {
            let Some(value) = value else {
                continue;
            };
            let name = axis_name(axis);
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
            if let BoxKind::Text(style) = node.kind
                && style.auto_resize.controls(axis)
            {
                return Err(EngineError::UnsupportedNodeKind {
                    id,
                    kind: node.kind.label(),
                    operation: match axis {
                        Axis::Horizontal => "width resize of auto-sized text",
                        Axis::Vertical => "height resize of auto-sized text",
                    },
                });
            }
            targets.push((axis, round_unit(value).max(1.0)));
        }
        if targets.len() == 1 && node.is_circular(self.config.circle_tolerance) {
            let extent = targets[0].1;
            targets = vec![(Axis::Horizontal, extent), (Axis::Vertical, extent)];
        }
        Ok(targets)
    }

    /// Deep-copy `source` into `parent` and make room for it.
    ///
    /// In a free-layout parent the copy goes below the source (or below the
    /// lowest child when the source lives elsewhere), separated by the
    /// parent's most common sibling gap, and everything below moves down by
    /// the copy's height plus that gap. In a stack or grid the copy is placed
    /// by the layout. Returns the ID of the copy.
    pub fn clone_box(
        &mut self,
        tree: &mut BoxTree,
        source: BoxId,
        parent: BoxId,
        index: Option<usize>,
    ) -> Result<BoxId> {
        let _span = tracing::debug_span!(
            "boxflow.clone",
            source = %source,
            parent = %parent,
            index = ?index
        )
        .entered();

        tree.get(source)?;
        tree.check_insertable(parent, index, "clone target")?;
        let scope = tree.root_of(parent);
        let before = tree.subtree_rects(scope);
        let layout = tree.get(parent)?.layout;
        let source_rect = tree.get(source)?.rect;
        let same_parent = tree.parent(source) == Some(parent);

        let copy = tree.deep_copy(source, parent, index)?;
        match layout {
            LayoutMode::Free => {
                self.place_free_clone(tree, copy, parent, source_rect, same_parent)?;
            }
            LayoutMode::Stack(_) | LayoutMode::Grid(_) => {
                let rect = tree.get(copy)?.rect;
                let empty = Rect::new(rect.x, rect.y, 0.0, 0.0);
                propagate::propagate(tree, copy, empty, &self.config);
            }
        }

        let label = tree.get(copy)?.label();
        self.changes.push(Change::Inserted {
            id: copy,
            label,
            parent,
            source: Some(source),
        });
        self.changes.record_geometry(tree, &before);
        Ok(copy)
    }

    fn place_free_clone(
        &self,
        tree: &mut BoxTree,
        copy: BoxId,
        parent: BoxId,
        source_rect: Rect,
        same_parent: bool,
    ) -> Result<()> {
        let gap = gap::typical_gap(tree, parent, Some(copy)).unwrap_or(self.config.fallback_gap);
        let (x, top, insertion_line) = if same_parent {
            let top = round_unit(source_rect.bottom() + gap);
            (source_rect.x, top, source_rect.bottom())
        } else {
            let lowest = tree
                .children(parent)
                .iter()
                .filter(|&&child| child != copy)
                .filter_map(|&child| tree.rect(child))
                .map(|rect| rect.bottom())
                .reduce(f64::max);
            let top = match lowest {
                Some(bottom) => round_unit(bottom + gap),
                None => tree.get(parent)?.padding.top,
            };
            (tree.get(copy)?.rect.x, top, top)
        };

        let node = tree.get_mut(copy)?;
        node.rect.x = x;
        node.rect.y = top;
        let shift = node.rect.height + gap;
        tracing::trace!(gap, top, shift, "placed clone in free layout");

        let siblings: Vec<BoxId> = tree
            .children(parent)
            .iter()
            .copied()
            .filter(|&child| child != copy)
            .collect();
        for sibling in siblings {
            if let Some(node) = tree.node_mut(sibling)
                && node.rect.y >= insertion_line - EDGE_EPSILON
            {
                node.rect.y = round_unit(node.rect.y + shift);
            }
        }

        let parent_before = tree.get(parent)?.rect;
        gap::grow_to_contain(tree, parent);
        propagate::propagate(tree, parent, parent_before, &self.config);
        Ok(())
    }

    /// Remove `id` and its subtree and close the space it left.
    ///
    /// In a free-layout parent, siblings below move up by the box's height
    /// plus the gap to the nearest of them, and the parent shrinks onto its
    /// remaining content. In a stack or grid the layout closes the space.
    /// Top-level boxes are removed without any propagation.
    pub fn delete(&mut self, tree: &mut BoxTree, id: BoxId) -> Result<()> {
        let _span = tracing::debug_span!("boxflow.delete", box_id = %id).entered();

        let node = tree.get(id)?;
        let label = node.label();
        let target = node.rect;
        let Some(parent) = node.parent() else {
            let removed = tree.remove_subtree(id)?;
            self.changes.push(Change::Removed {
                id,
                label,
                parent: None,
                boxes: removed.len(),
            });
            return Ok(());
        };

        let scope = tree.root_of(parent);
        let before = tree.subtree_rects(scope);
        let layout = tree.get(parent)?.layout;
        let parent_before = tree.get(parent)?.rect;

        let removed = match layout {
            LayoutMode::Free => {
                let gap_below = tree
                    .children(parent)
                    .iter()
                    .filter(|&&child| child != id)
                    .filter_map(|&child| tree.rect(child))
                    .filter(|rect| rect.y >= target.bottom() - EDGE_EPSILON)
                    .map(|rect| (rect.y - target.bottom()).max(0.0))
                    .reduce(f64::min);
                let removed = tree.remove_subtree(id)?;
                if let Some(gap) = gap_below {
                    let shift = target.height + gap;
                    for sibling in tree.children(parent).to_vec() {
                        if let Some(node) = tree.node_mut(sibling)
                            && node.rect.y >= target.bottom() - EDGE_EPSILON
                        {
                            node.rect.y = round_unit(node.rect.y - shift);
                        }
                    }
                }
                if !tree.children(parent).is_empty() {
                    shrink_to_content(tree, parent);
                }
                removed
            }
            LayoutMode::Stack(_) | LayoutMode::Grid(_) => {
                let removed = tree.remove_subtree(id)?;
                flow::fit_hug(tree, parent);
                flow::place_subtree(tree, parent, &self.config);
                removed
            }
        };
        propagate::propagate(tree, parent, parent_before, &self.config);

        self.changes.push(Change::Removed {
            id,
            label,
            parent: Some(parent),
            boxes: removed.len(),
        });
        self.changes.record_geometry(tree, &before);
        Ok(())
    }

    /// Fix low-contrast text and icon colors under `root`. Returns how many
    /// boxes were recolored.
    pub fn remediate_contrast(&mut self, tree: &mut BoxTree, root: BoxId) -> Result<usize> {
        let mut ctx = ContrastContext::new();
        self.remediate_contrast_with(tree, root, &mut ctx)
    }

    /// Like [`Engine::remediate_contrast`], reusing cached backgrounds.
    pub fn remediate_contrast_with(
        &mut self,
        tree: &mut BoxTree,
        root: BoxId,
        ctx: &mut ContrastContext,
    ) -> Result<usize> {
        let _span = tracing::debug_span!("boxflow.contrast", root = %root).entered();
        tree.get(root)?;
        let fixes = contrast::remediate(tree, root, &self.config, ctx);
        for fix in &fixes {
            let label = tree.get(fix.id)?.label();
            self.changes.push(Change::Recolored {
                id: fix.id,
                label,
                from: fix.from,
                to: fix.to,
                ratio_before: fix.ratio_before,
                ratio_after: fix.ratio_after,
            });
        }
        tracing::debug!(recolored = fixes.len(), "contrast remediation complete");
        Ok(fixes.len())
    }
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::Horizontal => "width",
        Axis::Vertical => "height",
    }
}

/// Shrink a free container onto its content after a removal: the vertical
/// extent shrinks to the lowest child plus padding, hug axes track content.
fn shrink_to_content(tree: &mut BoxTree, parent: BoxId) {
    for axis in Axis::BOTH {
        let Some(needed) = flow::hug_extent(tree, parent, axis) else {
            return;
        };
        let Some(node) = tree.node_mut(parent) else {
            return;
        };
        let current = node.rect.extent(axis);
        let next = match (node.sizing.along(axis), axis) {
            (SizingMode::Hug, _) => needed.max(node.min_extent(axis)),
            (SizingMode::Fixed, Axis::Vertical) if needed < current => needed,
            _ => current,
        };
        node.rect.set_extent(axis, round_unit(next));
    }
}
