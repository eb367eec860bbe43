#![forbid(unsafe_code)]

//! Human-readable record of what an operation changed.

use std::collections::BTreeMap;
use std::fmt;

use boxflow_core::{Axis, Rect, Size};
use boxflow_style::Rgb;
use serde::{Deserialize, Serialize};

use crate::tree::{BoxId, BoxTree, SizingMode};

/// One observable change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    Resized {
        id: BoxId,
        label: String,
        from: Size,
        to: Size,
    },
    Moved {
        id: BoxId,
        label: String,
        dx: f64,
        dy: f64,
    },
    Inserted {
        id: BoxId,
        label: String,
        parent: BoxId,
        source: Option<BoxId>,
    },
    Removed {
        id: BoxId,
        label: String,
        parent: Option<BoxId>,
        boxes: usize,
    },
    SizingChanged {
        id: BoxId,
        label: String,
        axis: Axis,
        from: SizingMode,
        to: SizingMode,
    },
    Recolored {
        id: BoxId,
        label: String,
        from: Rgb,
        to: Rgb,
        ratio_before: f64,
        ratio_after: f64,
    },
}

impl Change {
    /// The box the change applies to.
    #[must_use]
    pub const fn id(&self) -> BoxId {
        match self {
            Self::Resized { id, .. }
            | Self::Moved { id, .. }
            | Self::Inserted { id, .. }
            | Self::Removed { id, .. }
            | Self::SizingChanged { id, .. }
            | Self::Recolored { id, .. } => *id,
        }
    }
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::Horizontal => "width",
        Axis::Vertical => "height",
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resized {
                label, from, to, ..
            } => write!(
                f,
                "resized {label} from {}×{} to {}×{}",
                from.width, from.height, to.width, to.height
            ),
            Self::Moved { label, dx, dy, .. } => match (*dx == 0.0, *dy == 0.0) {
                (true, _) => write!(f, "shifted sibling {label} by {dy}px"),
                (false, true) => write!(f, "shifted sibling {label} horizontally by {dx}px"),
                (false, false) => write!(f, "moved {label} by ({dx}, {dy})px"),
            },
            Self::Inserted {
                label,
                parent,
                source,
                ..
            } => match source {
                Some(source) => write!(f, "cloned {source} as {label} into {parent}"),
                None => write!(f, "inserted {label} into {parent}"),
            },
            Self::Removed { label, boxes, .. } => {
                write!(f, "deleted {label} ({boxes} boxes)")
            }
            Self::SizingChanged {
                label,
                axis,
                from,
                to,
                ..
            } => write!(
                f,
                "switched {label} {} sizing from {from:?} to {to:?}",
                axis_name(*axis)
            ),
            Self::Recolored {
                label,
                from,
                to,
                ratio_before,
                ratio_after,
                ..
            } => write!(
                f,
                "recolored {label} from {from} to {to} (contrast {ratio_before:.2} -> {ratio_after:.2})"
            ),
        }
    }
}

/// Ordered change journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    entries: Vec<Change>,
}

impl ChangeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        tracing::debug!(box_id = %change.id(), "{change}");
        self.entries.push(change);
    }

    #[must_use]
    pub fn entries(&self) -> &[Change] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry.
    pub fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.entries)
    }

    /// Journal geometry differences between `before` and the current tree.
    ///
    /// A box whose size changed is reported as resized; a box that only moved
    /// is reported as shifted. Boxes missing from either side are skipped.
    pub fn record_geometry(&mut self, tree: &BoxTree, before: &BTreeMap<BoxId, Rect>) {
        for (&id, old) in before {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let new = node.rect;
            if new.size() != old.size() {
                self.push(Change::Resized {
                    id,
                    label: node.label(),
                    from: old.size(),
                    to: new.size(),
                });
            } else if new.x != old.x || new.y != old.y {
                self.push(Change::Moved {
                    id,
                    label: node.label(),
                    dx: new.x - old.x,
                    dy: new.y - old.y,
                });
            }
        }
    }
}
