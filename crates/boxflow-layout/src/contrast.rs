#![forbid(unsafe_code)]

//! Contrast remediation over a subtree.
//!
//! Every text box, and every flat-colored icon-sized vector, is checked
//! against the background it sits on: the nearest ancestor with a solid fill,
//! or the configured default. Foregrounds below the WCAG AA threshold are
//! moved toward black or white by the smallest blend that passes.
//!
//! Foregrounds identical to their background are left alone; they are
//! usually hidden on purpose.

use boxflow_style::{Rgb, ensure_contrast};
use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Memoized effective backgrounds.
///
/// The cache is keyed to [`BoxTree::state_hash`]; any tree change other than
/// the pass's own recoloring invalidates it on next use.
#[derive(Debug, Default)]
pub struct ContrastContext {
    fingerprint: Option<u64>,
    backgrounds: FxHashMap<BoxId, Rgb>,
}

impl ContrastContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached backgrounds.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.backgrounds.len()
    }

    pub fn clear(&mut self) {
        self.fingerprint = None;
        self.backgrounds.clear();
    }

    fn sync(&mut self, tree: &BoxTree) {
        let hash = tree.state_hash();
        if self.fingerprint != Some(hash) {
            self.backgrounds.clear();
            self.fingerprint = Some(hash);
        }
    }

    /// Background that `id` is painted on: the nearest ancestor solid fill,
    /// else `fallback`.
    pub fn background(&mut self, tree: &BoxTree, id: BoxId, fallback: Rgb) -> Rgb {
        if let Some(&cached) = self.backgrounds.get(&id) {
            return cached;
        }
        let mut unresolved = vec![id];
        let mut cursor = tree.parent(id);
        let resolved = loop {
            let Some(ancestor) = cursor else {
                break fallback;
            };
            if let Some(color) = tree
                .node(ancestor)
                .and_then(|node| node.fill.as_ref())
                .and_then(|fill| fill.solid_color())
            {
                break color;
            }
            if let Some(&cached) = self.backgrounds.get(&ancestor) {
                break cached;
            }
            unresolved.push(ancestor);
            cursor = tree.parent(ancestor);
        };
        for node in unresolved {
            self.backgrounds.insert(node, resolved);
        }
        resolved
    }
}

/// One foreground correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recolor {
    pub id: BoxId,
    pub from: Rgb,
    pub to: Rgb,
    pub background: Rgb,
    pub ratio_before: f64,
    pub ratio_after: f64,
}

/// Foreground color and required ratio for `id`, if it is checked at all.
fn target(tree: &BoxTree, id: BoxId, config: &EngineConfig) -> Option<(Rgb, f64)> {
    let node = tree.node(id)?;
    match node.kind {
        BoxKind::Text(style) => Some((style.color, config.text_threshold(&style))),
        BoxKind::Vector(style)
            if node.rect.width <= config.icon_max_extent
                && node.rect.height <= config.icon_max_extent =>
        {
            style.color.map(|color| (color, config.graphic_threshold))
        }
        _ => None,
    }
}

/// Fix every non-compliant foreground under `root` (inclusive).
pub fn remediate(
    tree: &mut BoxTree,
    root: BoxId,
    config: &EngineConfig,
    ctx: &mut ContrastContext,
) -> Vec<Recolor> {
    ctx.sync(tree);
    let mut fixes = Vec::new();
    for id in tree.pre_order(root) {
        let Some((fg, threshold)) = target(tree, id, config) else {
            continue;
        };
        let bg = ctx.background(tree, id, config.default_background);
        let Some(fix) = ensure_contrast(fg, bg, threshold, config.contrast_iterations) else {
            continue;
        };
        if let Some(node) = tree.node_mut(id) {
            match &mut node.kind {
                BoxKind::Text(style) => style.color = fix.corrected,
                BoxKind::Vector(style) => style.color = Some(fix.corrected),
                BoxKind::Container | BoxKind::Image => continue,
            }
        }
        fixes.push(Recolor {
            id,
            from: fg,
            to: fix.corrected,
            background: bg,
            ratio_before: fix.ratio_before,
            ratio_after: fix.ratio_after,
        });
    }
    // Recoloring touches foregrounds only, so cached backgrounds stay valid.
    ctx.fingerprint = Some(tree.state_hash());
    fixes
}
