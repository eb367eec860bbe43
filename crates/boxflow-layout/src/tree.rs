#![forbid(unsafe_code)]

//! The box tree.
//!
//! A [`BoxTree`] is an arena of [`BoxNode`] records keyed by [`BoxId`]. Every
//! node stores its parent, its ordered children (paint order, back to front),
//! and a parent-relative [`Rect`]. Top-level boxes are roots and sit directly
//! on the canvas.
//!
//! Parent/child links are private to this module; the engine passes mutate
//! geometry through [`BoxTree::node_mut`] but never rewire the topology
//! except through [`BoxTree::insert_child`], [`BoxTree::deep_copy`] and
//! [`BoxTree::remove_subtree`], which keep both directions consistent.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use boxflow_core::{Axis, Rect, Sides, Size};
use boxflow_style::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Stable identifier for boxes.
///
/// `0` is reserved so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(u64);

impl BoxId {
    /// Lowest valid box ID.
    pub const MIN: Self = Self(1);

    /// Create a box ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for BoxId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a box's extent along one axis is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Explicit extent.
    #[default]
    Fixed,
    /// Shrink-wraps the content plus padding.
    Hug,
    /// Takes the space the parent's auto-layout gives it.
    Fill,
}

/// Per-axis sizing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Sizing {
    pub horizontal: SizingMode,
    pub vertical: SizingMode,
}

impl Sizing {
    pub const FIXED: Self = Self::both(SizingMode::Fixed);
    pub const HUG: Self = Self::both(SizingMode::Hug);

    #[must_use]
    pub const fn new(horizontal: SizingMode, vertical: SizingMode) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    #[must_use]
    pub const fn both(mode: SizingMode) -> Self {
        Self::new(mode, mode)
    }

    #[inline]
    #[must_use]
    pub const fn along(&self, axis: Axis) -> SizingMode {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, mode: SizingMode) {
        match axis {
            Axis::Horizontal => self.horizontal = mode,
            Axis::Vertical => self.vertical = mode,
        }
    }
}

/// Distribution of stack children along the stacking axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAlign {
    #[default]
    Start,
    Center,
    End,
    /// First and last children touch the padding; the rest is spread evenly.
    SpaceBetween,
}

/// Placement of stack children across the stacking axis.
///
/// Stretching is expressed per child with [`SizingMode::Fill`] on the cross
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossAlign {
    #[default]
    Start,
    Center,
    End,
}

/// One-dimensional auto-layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackLayout {
    pub direction: Axis,
    pub gap: f64,
    #[serde(default)]
    pub primary_align: PrimaryAlign,
    #[serde(default)]
    pub cross_align: CrossAlign,
}

impl StackLayout {
    #[must_use]
    pub const fn new(direction: Axis, gap: f64) -> Self {
        Self {
            direction,
            gap,
            primary_align: PrimaryAlign::Start,
            cross_align: CrossAlign::Start,
        }
    }

    #[must_use]
    pub const fn vertical(gap: f64) -> Self {
        Self::new(Axis::Vertical, gap)
    }

    #[must_use]
    pub const fn horizontal(gap: f64) -> Self {
        Self::new(Axis::Horizontal, gap)
    }

    #[must_use]
    pub const fn primary_align(mut self, align: PrimaryAlign) -> Self {
        self.primary_align = align;
        self
    }

    #[must_use]
    pub const fn cross_align(mut self, align: CrossAlign) -> Self {
        self.cross_align = align;
        self
    }
}

/// Row-major grid parameters. Cells keep their own sizes; tracks take the
/// largest cell in each row and column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// At least 1.
    pub columns: usize,
    pub column_gap: f64,
    pub row_gap: f64,
}

impl GridLayout {
    #[must_use]
    pub const fn new(columns: usize, column_gap: f64, row_gap: f64) -> Self {
        Self {
            columns,
            column_gap,
            row_gap,
        }
    }

    /// Gap between tracks along `axis`.
    #[must_use]
    pub const fn gap_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.column_gap,
            Axis::Vertical => self.row_gap,
        }
    }
}

/// How a container arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LayoutMode {
    /// Children keep explicit positions.
    #[default]
    Free,
    Stack(StackLayout),
    Grid(GridLayout),
}

impl LayoutMode {
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

/// How a text box's frame follows its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAutoResize {
    /// The frame is set explicitly.
    #[default]
    None,
    /// Height follows the wrapped content.
    Height,
    /// Both extents follow the content.
    WidthAndHeight,
}

impl TextAutoResize {
    /// Whether the extent along `axis` is owned by the text layout.
    #[must_use]
    pub const fn controls(self, axis: Axis) -> bool {
        match (self, axis) {
            (Self::None, _) => false,
            (Self::Height, Axis::Horizontal) => false,
            (Self::Height, Axis::Vertical) => true,
            (Self::WidthAndHeight, _) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points.
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    pub color: Rgb,
    #[serde(default)]
    pub auto_resize: TextAutoResize,
}

impl TextStyle {
    #[must_use]
    pub const fn new(font_size: f64, color: Rgb) -> Self {
        Self {
            font_size,
            bold: false,
            color,
            auto_resize: TextAutoResize::None,
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn auto_resize(mut self, mode: TextAutoResize) -> Self {
        self.auto_resize = mode;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorShape {
    #[default]
    Path,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VectorStyle {
    #[serde(default)]
    pub shape: VectorShape,
    /// Stroke or fill color of the glyph, if it is a flat color.
    #[serde(default)]
    pub color: Option<Rgb>,
}

/// What a box is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoxKind {
    /// Holds children.
    #[default]
    Container,
    Text(TextStyle),
    Vector(VectorStyle),
    Image,
}

impl BoxKind {
    /// Short lowercase label for messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Text(_) => "text",
            Self::Vector(_) => "vector",
            Self::Image => "image",
        }
    }

    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Container)
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    #[must_use]
    pub const fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    #[must_use]
    pub const fn text_style(&self) -> Option<&TextStyle> {
        match self {
            Self::Text(style) => Some(style),
            _ => None,
        }
    }

    /// Whether two kinds are the same variant, ignoring styling.
    #[must_use]
    pub fn same_variant(&self, other: &BoxKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Background paint of a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "paint", rename_all = "snake_case")]
pub enum Paint {
    Solid { color: Rgb },
    Gradient { stops: Vec<Rgb> },
    Image,
}

impl Paint {
    #[must_use]
    pub const fn solid(color: Rgb) -> Self {
        Self::Solid { color }
    }

    /// The flat color, if this paint is one.
    #[must_use]
    pub const fn solid_color(&self) -> Option<Rgb> {
        match self {
            Self::Solid { color } => Some(*color),
            _ => None,
        }
    }
}

/// One box in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    id: BoxId,
    parent: Option<BoxId>,
    children: Vec<BoxId>,
    #[serde(default)]
    pub name: String,
    pub kind: BoxKind,
    /// Parent-relative bounds.
    pub rect: Rect,
    #[serde(default)]
    pub layout: LayoutMode,
    #[serde(default)]
    pub padding: Sides,
    #[serde(default)]
    pub sizing: Sizing,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub min_size: Option<Size>,
    #[serde(default)]
    pub fill: Option<Paint>,
}

impl BoxNode {
    /// A detached box; the tree assigns its identity on insertion.
    #[must_use]
    pub fn new(kind: BoxKind, rect: Rect) -> Self {
        Self {
            id: BoxId::MIN,
            parent: None,
            children: Vec::new(),
            name: String::new(),
            kind,
            rect,
            layout: LayoutMode::Free,
            padding: Sides::default(),
            sizing: Sizing::FIXED,
            corner_radius: 0.0,
            min_size: None,
            fill: None,
        }
    }

    #[must_use]
    pub fn container(rect: Rect) -> Self {
        Self::new(BoxKind::Container, rect)
    }

    #[must_use]
    pub fn text(rect: Rect, style: TextStyle) -> Self {
        Self::new(BoxKind::Text(style), rect)
    }

    #[must_use]
    pub fn vector(rect: Rect, style: VectorStyle) -> Self {
        Self::new(BoxKind::Vector(style), rect)
    }

    #[must_use]
    pub fn image(rect: Rect) -> Self {
        Self::new(BoxKind::Image, rect)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_stack(self, stack: StackLayout) -> Self {
        self.with_layout(LayoutMode::Stack(stack))
    }

    #[must_use]
    pub fn with_grid(self, grid: GridLayout) -> Self {
        self.with_layout(LayoutMode::Grid(grid))
    }

    #[must_use]
    pub fn with_padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    #[must_use]
    pub fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    #[must_use]
    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    #[must_use]
    pub fn with_min_size(mut self, min: Size) -> Self {
        self.min_size = Some(min);
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill: Paint) -> Self {
        self.fill = Some(fill);
        self
    }

    #[must_use]
    pub const fn id(&self) -> BoxId {
        self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    /// Name for diagnostics: the box name, or its ID when unnamed.
    #[must_use]
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    /// An explicit ellipse, or a vector or image whose extents agree within
    /// `tolerance`.
    #[must_use]
    pub fn is_circular(&self, tolerance: f64) -> bool {
        match self.kind {
            BoxKind::Vector(VectorStyle {
                shape: VectorShape::Ellipse,
                ..
            }) => true,
            BoxKind::Vector(_) | BoxKind::Image => {
                self.rect.width > 0.0 && (self.rect.width - self.rect.height).abs() <= tolerance
            }
            BoxKind::Container | BoxKind::Text(_) => false,
        }
    }

    /// Lower bound on the extent along `axis`.
    #[must_use]
    pub fn min_extent(&self, axis: Axis) -> f64 {
        self.min_size.map_or(0.0, |min| min.along(axis))
    }
}

/// Structural defect found by [`BoxTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeStructureError {
    MissingChild { parent: BoxId, child: BoxId },
    ParentMismatch { child: BoxId, expected: Option<BoxId>, found: Option<BoxId> },
    DuplicateChild { parent: BoxId, child: BoxId },
    MissingRoot { id: BoxId },
    Unreachable { id: BoxId },
    NonContainerParent { parent: BoxId },
    StaleNextId { next_id: BoxId, max: BoxId },
}

impl fmt::Display for TreeStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChild { parent, child } => {
                write!(f, "box {parent} lists missing child {child}")
            }
            Self::ParentMismatch {
                child,
                expected,
                found,
            } => write!(
                f,
                "box {child} records parent {found:?} but is listed under {expected:?}"
            ),
            Self::DuplicateChild { parent, child } => {
                write!(f, "box {child} is listed more than once (last under {parent})")
            }
            Self::MissingRoot { id } => write!(f, "root {id} does not exist"),
            Self::Unreachable { id } => write!(f, "box {id} is not reachable from any root"),
            Self::NonContainerParent { parent } => {
                write!(f, "non-container box {parent} has children")
            }
            Self::StaleNextId { next_id, max } => {
                write!(f, "next id {next_id} does not exceed existing id {max}")
            }
        }
    }
}

impl std::error::Error for TreeStructureError {}

/// Arena of boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxTree {
    nodes: BTreeMap<BoxId, BoxNode>,
    roots: Vec<BoxId>,
    next_id: BoxId,
}

impl Default for BoxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            roots: Vec::new(),
            next_id: BoxId::MIN,
        }
    }

    fn allocate_id(&mut self) -> BoxId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Insert a top-level box on the canvas.
    pub fn add_root(&mut self, mut node: BoxNode) -> BoxId {
        let id = self.allocate_id();
        node.id = id;
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    /// Insert `node` under `parent`, appended or at `index`.
    pub fn insert_child(
        &mut self,
        parent: BoxId,
        index: Option<usize>,
        mut node: BoxNode,
    ) -> Result<BoxId> {
        self.check_insertable(parent, index, "child insertion")?;
        let id = self.allocate_id();
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        self.link_child(parent, index, id);
        Ok(id)
    }

    /// Append `node` under `parent`. Shorthand for [`Self::insert_child`].
    pub fn push_child(&mut self, parent: BoxId, node: BoxNode) -> Result<BoxId> {
        self.insert_child(parent, None, node)
    }

    pub(crate) fn check_insertable(
        &self,
        parent: BoxId,
        index: Option<usize>,
        operation: &'static str,
    ) -> Result<()> {
        let node = self.get(parent)?;
        if !node.kind.is_container() {
            return Err(EngineError::UnsupportedNodeKind {
                id: parent,
                kind: node.kind.label(),
                operation,
            });
        }
        if let Some(index) = index
            && index > node.children.len()
        {
            return Err(EngineError::invalid(format!(
                "index {index} is past the end of {parent}'s {} children",
                node.children.len()
            )));
        }
        Ok(())
    }

    fn link_child(&mut self, parent: BoxId, index: Option<usize>, child: BoxId) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let at = index
                .unwrap_or(parent_node.children.len())
                .min(parent_node.children.len());
            parent_node.children.insert(at, child);
        }
    }

    /// Copy the subtree at `source` under `parent` with fresh IDs.
    ///
    /// Returns the ID of the copy of `source`.
    pub fn deep_copy(
        &mut self,
        source: BoxId,
        parent: BoxId,
        index: Option<usize>,
    ) -> Result<BoxId> {
        self.get(source)?;
        self.check_insertable(parent, index, "clone target")?;

        let originals = self.pre_order(source);
        let mut remap = BTreeMap::new();
        for &old in &originals {
            let fresh = self.allocate_id();
            remap.insert(old, fresh);
        }
        for &old in &originals {
            let Some(original) = self.nodes.get(&old) else {
                continue;
            };
            let mut copy = original.clone();
            copy.id = remap[&old];
            copy.parent = if old == source {
                Some(parent)
            } else {
                original.parent.and_then(|p| remap.get(&p).copied())
            };
            copy.children = original
                .children
                .iter()
                .filter_map(|child| remap.get(child).copied())
                .collect();
            self.nodes.insert(copy.id, copy);
        }
        let root_copy = remap[&source];
        self.link_child(parent, index, root_copy);
        Ok(root_copy)
    }

    /// Remove `id` and its descendants. Returns the removed nodes in pre-order.
    pub fn remove_subtree(&mut self, id: BoxId) -> Result<Vec<BoxNode>> {
        let parent = self.get(id)?.parent;
        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }
        let doomed = self.pre_order(id);
        Ok(doomed
            .into_iter()
            .filter_map(|node| self.nodes.remove(&node))
            .collect())
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn node(&self, id: BoxId) -> Option<&BoxNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: BoxId) -> Option<&mut BoxNode> {
        self.nodes.get_mut(&id)
    }

    /// Like [`Self::node`] but with a typed error.
    pub fn get(&self, id: BoxId) -> Result<&BoxNode> {
        self.nodes.get(&id).ok_or(EngineError::NodeNotFound { id })
    }

    pub(crate) fn get_mut(&mut self, id: BoxId) -> Result<&mut BoxNode> {
        self.nodes
            .get_mut(&id)
            .ok_or(EngineError::NodeNotFound { id })
    }

    /// Iterate boxes in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &BoxNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn roots(&self) -> &[BoxId] {
        &self.roots
    }

    #[must_use]
    pub fn rect(&self, id: BoxId) -> Option<Rect> {
        self.nodes.get(&id).map(|node| node.rect)
    }

    #[must_use]
    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Children of `id` in paint order; empty for unknown IDs.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.nodes
            .get(&id)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// Proper ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: BoxId) -> Vec<BoxId> {
        let mut chain = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if chain.len() > self.nodes.len() {
                break;
            }
            chain.push(ancestor);
            cursor = self.parent(ancestor);
        }
        chain
    }

    /// The top-level box containing `id`.
    #[must_use]
    pub fn root_of(&self, id: BoxId) -> BoxId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// `id` and its descendants, parents before children.
    #[must_use]
    pub fn pre_order(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// `id` and its descendants, children before parents.
    #[must_use]
    pub fn post_order(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = self.pre_order_mirrored(id);
        out.reverse();
        out
    }

    fn pre_order_mirrored(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().copied());
        }
        out
    }

    /// Descendants of `id`, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut all = self.pre_order(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Parent-relative bounds of every box in the subtree at `id`.
    #[must_use]
    pub fn subtree_rects(&self, id: BoxId) -> BTreeMap<BoxId, Rect> {
        self.pre_order(id)
            .into_iter()
            .filter_map(|node| self.rect(node).map(|rect| (node, rect)))
            .collect()
    }

    /// Check the parent/child links.
    pub fn validate(&self) -> std::result::Result<(), TreeStructureError> {
        let mut seen = BTreeSet::new();
        for &root in &self.roots {
            let Some(node) = self.nodes.get(&root) else {
                return Err(TreeStructureError::MissingRoot { id: root });
            };
            if node.parent.is_some() {
                return Err(TreeStructureError::ParentMismatch {
                    child: root,
                    expected: None,
                    found: node.parent,
                });
            }
            if !seen.insert(root) {
                return Err(TreeStructureError::DuplicateChild {
                    parent: root,
                    child: root,
                });
            }
            let mut stack = vec![root];
            while let Some(current) = stack.pop() {
                let Some(node) = self.nodes.get(&current) else {
                    continue;
                };
                if !node.children.is_empty() && !node.kind.is_container() {
                    return Err(TreeStructureError::NonContainerParent { parent: current });
                }
                for &child in &node.children {
                    let Some(child_node) = self.nodes.get(&child) else {
                        return Err(TreeStructureError::MissingChild {
                            parent: current,
                            child,
                        });
                    };
                    if child_node.parent != Some(current) {
                        return Err(TreeStructureError::ParentMismatch {
                            child,
                            expected: Some(current),
                            found: child_node.parent,
                        });
                    }
                    if !seen.insert(child) {
                        return Err(TreeStructureError::DuplicateChild {
                            parent: current,
                            child,
                        });
                    }
                    stack.push(child);
                }
            }
        }
        if let Some(&id) = self.nodes.keys().find(|id| !seen.contains(id)) {
            return Err(TreeStructureError::Unreachable { id });
        }
        if let Some((&max, _)) = self.nodes.last_key_value()
            && self.next_id <= max
        {
            return Err(TreeStructureError::StaleNextId {
                next_id: self.next_id,
                max,
            });
        }
        Ok(())
    }

    /// Deterministic hash of the whole tree.
    ///
    /// Equal trees hash equally across runs and platforms; any change to
    /// topology, geometry, layout or styling changes the hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.u64(self.next_id.get());
        hasher.u64(self.roots.len() as u64);
        for root in &self.roots {
            hasher.u64(root.get());
        }
        for node in self.nodes.values() {
            hash_node(&mut hasher, node);
        }
        hasher.finish()
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn byte(&mut self, byte: u8) {
        self.0 ^= u64::from(byte);
        self.0 = self.0.wrapping_mul(Self::PRIME);
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.byte(byte);
        }
    }

    fn u64(&mut self, value: u64) {
        self.bytes(&value.to_le_bytes());
    }

    fn f64(&mut self, value: f64) {
        // Fold -0.0 so equal geometry hashes equally.
        let value = if value == 0.0 { 0.0 } else { value };
        self.u64(value.to_bits());
    }

    fn rgb(&mut self, color: Rgb) {
        self.bytes(&color.channels());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn hash_node(h: &mut Fnv1a, node: &BoxNode) {
    h.u64(node.id.get());
    h.u64(node.parent.map_or(0, BoxId::get));
    h.u64(node.children.len() as u64);
    for child in &node.children {
        h.u64(child.get());
    }
    h.bytes(node.name.as_bytes());
    h.byte(0xff);

    match node.kind {
        BoxKind::Container => h.byte(0),
        BoxKind::Text(style) => {
            h.byte(1);
            h.f64(style.font_size);
            h.byte(u8::from(style.bold));
            h.rgb(style.color);
            h.byte(style.auto_resize as u8);
        }
        BoxKind::Vector(style) => {
            h.byte(2);
            h.byte(style.shape as u8);
            match style.color {
                Some(color) => {
                    h.byte(1);
                    h.rgb(color);
                }
                None => h.byte(0),
            }
        }
        BoxKind::Image => h.byte(3),
    }

    for value in [node.rect.x, node.rect.y, node.rect.width, node.rect.height] {
        h.f64(value);
    }
    match node.layout {
        LayoutMode::Free => h.byte(0),
        LayoutMode::Stack(stack) => {
            h.byte(1);
            h.byte(stack.direction as u8);
            h.f64(stack.gap);
            h.byte(stack.primary_align as u8);
            h.byte(stack.cross_align as u8);
        }
        LayoutMode::Grid(grid) => {
            h.byte(2);
            h.u64(grid.columns as u64);
            h.f64(grid.column_gap);
            h.f64(grid.row_gap);
        }
    }
    let p = node.padding;
    for value in [p.top, p.right, p.bottom, p.left] {
        h.f64(value);
    }
    h.byte(node.sizing.horizontal as u8);
    h.byte(node.sizing.vertical as u8);
    h.f64(node.corner_radius);
    match node.min_size {
        Some(min) => {
            h.byte(1);
            h.f64(min.width);
            h.f64(min.height);
        }
        None => h.byte(0),
    }
    match &node.fill {
        None => h.byte(0),
        Some(Paint::Solid { color }) => {
            h.byte(1);
            h.rgb(*color);
        }
        Some(Paint::Gradient { stops }) => {
            h.byte(2);
            h.u64(stops.len() as u64);
            for stop in stops {
                h.rgb(*stop);
            }
        }
        Some(Paint::Image) => h.byte(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (BoxTree, BoxId, BoxId, BoxId) {
        let mut tree = BoxTree::new();
        let root = tree.add_root(BoxNode::container(Rect::from_size(400.0, 300.0)).named("page"));
        let card = tree
            .push_child(root, BoxNode::container(Rect::new(10.0, 10.0, 200.0, 100.0)))
            .expect("card");
        let label = tree
            .push_child(
                card,
                BoxNode::text(
                    Rect::new(8.0, 8.0, 120.0, 20.0),
                    TextStyle::new(14.0, Rgb::BLACK),
                ),
            )
            .expect("label");
        (tree, root, card, label)
    }

    #[test]
    fn ids_are_non_zero_and_sequential() {
        assert_eq!(BoxId::new(0), None);
        let (_, root, card, label) = sample();
        assert_eq!(root.get(), 1);
        assert_eq!(card.get(), 2);
        assert_eq!(label.get(), 3);
    }

    #[test]
    fn links_are_bidirectional() {
        let (tree, root, card, label) = sample();
        assert_eq!(tree.parent(label), Some(card));
        assert_eq!(tree.children(root), &[card]);
        assert_eq!(tree.ancestors(label), vec![card, root]);
        assert_eq!(tree.root_of(label), root);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn traversal_orders() {
        let (mut tree, root, card, label) = sample();
        let side = tree
            .push_child(root, BoxNode::image(Rect::new(250.0, 10.0, 40.0, 40.0)))
            .expect("side");
        assert_eq!(tree.pre_order(root), vec![root, card, label, side]);
        assert_eq!(tree.post_order(root), vec![label, card, side, root]);
        assert_eq!(tree.descendants(root), vec![card, label, side]);
    }

    #[test]
    fn insert_under_non_container_is_rejected() {
        let (mut tree, _, _, label) = sample();
        let err = tree
            .push_child(label, BoxNode::container(Rect::from_size(1.0, 1.0)))
            .expect_err("text cannot hold children");
        assert!(matches!(err, EngineError::UnsupportedNodeKind { kind: "text", .. }));
    }

    #[test]
    fn insert_index_past_end_is_invalid() {
        let (mut tree, root, _, _) = sample();
        let err = tree
            .insert_child(root, Some(5), BoxNode::container(Rect::default()))
            .expect_err("index out of range");
        assert!(matches!(err, EngineError::InvalidOperation { .. }));
    }

    #[test]
    fn insert_at_index_keeps_order() {
        let (mut tree, root, card, _) = sample();
        let first = tree
            .insert_child(root, Some(0), BoxNode::container(Rect::default()))
            .expect("insert");
        assert_eq!(tree.children(root), &[first, card]);
    }

    #[test]
    fn deep_copy_assigns_fresh_ids() {
        let (mut tree, root, card, label) = sample();
        let copy = tree.deep_copy(card, root, None).expect("copy");
        assert_ne!(copy, card);
        assert_eq!(tree.children(root), &[card, copy]);
        let copied_children = tree.children(copy).to_vec();
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0], label);
        assert_eq!(tree.parent(copied_children[0]), Some(copy));
        assert_eq!(tree.rect(copied_children[0]), tree.rect(label));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let (mut tree, root, card, label) = sample();
        let removed = tree.remove_subtree(card).expect("remove");
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(label));
        assert!(tree.children(root).is_empty());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn removing_root_clears_roots() {
        let (mut tree, root, _, _) = sample();
        tree.remove_subtree(root).expect("remove");
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn state_hash_tracks_geometry() {
        let (mut tree, _, card, _) = sample();
        let before = tree.state_hash();
        assert_eq!(before, tree.clone().state_hash());
        tree.node_mut(card).expect("card").rect.width += 1.0;
        assert_ne!(before, tree.state_hash());
        tree.node_mut(card).expect("card").rect.width -= 1.0;
        assert_eq!(before, tree.state_hash());
    }

    #[test]
    fn circular_classification() {
        let icon = BoxNode::vector(Rect::from_size(40.0, 41.0), VectorStyle::default());
        assert!(icon.is_circular(1.0));
        let bar = BoxNode::vector(Rect::from_size(40.0, 8.0), VectorStyle::default());
        assert!(!bar.is_circular(1.0));
        let frame = BoxNode::container(Rect::from_size(40.0, 40.0));
        assert!(!frame.is_circular(1.0));
        let oval = BoxNode::vector(
            Rect::from_size(100.0, 60.0),
            VectorStyle {
                shape: VectorShape::Ellipse,
                ..VectorStyle::default()
            },
        );
        assert!(oval.is_circular(1.0));
    }

    #[test]
    fn text_auto_resize_axes() {
        assert!(TextAutoResize::Height.controls(Axis::Vertical));
        assert!(!TextAutoResize::Height.controls(Axis::Horizontal));
        assert!(TextAutoResize::WidthAndHeight.controls(Axis::Horizontal));
        assert!(!TextAutoResize::None.controls(Axis::Vertical));
    }

    #[test]
    fn tree_serde_round_trip() {
        let (tree, _, _, _) = sample();
        let json = serde_json::to_string(&tree).expect("serialize");
        let back: BoxTree = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.state_hash(), tree.state_hash());
        assert!(back.validate().is_ok());
    }
}
