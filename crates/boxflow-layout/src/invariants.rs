#![forbid(unsafe_code)]

//! Layout invariant diagnostics.
//!
//! [`report`] inspects a tree and lists every place where stored geometry
//! disagrees with the layout rules. A tree the engine has settled and edited
//! reports no errors.

use boxflow_core::Axis;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::flow;
use crate::tree::{BoxId, BoxTree, LayoutMode, SizingMode};

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    /// Parent/child links are inconsistent.
    BrokenStructure,
    /// A hugging axis does not match its content.
    HugMismatch,
    /// A filling child does not take the space it is given.
    FillMismatch,
    /// A near-square vector or image is not exactly square.
    CircleDistorted,
    /// Corresponding grid descendants differ in size.
    GridNonUniform,
    /// A box has a negative or non-finite extent.
    InvalidExtent,
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub severity: InvariantSeverity,
    pub box_id: Option<BoxId>,
    pub related: Option<BoxId>,
    pub message: String,
}

/// Structured invariant report over a box tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub state_hash: u64,
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    /// Return true if any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == InvariantSeverity::Error)
    }

    /// Findings with the given code.
    pub fn with_code(&self, code: InvariantCode) -> impl Iterator<Item = &InvariantIssue> {
        self.issues.iter().filter(move |issue| issue.code == code)
    }
}

/// Inspect `tree` against the layout rules.
#[must_use]
pub fn report(tree: &BoxTree, config: &EngineConfig) -> InvariantReport {
    let mut issues = Vec::new();
    if let Err(err) = tree.validate() {
        issues.push(InvariantIssue {
            code: InvariantCode::BrokenStructure,
            severity: InvariantSeverity::Error,
            box_id: None,
            related: None,
            message: err.to_string(),
        });
        return InvariantReport {
            state_hash: tree.state_hash(),
            issues,
        };
    }

    for node in tree.nodes() {
        let id = node.id();
        let rect = node.rect;
        if [rect.width, rect.height]
            .iter()
            .any(|extent| !extent.is_finite() || *extent < 0.0)
        {
            issues.push(issue(
                InvariantCode::InvalidExtent,
                InvariantSeverity::Error,
                id,
                None,
                format!("box {id} has extent {}x{}", rect.width, rect.height),
            ));
        }
        check_hug(tree, id, config, &mut issues);
        check_fill(tree, id, config, &mut issues);
        if node.is_circular(config.circle_tolerance) && rect.width != rect.height {
            issues.push(issue(
                InvariantCode::CircleDistorted,
                InvariantSeverity::Warning,
                id,
                None,
                format!("box {id} is {}x{}, expected a square", rect.width, rect.height),
            ));
        }
        if matches!(node.layout, LayoutMode::Grid(_)) {
            check_grid(tree, id, config, &mut issues);
        }
    }

    InvariantReport {
        state_hash: tree.state_hash(),
        issues,
    }
}

fn issue(
    code: InvariantCode,
    severity: InvariantSeverity,
    box_id: BoxId,
    related: Option<BoxId>,
    message: String,
) -> InvariantIssue {
    InvariantIssue {
        code,
        severity,
        box_id: Some(box_id),
        related,
        message,
    }
}

fn check_hug(tree: &BoxTree, id: BoxId, config: &EngineConfig, issues: &mut Vec<InvariantIssue>) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if !node.kind.is_container() {
        return;
    }
    for axis in Axis::BOTH {
        if node.sizing.along(axis) != SizingMode::Hug {
            continue;
        }
        let Some(content) = flow::hug_extent(tree, id, axis) else {
            continue;
        };
        let expected = content.max(node.min_extent(axis));
        let actual = node.rect.extent(axis);
        if (actual - expected).abs() > config.grid_tolerance {
            issues.push(issue(
                InvariantCode::HugMismatch,
                InvariantSeverity::Error,
                id,
                None,
                format!("hugging {axis:?} extent of {id} is {actual}, content needs {expected}"),
            ));
        }
    }
}

fn check_fill(tree: &BoxTree, id: BoxId, config: &EngineConfig, issues: &mut Vec<InvariantIssue>) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let LayoutMode::Stack(stack) = node.layout else {
        return;
    };
    let children = node.children();
    let cross = stack.direction.cross();
    let inner_cross = (node.rect.extent(cross) - node.padding.sum(cross)).max(0.0);
    let mut fill_total = 0.0;
    let mut fixed_total = 0.0;
    let mut fill_count = 0usize;
    for &child in children {
        let Some(child_node) = tree.node(child) else {
            continue;
        };
        let circular = child_node.is_circular(config.circle_tolerance);
        let extent = child_node.rect.extent(stack.direction);
        if child_node.sizing.along(stack.direction) == SizingMode::Fill && !circular {
            fill_total += extent;
            fill_count += 1;
        } else {
            fixed_total += extent;
        }
        if child_node.sizing.along(cross) == SizingMode::Fill
            && !circular
            && (child_node.rect.extent(cross) - inner_cross.max(child_node.min_extent(cross))).abs()
                > config.grid_tolerance
        {
            issues.push(issue(
                InvariantCode::FillMismatch,
                InvariantSeverity::Error,
                child,
                Some(id),
                format!("cross-axis fill of {child} does not span {id}"),
            ));
        }
    }
    if fill_count == 0 {
        return;
    }
    let inner = (node.rect.extent(stack.direction) - node.padding.sum(stack.direction)).max(0.0);
    let gaps = stack.gap * children.len().saturating_sub(1) as f64;
    let leftover = (inner - fixed_total - gaps).max(0.0);
    if fill_total + config.grid_tolerance * (fill_count as f64) < leftover {
        issues.push(issue(
            InvariantCode::FillMismatch,
            InvariantSeverity::Error,
            id,
            None,
            format!("fill children of {id} take {fill_total} of {leftover} available"),
        ));
    }
}

fn check_grid(tree: &BoxTree, grid: BoxId, config: &EngineConfig, issues: &mut Vec<InvariantIssue>) {
    let cells = tree.children(grid);
    let Some((&reference, others)) = cells.split_first() else {
        return;
    };
    for &cell in others {
        compare_cells(tree, grid, reference, cell, config, issues);
    }
}

fn compare_cells(
    tree: &BoxTree,
    grid: BoxId,
    reference: BoxId,
    other: BoxId,
    config: &EngineConfig,
    issues: &mut Vec<InvariantIssue>,
) {
    for (&expected, &actual) in tree.children(reference).iter().zip(tree.children(other)) {
        let (Some(want), Some(have)) = (tree.node(expected), tree.node(actual)) else {
            continue;
        };
        if !want.kind.same_variant(&have.kind) {
            continue;
        }
        let differs = Axis::BOTH.into_iter().any(|axis| {
            (want.rect.extent(axis) - have.rect.extent(axis)).abs() > config.grid_tolerance
        });
        if differs {
            issues.push(issue(
                InvariantCode::GridNonUniform,
                InvariantSeverity::Error,
                actual,
                Some(expected),
                format!(
                    "grid {grid}: {actual} is {}x{} but {expected} is {}x{}",
                    have.rect.width, have.rect.height, want.rect.width, want.rect.height
                ),
            ));
        } else {
            compare_cells(tree, grid, expected, actual, config, issues);
        }
    }
}
