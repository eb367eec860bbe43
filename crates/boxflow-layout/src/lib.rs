#![forbid(unsafe_code)]

//! Geometry propagation for box trees.
//!
//! A design document is a tree of rectangular boxes: free-positioned
//! containers, auto-layout stacks and grids, text, vectors and images. When
//! one box is resized, cloned or deleted, the engine keeps the rest of the
//! document coherent: descendants scale proportionally, grids stay uniform,
//! auto-layout reflows, ancestors grow or shrink, and sibling gaps survive.
//!
//! # Usage
//!
//! ```
//! use boxflow_core::Rect;
//! use boxflow_layout::{BoxNode, BoxTree, Engine};
//!
//! let mut tree = BoxTree::new();
//! let page = tree.add_root(BoxNode::container(Rect::from_size(800.0, 600.0)));
//! let card = tree
//!     .push_child(page, BoxNode::container(Rect::new(0.0, 0.0, 400.0, 100.0)))
//!     .unwrap();
//! let footer = tree
//!     .push_child(page, BoxNode::container(Rect::new(0.0, 120.0, 400.0, 80.0)))
//!     .unwrap();
//!
//! let mut engine = Engine::default();
//! engine.resize(&mut tree, card, None, Some(160.0)).unwrap();
//! assert_eq!(tree.rect(footer).unwrap().y, 180.0);
//! ```
//!
//! # Modules
//! - [`tree`]: the box arena, node kinds and layout parameters.
//! - [`flow`]: stack and grid measurement and placement.
//! - [`scale`]: proportional subtree scaling.
//! - [`grid`]: grid cell uniformity.
//! - [`tight_fit`]: shrinking oversized hugging containers.
//! - [`propagate`]: carrying size changes up to ancestors.
//! - [`gap`]: sibling gap inference and replay.
//! - [`ops`]: the [`Engine`] and its operations.
//! - [`contrast`]: WCAG foreground remediation.
//! - [`invariants`]: layout diagnostics.

pub mod config;
pub mod contrast;
pub mod error;
pub mod flow;
pub mod gap;
pub mod grid;
pub mod invariants;
pub mod journal;
pub mod ops;
pub mod propagate;
pub mod scale;
pub mod tight_fit;
pub mod tree;

pub use config::EngineConfig;
pub use contrast::{ContrastContext, Recolor};
pub use error::{EngineError, Result};
pub use invariants::{InvariantCode, InvariantIssue, InvariantReport, InvariantSeverity};
pub use journal::{Change, ChangeLog};
pub use ops::{BoxOperation, BoxOperationKind, Engine, OperationOutcome};
pub use tree::{
    BoxId, BoxKind, BoxNode, BoxTree, CrossAlign, GridLayout, LayoutMode, Paint, PrimaryAlign,
    Sizing, SizingMode, StackLayout, TextAutoResize, TextStyle, TreeStructureError, VectorShape,
    VectorStyle,
};
