#![forbid(unsafe_code)]

//! Boxflow public facade crate.
//!
//! This crate provides the stable surface area for callers. It re-exports
//! the geometry, color and engine types from the internal crates and offers
//! a prelude for day-to-day usage.
//!
//! ```
//! use boxflow::prelude::*;
//!
//! let mut tree = BoxTree::new();
//! let page = tree.add_root(BoxNode::container(Rect::from_size(800.0, 600.0)));
//! let hero = tree
//!     .push_child(page, BoxNode::container(Rect::new(0.0, 0.0, 800.0, 400.0)))
//!     .unwrap();
//!
//! let mut engine = Engine::default();
//! let outcome = engine
//!     .apply(
//!         &mut tree,
//!         BoxOperation::Resize {
//!             target: hero,
//!             width: None,
//!             height: Some(500.0),
//!         },
//!     )
//!     .unwrap();
//! assert_ne!(outcome.before_hash, outcome.after_hash);
//! assert_eq!(tree.rect(hero).unwrap().height, 500.0);
//! ```

// --- Geometry re-exports ---------------------------------------------------

pub use boxflow_core::{Axis, Rect, Sides, Size, round_unit};

// --- Color re-exports ------------------------------------------------------

pub use boxflow_style::{ContrastFix, Rgb, contrast_ratio, ensure_contrast, relative_luminance};

// --- Engine re-exports -----------------------------------------------------

pub use boxflow_layout::{
    BoxId, BoxKind, BoxNode, BoxOperation, BoxOperationKind, BoxTree, Change, ChangeLog,
    ContrastContext, CrossAlign, Engine, EngineConfig, EngineError, GridLayout,
    InvariantReport, LayoutMode, OperationOutcome, Paint, PrimaryAlign, Recolor, Result, Sizing,
    SizingMode, StackLayout, TextAutoResize, TextStyle, VectorShape, VectorStyle,
};

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Axis, BoxId, BoxNode, BoxOperation, BoxTree, Engine, EngineConfig, EngineError,
        GridLayout, Paint, Rect, Rgb, Sides, Size, Sizing, SizingMode, StackLayout, TextStyle,
        VectorStyle,
    };

    pub use crate::{core, layout, style};
}

pub use boxflow_core as core;
pub use boxflow_layout as layout;
pub use boxflow_style as style;
