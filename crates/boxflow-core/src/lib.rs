#![forbid(unsafe_code)]

//! Core: geometry primitives for the boxflow engine.
//!
//! # Role in boxflow
//! `boxflow-core` is the shared vocabulary for positions and extents. The
//! engine (`boxflow-layout`) stores a [`Rect`] per box and reasons about
//! padding with [`Sides`]; both are axis-addressable so layout passes can be
//! written once for the horizontal and vertical case.

pub mod geometry;

pub use geometry::{Axis, Rect, Sides, Size, round_unit};
