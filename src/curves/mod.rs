//! Segment shapes for piecewise envelope curves.
//!
//! A pattern is a list of control points; every pair of neighbouring points
//! forms a [`Segment`] whose [`PointType`] decides how the value travels from
//! the left point to the right one.

mod segment;
mod shape;

pub use segment::{Segment, tension_power};
pub use shape::PointType;
