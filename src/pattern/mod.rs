//! Envelope patterns.
//!
//! A [`Pattern`] is the editable form: sorted control points, undo history and
//! the global tension bias. A [`Curve`] is the frozen form handed to the audio
//! thread: the segments built from those points, evaluated without locking or
//! allocating.

mod clipboard;
mod curve;
mod paint;
#[allow(clippy::module_inception)]
mod pattern;
mod point;
mod tension;
mod text;

pub use clipboard::Clipboard;
pub use curve::Curve;
pub use paint::{PAINT_PRESETS, PaintRect, paint_preset};
pub use pattern::{EPS, MAX_UNDO, Pattern};
pub use point::{PPoint, compare_points};
pub use tension::TensionBias;
pub use text::{parse_points, points_to_text, read_bank, write_bank};
