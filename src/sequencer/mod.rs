//! Step sequencer.
//!
//! Cells laid on a grid are compiled into pattern points, so a step grid can
//! be drawn quickly and then refined as a regular pattern.

mod cell;
#[allow(clippy::module_inception)]
mod sequencer;

pub use cell::{Cell, CellShape, EditMode, cells_to_text, compare_cells, parse_cells};
pub use sequencer::{CellEdit, PaintLibrary, Sequencer};
