//! Curvegate - a curve driven envelope gate
//!
//! Hand drawn envelope patterns shape the volume of an audio stream. A pattern
//! is a list of control points joined by shaped segments; the [`processor`]
//! plays it in sync with the host tempo, once per MIDI note, or once per
//! transient detected in the audio itself.
//!
//! The building blocks are usable on their own: [`curves`] and [`pattern`]
//! for the envelope math, [`sequencer`] for step grids compiled into
//! patterns, [`filters`], [`delay`] and [`transient`] for the detection path.

pub mod atomic;
pub mod curves;
pub mod delay;
pub mod error;
pub mod filters;
pub mod pattern;
pub mod processor;
pub mod sample;
pub mod sequencer;
pub mod transient;

// Re-export commonly used types at the crate root
pub use curves::{PointType, Segment, tension_power};
pub use delay::DelayLine;
pub use error::{Error, Result};
pub use filters::{Biquad, FilterType, RcSmoother};
pub use pattern::{Clipboard, Curve, PPoint, PaintRect, Pattern, TensionBias};
pub use processor::{Controller, MidiEvent, MidiMessage, Processor, Shared, Transport};
pub use sample::Sample;
pub use sequencer::{Cell, CellShape, EditMode, Sequencer};
pub use transient::{DetectionAlgorithm, TransientDetector};
