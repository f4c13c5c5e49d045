//! Transient detection for the audio trigger.
//!
//! One [`TransientDetector`] runs per input channel. Each keeps running
//! state, so it has to see every sample exactly once and in order.

mod detector;

pub use detector::{COOLDOWN_MILLIS, DRUMS_WINDOW_MILLIS, DetectionAlgorithm, TransientDetector};
