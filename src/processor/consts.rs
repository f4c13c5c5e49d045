//! Fixed sizes and timings shared by the processor and the controller.

pub use crate::pattern::MAX_UNDO;
pub use crate::transient::{COOLDOWN_MILLIS, DRUMS_WINDOW_MILLIS};

/// Number of audio patterns selectable with the pattern parameter.
pub const PATTERN_COUNT: usize = 12;

/// Number of paint library slots.
pub const PAINT_PATTERN_COUNT: usize = 32;

/// Index offset of paint patterns, keeping their ids apart from audio patterns.
pub const PAINT_PATTERN_BASE: usize = 100;

/// Look-ahead added in audio trigger mode.
pub const AUDIO_LATENCY_MILLIS: f64 = 5.0;

/// Length of the note sent for each audio trigger hit.
pub const AUDIO_NOTE_LENGTH_MILLIS: f64 = 100.0;

pub const ANTI_NOISE_LOW_MILLIS: f64 = 1.5;
pub const ANTI_NOISE_HIGH_MILLIS: f64 = 4.0;

/// Grid divisions, straight then triplet.
pub const GRID_SIZES: [usize; 9] = [4, 8, 16, 32, 64, 6, 12, 24, 48];

/// Upper bound of the waveform display width in columns.
pub const MAX_VIEW_WIDTH: usize = 1920;

/// Audio history shown by the transient monitor.
pub const MONITOR_SECONDS: f64 = 2.0;

/// Added to monitor columns that contain a hit.
pub const HIT_MARKER: f64 = 10.0;

/// Trigger channel value meaning every channel selects patterns.
pub const ANY_CHANNEL: u8 = 16;

/// Grid size for a grid parameter index, clamped to the table.
pub fn grid_size(index: usize) -> usize {
    GRID_SIZES[index.min(GRID_SIZES.len() - 1)]
}

/// Latency in samples added by audio trigger mode.
pub fn audio_latency_samples(sample_rate: f64) -> usize {
    (sample_rate.max(0.0) * AUDIO_LATENCY_MILLIS / 1000.0) as usize
}
