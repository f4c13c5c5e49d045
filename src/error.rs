//! Error types for control-thread operations.
//!
//! Nothing on the audio path returns these: the processor clamps invalid
//! input instead. They surface from parsing, state handling and file I/O.

use thiserror::Error;

/// Errors produced while loading, saving or addressing curve data.
#[derive(Error, Debug)]
pub enum Error {
    /// A point quadruple could not be read
    #[error("Malformed point data: {reason}")]
    MalformedPoint { reason: String },

    /// A sequencer cell line could not be read
    #[error("Malformed cell data: {reason}")]
    MalformedCell { reason: String },

    /// A point type index outside the known shapes
    #[error("Unknown point type: {0}")]
    UnknownPointType(i64),

    /// A parameter name that is not part of the parameter surface
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A pattern slot outside the bank
    #[error("Pattern index {index} out of range (bank holds {len})")]
    PatternIndex { index: usize, len: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// State document could not be encoded or decoded
    #[error("State error: {0}")]
    State(#[from] serde_json::Error),
}

/// Result type for curvegate operations.
pub type Result<T> = std::result::Result<T, Error>;
