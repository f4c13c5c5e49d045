//! Filters for the detection sidechain and the envelope output.

pub mod biquad;
pub mod smoother;

pub use biquad::{Biquad, FilterType};
pub use smoother::RcSmoother;
