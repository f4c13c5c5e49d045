//! The plugin engine.
//!
//! Work is split across two threads. The control thread drives a
//! [`Controller`], which owns the editable patterns and publishes finished
//! curves. The audio thread drives a [`Processor`], which plays them. The two
//! only meet in [`Shared`]: parameter atomics, published curves, the pattern
//! switch request and the display buffers.

mod clock;
pub mod consts;
mod controller;
mod display;
mod params;
#[allow(clippy::module_inception)]
mod processor;
mod settings;
mod shared;
mod state;
mod transport;

pub use clock::Clock;
pub use controller::Controller;
pub use display::Display;
pub use params::{PARAM_COUNT, ParamId, PatSync, Params, SyncRate, Trigger};
pub use processor::{Processor, cc_value};
pub use settings::{AntiNoise, Settings};
pub use shared::Shared;
pub use state::PluginState;
pub use transport::{MidiEvent, MidiMessage, Transport};
