//! Per-instance options that are not host parameters.

use serde::{Deserialize, Serialize};

use crate::curves::PointType;

use super::consts::{ANTI_NOISE_HIGH_MILLIS, ANTI_NOISE_LOW_MILLIS};

/// Crossfade applied when the envelope restarts from another position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AntiNoise {
    Off,
    #[default]
    Low,
    High,
}

impl AntiNoise {
    pub fn millis(self) -> f64 {
        match self {
            AntiNoise::Off => 0.0,
            AntiNoise::Low => ANTI_NOISE_LOW_MILLIS,
            AntiNoise::High => ANTI_NOISE_HIGH_MILLIS,
        }
    }

    /// Crossfade length at a sample rate.
    pub fn samples(self, sample_rate: f64) -> usize {
        (sample_rate.max(0.0) * self.millis() / 1000.0) as usize
    }
}

/// Instance settings saved with the plugin state.
///
/// Missing fields in a saved document take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keep the envelope cycling between triggers in MIDI and audio mode
    pub always_playing: bool,
    /// Separate attack and release smoothing instead of one smooth control
    pub dual_smooth: bool,
    /// Separate attack and release tension instead of one tension control
    pub dual_tension: bool,
    /// MIDI channel (0 based) whose notes select patterns, 16 for any
    pub trigger_chn: u8,
    /// Output the filtered detection signal instead of the gated audio
    pub use_monitor: bool,
    /// Detect transients on the sidechain input
    pub use_sidechain: bool,
    pub audio_ignore_hits_while_playing: bool,
    /// Controller number plus one, 0 disables CC output
    pub output_cc: u8,
    pub output_cc_chan: u8,
    /// Note number plus one sent on audio trigger hits, 0 disables
    pub output_at_midi: u8,
    pub bipolar_cc: bool,
    /// Write the envelope itself to every output channel
    pub output_cv: bool,
    pub paint_tool: usize,
    pub paint_page: usize,
    /// Shape given to newly inserted points
    pub point_mode: PointType,
    pub anti_noise: AntiNoise,
    pub current_program: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            always_playing: false,
            dual_smooth: true,
            dual_tension: false,
            trigger_chn: 9,
            use_monitor: false,
            use_sidechain: false,
            audio_ignore_hits_while_playing: false,
            output_cc: 0,
            output_cc_chan: 0,
            output_at_midi: 0,
            bipolar_cc: false,
            output_cv: false,
            paint_tool: 0,
            paint_page: 0,
            point_mode: PointType::Curve,
            anti_noise: AntiNoise::Low,
            current_program: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"always_playing": true}"#).unwrap();
        assert!(settings.always_playing);
        assert!(settings.dual_smooth);
        assert_eq!(settings.trigger_chn, 9);
        assert_eq!(settings.anti_noise, AntiNoise::Low);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            output_cc: 12,
            point_mode: PointType::Wave,
            anti_noise: AntiNoise::High,
            current_program: Some(3),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_anti_noise_lengths() {
        assert_eq!(AntiNoise::Off.samples(48000.0), 0);
        assert_eq!(AntiNoise::Low.samples(48000.0), 72);
        assert_eq!(AntiNoise::High.samples(48000.0), 192);
    }
}
