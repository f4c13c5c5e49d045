//! Persisted plugin state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::settings::Settings;

/// Everything saved with a host project.
///
/// Every field falls back to its default when missing. A document without a
/// `version` comes from an older format and only its parameters are used.
///
/// # Examples
///
/// ```
/// use curvegate::processor::PluginState;
///
/// let state = PluginState::from_json(r#"{"params": {"mix": 0.5}}"#).unwrap();
/// assert!(state.is_legacy());
/// assert_eq!(state.params["mix"], 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginState {
    pub version: Option<String>,
    /// Parameter values by name
    pub params: BTreeMap<String, f32>,
    pub settings: Settings,
    /// Point lists of the audio patterns as `x y tension type` text
    pub patterns: Vec<String>,
    /// Sequencer cells, one per line
    pub sequencer: Option<String>,
}

impl PluginState {
    /// Version written into new documents.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn is_legacy(&self) -> bool {
        self.version.is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_document_is_legacy_default() {
        let state = PluginState::from_json("{}").unwrap();
        assert!(state.is_legacy());
        assert!(state.params.is_empty());
        assert!(state.patterns.is_empty());
        assert_eq!(state.settings, Settings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut state = PluginState {
            version: Some(PluginState::VERSION.to_string()),
            patterns: vec!["0 1 0 1 1 0 0 1".to_string()],
            sequencer: Some(String::new()),
            ..Default::default()
        };
        state.params.insert("rate".to_string(), 2.5);
        state.settings.output_cc = 7;

        let decoded = PluginState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert!(!decoded.is_legacy());
    }

    #[test]
    fn test_invalid_json_is_state_error() {
        assert!(matches!(PluginState::from_json("{"), Err(Error::State(_))));
    }
}
