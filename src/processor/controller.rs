//! Control thread side of the plugin.
//!
//! The [`Controller`] owns every editable pattern, the paint library and the
//! sequencer. Edits happen here, then the rebuilt curve is published to the
//! [`Shared`] slots the audio thread reads from.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pattern::{
    Clipboard, PAINT_PRESETS, PPoint, PaintRect, Pattern, paint_preset, parse_points, points_to_text,
    read_bank, write_bank,
};
use crate::sequencer::{Sequencer, cells_to_text, parse_cells};

use super::consts::{PAINT_PATTERN_BASE, PAINT_PATTERN_COUNT, PATTERN_COUNT};
use super::params::ParamId;
use super::settings::Settings;
use super::shared::Shared;
use super::state::PluginState;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TensionSnapshot {
    mult: f64,
    attack: f64,
    release: f64,
    dual: bool,
}

/// Owner of the editable plugin content.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use curvegate::processor::{Controller, Shared};
///
/// let shared = Arc::new(Shared::new());
/// let mut controller = Controller::new(Arc::clone(&shared));
///
/// controller.edit_pattern(0, |p| p.invert()).unwrap();
/// // the audio thread sees the inverted triangle
/// assert_eq!(shared.curve(0).y_at(0.5), 1.0);
/// ```
#[derive(Debug)]
pub struct Controller {
    shared: Arc<Shared>,
    patterns: Vec<Pattern>,
    paint_patterns: Vec<Pattern>,
    sequencer: Sequencer,
    clipboard: Clipboard,
    tension: Option<TensionSnapshot>,
    latency: usize,
    latency_warning: bool,
}

impl Controller {
    /// Creates a controller using the process wide clipboard.
    pub fn new(shared: Arc<Shared>) -> Self {
        Self::with_clipboard(shared, Clipboard::process_wide())
    }

    pub fn with_clipboard(shared: Arc<Shared>, clipboard: Clipboard) -> Self {
        let patterns = (0..PATTERN_COUNT)
            .map(|i| {
                let mut pattern = Pattern::new(i);
                pattern.load_triangle();
                pattern
            })
            .collect();
        let paint_patterns = (0..PAINT_PATTERN_COUNT)
            .map(|i| {
                let mut pattern = Pattern::new(PAINT_PATTERN_BASE + i);
                pattern.set_points(paint_preset(i));
                pattern
            })
            .collect();

        let mut controller = Self {
            latency: shared.latency(),
            shared,
            patterns,
            paint_patterns,
            sequencer: Sequencer::new(),
            clipboard,
            tension: None,
            latency_warning: false,
        };
        controller.sync_tension();
        controller.publish_all();
        controller
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern(&self, index: usize) -> Result<&Pattern> {
        self.patterns.get(index).ok_or(Error::PatternIndex {
            index,
            len: PATTERN_COUNT,
        })
    }

    pub fn paint_pattern(&self, slot: usize) -> Result<&Pattern> {
        self.paint_patterns.get(slot).ok_or(Error::PatternIndex {
            index: slot,
            len: PAINT_PATTERN_COUNT,
        })
    }

    /// Pattern slot the audio thread is playing.
    pub fn active_pattern(&self) -> usize {
        self.shared.active_pattern()
    }

    /// Runs `edit` on pattern `index`, then rebuilds and publishes it.
    pub fn edit_pattern<R>(&mut self, index: usize, edit: impl FnOnce(&mut Pattern) -> R) -> Result<R> {
        let pattern = self.pattern_mut(index)?;
        let result = edit(pattern);
        pattern.build_segments();
        self.publish(index);
        Ok(result)
    }

    /// Runs `edit` on paint pattern `slot` and rebuilds it.
    pub fn edit_paint_pattern<R>(&mut self, slot: usize, edit: impl FnOnce(&mut Pattern) -> R) -> Result<R> {
        let pattern = self.paint_pattern_mut(slot)?;
        let result = edit(pattern);
        pattern.build_segments();
        Ok(result)
    }

    fn pattern_mut(&mut self, index: usize) -> Result<&mut Pattern> {
        self.patterns.get_mut(index).ok_or(Error::PatternIndex {
            index,
            len: PATTERN_COUNT,
        })
    }

    fn paint_pattern_mut(&mut self, slot: usize) -> Result<&mut Pattern> {
        self.paint_patterns.get_mut(slot).ok_or(Error::PatternIndex {
            index: slot,
            len: PAINT_PATTERN_COUNT,
        })
    }

    fn publish(&self, index: usize) {
        if let Some(pattern) = self.patterns.get(index) {
            self.shared.publish(index, pattern.curve().clone());
        }
    }

    fn publish_all(&self) {
        for index in 0..self.patterns.len() {
            self.publish(index);
        }
    }

    /// Requests pattern `number` (1 based). The audio thread switches on
    /// its next quantization point, or right away when stopped.
    pub fn queue_pattern(&self, number: usize) {
        self.shared.queue_pattern(number);
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.shared.settings()
    }

    /// Publishes new instance settings.
    pub fn set_settings(&mut self, settings: Settings) {
        self.shared.store_settings(settings);
        self.sync_tension();
    }

    /// Modifies a copy of the current settings and publishes it.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) {
        let mut settings = (*self.shared.settings()).clone();
        update(&mut settings);
        self.set_settings(settings);
    }

    /// Pushes the tension parameters into every pattern if they changed.
    ///
    /// Returns whether anything was republished.
    pub fn sync_tension(&mut self) -> bool {
        let params = self.shared.params();
        let snapshot = TensionSnapshot {
            mult: params.get_f64(ParamId::Tension),
            attack: params.get_f64(ParamId::TensionAtk),
            release: params.get_f64(ParamId::TensionRel),
            dual: self.shared.settings().dual_tension,
        };
        if self.tension == Some(snapshot) {
            return false;
        }
        self.tension = Some(snapshot);

        for pattern in self.patterns.iter_mut().chain(self.paint_patterns.iter_mut()) {
            pattern.set_tension(snapshot.mult, snapshot.attack, snapshot.release, snapshot.dual);
            pattern.build_segments();
        }
        self.publish_all();
        debug!(
            mult = snapshot.mult,
            attack = snapshot.attack,
            release = snapshot.release,
            dual = snapshot.dual,
            "Republished patterns with new tension"
        );
        true
    }

    /// Catches up with what the audio thread did since the last call.
    ///
    /// Call periodically from the control thread.
    pub fn poll(&mut self) {
        self.sync_tension();

        if self.shared.take_switched() {
            let active = self.shared.active_pattern();
            debug!(pattern = active + 1, "Pattern switched");
            if self.sequencer.pattern_index().is_some_and(|index| index != active) {
                self.close_sequencer();
            }
        }

        let latency = self.shared.latency();
        if latency != self.latency {
            info!(samples = latency, "Latency changed");
            self.latency = latency;
        }
        let warning = self.shared.latency_warning();
        if warning && !self.latency_warning {
            warn!("Latency changed during playback, restart the transport");
        }
        self.latency_warning = warning;
    }

    /// Resets every pattern to the default triangle.
    pub fn init_program(&mut self) {
        self.close_sequencer();
        for pattern in &mut self.patterns {
            pattern.load_triangle();
            pattern.clear_undo();
        }
        self.publish_all();
        self.update_settings(|s| s.current_program = Some(0));
        info!("Loaded init program");
    }

    /// Restores the built-in paint presets, leaving user slots alone.
    pub fn restore_paint_presets(&mut self) {
        for (slot, pattern) in self.paint_patterns.iter_mut().enumerate().take(PAINT_PRESETS) {
            pattern.set_points(paint_preset(slot));
            pattern.clear_undo();
        }
        debug!("Restored paint presets");
    }

    /// Zeroes the tension of every point of paint pattern `slot`.
    pub fn reset_paint_tension(&mut self, slot: usize) -> Result<()> {
        self.edit_paint_pattern(slot, |pattern| {
            let points = pattern
                .points()
                .iter()
                .map(|p| PPoint { tension: 0.0, ..p.clone() })
                .collect();
            pattern.set_points(points);
        })
    }

    /// Adds `delta` to the tension of every point of paint pattern `slot`.
    pub fn nudge_paint_tension(&mut self, slot: usize, delta: f64) -> Result<()> {
        self.edit_paint_pattern(slot, |pattern| {
            let points = pattern
                .points()
                .iter()
                .map(|p| PPoint {
                    tension: (p.tension + delta).clamp(-1.0, 1.0),
                    ..p.clone()
                })
                .collect();
            pattern.set_points(points);
        })
    }

    /// Stamps the selected paint tool into pattern `index` as one undoable
    /// edit.
    pub fn apply_paint(&mut self, index: usize, rect: PaintRect, flip_x: bool, flip_y: bool) -> Result<()> {
        let slot = self.shared.settings().paint_tool.min(PAINT_PATTERN_COUNT - 1);
        let source = self.paint_patterns[slot].points().to_vec();
        self.edit_pattern(index, |pattern| {
            let snapshot = pattern.points().to_vec();
            pattern.apply_paint(rect, &source, flip_x, flip_y);
            pattern.create_undo_from(snapshot);
        })
    }

    pub fn copy_pattern(&self, index: usize) -> Result<()> {
        self.pattern(index)?.copy(&self.clipboard);
        Ok(())
    }

    pub fn paste_pattern(&mut self, index: usize) -> Result<()> {
        let clipboard = self.clipboard.clone();
        self.edit_pattern(index, |pattern| {
            pattern.create_undo();
            pattern.paste(&clipboard);
        })
    }

    pub fn undo(&mut self, index: usize) -> Result<()> {
        self.edit_pattern(index, Pattern::undo)
    }

    pub fn redo(&mut self, index: usize) -> Result<()> {
        self.edit_pattern(index, Pattern::redo)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Hands the active pattern over to the sequencer.
    pub fn open_sequencer(&mut self) {
        self.close_sequencer();
        let index = self.shared.active_pattern().min(PATTERN_COUNT - 1);
        self.sequencer
            .open(&mut self.patterns[index], self.paint_patterns.as_slice());
        self.publish(index);
        info!(pattern = index + 1, "Sequencer opened");
    }

    /// Gives the pattern back, restoring the content it had when opened.
    pub fn close_sequencer(&mut self) {
        let Some(index) = self.sequencer.pattern_index() else {
            return;
        };
        self.sequencer.close(&mut self.patterns[index]);
        self.publish(index);
        info!(pattern = index + 1, "Sequencer closed");
    }

    /// Commits the sequencer output to its pattern as an undoable edit.
    pub fn apply_sequencer(&mut self) {
        let Some(index) = self.sequencer.pattern_index() else {
            return;
        };
        self.sequencer.apply(&mut self.patterns[index]);
        info!(pattern = index + 1, "Sequencer applied");
    }

    /// Runs `edit` on the sequencer and rebuilds the pattern it drives.
    pub fn edit_sequencer<R>(&mut self, edit: impl FnOnce(&mut Sequencer) -> R) -> R {
        let result = edit(&mut self.sequencer);
        if let Some(index) = self.sequencer.pattern_index() {
            self.sequencer
                .build(&mut self.patterns[index], self.paint_patterns.as_slice());
            self.publish(index);
        }
        result
    }

    /// Pattern bank as text, one line per pattern. The pattern held by the
    /// sequencer is written with its own content rather than the grid's.
    pub fn export_patterns(&self) -> String {
        write_bank((0..PATTERN_COUNT).map(|i| self.saved_points(i)))
    }

    /// Loads a pattern bank. Malformed lines are skipped; returns how many
    /// patterns were replaced.
    pub fn import_patterns(&mut self, text: &str) -> usize {
        self.close_sequencer();
        let mut loaded = 0;
        for (index, line) in read_bank(text, PATTERN_COUNT).into_iter().enumerate() {
            match line {
                Some(Ok(points)) => {
                    let pattern = &mut self.patterns[index];
                    pattern.create_undo();
                    pattern.set_points(points);
                    self.publish(index);
                    loaded += 1;
                }
                Some(Err(err)) => warn!(pattern = index + 1, error = %err, "Skipping pattern"),
                None => {}
            }
        }
        info!(loaded, "Imported patterns");
        loaded
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export_patterns())?;
        info!(path = %path.display(), "Exported patterns");
        Ok(())
    }

    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Importing patterns");
        Ok(self.import_patterns(&text))
    }

    /// Paint library as text, one line per slot.
    pub fn export_paint_patterns(&self) -> String {
        write_bank(self.paint_patterns.iter().map(Pattern::points))
    }

    /// Loads the paint library. Malformed or empty lines keep the slot.
    pub fn import_paint_patterns(&mut self, text: &str) -> usize {
        let mut loaded = 0;
        for (slot, line) in read_bank(text, PAINT_PATTERN_COUNT).into_iter().enumerate() {
            match line {
                Some(Ok(points)) if !points.is_empty() => {
                    let pattern = &mut self.paint_patterns[slot];
                    pattern.set_points(points);
                    pattern.clear_undo();
                    loaded += 1;
                }
                Some(Err(err)) => warn!(slot, error = %err, "Skipping paint pattern"),
                _ => {}
            }
        }
        debug!(loaded, "Imported paint patterns");
        loaded
    }

    // points to persist for pattern `index`
    fn saved_points(&self, index: usize) -> &[PPoint] {
        match self.sequencer.backup() {
            Some(backup) if self.sequencer.pattern_index() == Some(index) => backup,
            _ => self.patterns[index].points(),
        }
    }

    /// Snapshot of everything saved with a project.
    pub fn save_state(&self) -> PluginState {
        let state = PluginState {
            version: Some(PluginState::VERSION.to_string()),
            params: self.shared.params().values(),
            settings: (*self.shared.settings()).clone(),
            patterns: (0..PATTERN_COUNT)
                .map(|i| points_to_text(self.saved_points(i)))
                .collect(),
            sequencer: Some(cells_to_text(self.sequencer.cells())),
        };
        info!(version = PluginState::VERSION, "Saved state");
        state
    }

    /// Restores a saved snapshot.
    ///
    /// Legacy documents only restore parameters. A malformed pattern is
    /// reset to the default triangle and loading carries on.
    pub fn load_state(&mut self, state: &PluginState) {
        self.close_sequencer();

        for name in self.shared.params().restore(&state.params) {
            warn!(name = %name, "Ignoring unknown parameter");
        }
        let Some(version) = state.version.as_deref() else {
            info!("Loaded legacy state, parameters only");
            self.sync_tension();
            return;
        };

        self.shared.store_settings(state.settings.clone());
        for (index, pattern) in self.patterns.iter_mut().enumerate() {
            pattern.clear_undo();
            match state.patterns.get(index).map(|text| parse_points(text)) {
                Some(Ok(points)) => pattern.set_points(points),
                Some(Err(err)) => {
                    warn!(pattern = index + 1, error = %err, "Malformed pattern in state");
                    pattern.load_triangle();
                }
                None => pattern.load_triangle(),
            }
        }

        if let Some(text) = &state.sequencer {
            match parse_cells(text) {
                Ok(cells) => {
                    self.sequencer.set_cells(cells);
                    self.sequencer.clear_undo();
                }
                Err(err) => warn!(error = %err, "Malformed sequencer cells in state"),
            }
        }

        self.tension = None;
        self.sync_tension();
        info!(version, "Loaded state");
    }

    pub fn save_state_json(&self) -> Result<String> {
        self.save_state().to_json()
    }

    pub fn load_state_json(&mut self, text: &str) -> Result<()> {
        let state = PluginState::from_json(text)?;
        self.load_state(&state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::PointType;
    use crate::sequencer::{Cell, CellShape};

    fn controller() -> Controller {
        Controller::with_clipboard(Arc::new(Shared::new()), Clipboard::new())
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_starts_with_triangles() {
        let c = controller();
        for i in 0..PATTERN_COUNT {
            let curve = c.shared().curve(i);
            assert_eq!(curve.y_at(0.0), 1.0);
            assert_eq!(curve.y_at(0.5), 0.0);
        }
        assert_eq!(c.paint_pattern(0).unwrap().points().len(), 2);
    }

    #[test]
    fn test_pattern_index_checked() {
        let mut c = controller();
        assert!(matches!(c.pattern(12), Err(Error::PatternIndex { index: 12, .. })));
        assert!(c.edit_pattern(40, |_| ()).is_err());
        assert!(c.paint_pattern(32).is_err());
    }

    #[test]
    fn test_tension_change_republishes() {
        let mut c = controller();
        let before = c.shared().curve(3).y_at(0.25);
        c.shared().params().set(ParamId::Tension, 0.8);
        assert!(c.sync_tension());
        assert!(!c.sync_tension());
        let after = c.shared().curve(3).y_at(0.25);
        assert!(!approx_eq(before, after));
    }

    #[test]
    fn test_paste_is_undoable() {
        let mut c = controller();
        c.edit_pattern(1, |p| p.load_text("0 0.5 0 1 1 0.5 0 1")).unwrap().unwrap();
        c.copy_pattern(1).unwrap();
        c.paste_pattern(2).unwrap();
        assert_eq!(c.shared().curve(2).y_at(0.5), 0.5);
        c.undo(2).unwrap();
        assert_eq!(c.shared().curve(2).y_at(0.5), 0.0);
    }

    #[test]
    fn test_apply_paint_uses_selected_tool() {
        let mut c = controller();
        c.update_settings(|s| s.paint_tool = 6);
        c.edit_paint_pattern(6, |p| p.load_text("0 0.25 0 0 1 0.25 0 0")).unwrap().unwrap();
        c.apply_paint(0, PaintRect::new(0.0, 0.0, 1.0, 1.0), false, false).unwrap();
        assert!(approx_eq(c.shared().curve(0).y_at(0.5), 0.25));
        c.undo(0).unwrap();
        assert_eq!(c.shared().curve(0).y_at(0.5), 0.0);
    }

    #[test]
    fn test_reset_paint_tension() {
        let mut c = controller();
        c.nudge_paint_tension(3, 0.5).unwrap();
        assert!(c.paint_pattern(3).unwrap().points().iter().all(|p| p.tension > 0.0));
        c.reset_paint_tension(3).unwrap();
        assert!(c.paint_pattern(3).unwrap().points().iter().all(|p| p.tension == 0.0));
    }

    #[test]
    fn test_sequencer_open_close_restores() {
        let mut c = controller();
        c.edit_sequencer(|seq| {
            let mut cell = Cell::new(CellShape::Line, 0, 0.0, 1.0);
            cell.miny = 0.5;
            cell.maxy = 0.5;
            seq.set_cells(vec![cell]);
        });
        let original = c.pattern(0).unwrap().to_text();
        c.open_sequencer();
        assert_eq!(c.shared().curve(0).y_at(0.3), 0.5);

        // saved state keeps the pattern content, not the grid
        assert_eq!(c.save_state().patterns[0], original);
        assert_eq!(c.export_patterns().lines().next(), Some(original.as_str()));

        c.close_sequencer();
        assert_eq!(c.shared().curve(0).y_at(0.5), 0.0);
    }

    #[test]
    fn test_switch_closes_sequencer() {
        let mut c = controller();
        c.open_sequencer();
        assert!(c.sequencer().is_open());
        c.shared().queue_pattern(3);
        assert!(c.shared().take_queued(3));
        c.shared().set_active_pattern(2);
        c.poll();
        assert!(!c.sequencer().is_open());
    }

    #[test]
    fn test_import_skips_malformed_lines() {
        let mut c = controller();
        let text = "0 0.5 0 1 1 0.5 0 1\nnot a pattern\n0 0.25 0 0 1 0.25 0 0\n";
        assert_eq!(c.import_patterns(text), 2);
        assert_eq!(c.shared().curve(0).y_at(0.5), 0.5);
        assert_eq!(c.shared().curve(1).y_at(0.5), 0.0);
        assert_eq!(c.shared().curve(2).y_at(0.5), 0.25);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut c = controller();
        c.edit_pattern(5, |p| {
            p.clear();
            p.insert_point(0.0, 0.2, 0.3, PointType::Wave, true);
            p.insert_point(1.0, 0.8, 0.0, PointType::Curve, true);
        })
        .unwrap();
        let text = c.export_patterns();
        assert_eq!(text.lines().count(), PATTERN_COUNT);

        let mut other = controller();
        assert_eq!(other.import_patterns(&text), PATTERN_COUNT);
        assert_eq!(other.pattern(5).unwrap().to_text(), c.pattern(5).unwrap().to_text());
    }

    #[test]
    fn test_state_round_trip() {
        let mut c = controller();
        c.shared().params().set(ParamId::Rate, 3.0);
        c.update_settings(|s| s.always_playing = true);
        c.edit_pattern(4, Pattern::load_sine).unwrap();
        let json = c.save_state_json().unwrap();

        let mut other = controller();
        other.load_state_json(&json).unwrap();
        assert_eq!(other.shared().params().get(ParamId::Rate), 3.0);
        assert!(other.settings().always_playing);
        assert_eq!(other.pattern(4).unwrap().to_text(), c.pattern(4).unwrap().to_text());
    }

    #[test]
    fn test_legacy_state_restores_params_only() {
        let mut c = controller();
        c.edit_pattern(0, Pattern::load_sine).unwrap();
        let sine = c.pattern(0).unwrap().to_text();

        let legacy = PluginState::from_json(r#"{"params": {"mix": 0.25}, "patterns": [""]}"#).unwrap();
        c.load_state(&legacy);
        assert_eq!(c.shared().params().get(ParamId::Mix), 0.25);
        assert_eq!(c.pattern(0).unwrap().to_text(), sine);
    }

    #[test]
    fn test_malformed_state_pattern_resets() {
        let mut c = controller();
        let mut state = c.save_state();
        state.patterns[1] = "0 1 0".to_string();
        state.patterns[2] = "0 0.5 0 1 1 0.5 0 1".to_string();
        c.load_state(&state);
        assert_eq!(c.shared().curve(1).y_at(0.5), 0.0);
        assert_eq!(c.shared().curve(2).y_at(0.5), 0.5);
    }

    #[test]
    fn test_file_errors_surface() {
        let mut c = controller();
        let missing = std::env::temp_dir().join("curvegate-missing-dir").join("bank.txt");
        assert!(matches!(c.import_from_file(&missing), Err(Error::Io(_))));
    }
}
