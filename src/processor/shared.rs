//! State shared between the control thread and the audio thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use arc_swap::ArcSwap;

use crate::pattern::Curve;

use super::consts::PATTERN_COUNT;
use super::display::Display;
use super::params::{ParamId, Params};
use super::settings::Settings;

/// Everything both threads touch.
///
/// The control thread publishes finished [`Curve`]s into one slot per
/// pattern; the audio thread only loads them. Switching patterns goes through
/// a single pending index so a request is consumed exactly once.
#[derive(Debug)]
pub struct Shared {
    params: Params,
    settings: ArcSwap<Settings>,
    curves: Vec<ArcSwap<Curve>>,
    /// Pattern slot the audio thread plays
    active: AtomicUsize,
    /// Requested pattern, 1 based, 0 when nothing is queued
    queued: AtomicUsize,
    /// Set by the audio thread after a switch, cleared by the controller
    switched: AtomicBool,
    latency: AtomicUsize,
    latency_warning: AtomicBool,
    display: Display,
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    pub fn new() -> Self {
        Self {
            params: Params::new(),
            settings: ArcSwap::from_pointee(Settings::default()),
            curves: (0..PATTERN_COUNT)
                .map(|_| ArcSwap::from_pointee(Curve::default()))
                .collect(),
            active: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
            switched: AtomicBool::new(false),
            latency: AtomicUsize::new(0),
            latency_warning: AtomicBool::new(false),
            display: Display::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    pub(crate) fn settings_slot(&self) -> &ArcSwap<Settings> {
        &self.settings
    }

    pub fn store_settings(&self, settings: Settings) {
        self.settings.store(Arc::new(settings));
    }

    /// Replaces the curve the audio thread plays for pattern `index`.
    /// Out of range indices are ignored.
    pub fn publish(&self, index: usize, curve: Curve) {
        if let Some(slot) = self.curves.get(index) {
            slot.store(Arc::new(curve));
        }
    }

    /// Latest published curve of a pattern slot.
    pub fn curve(&self, index: usize) -> Arc<Curve> {
        let index = index.min(PATTERN_COUNT - 1);
        self.curves[index].load_full()
    }

    /// Pattern slot currently playing, 0 based.
    pub fn active_pattern(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active_pattern(&self, index: usize) {
        self.active.store(index, Ordering::Release);
        self.switched.store(true, Ordering::Release);
    }

    /// Pending pattern request, 1 based, 0 for none.
    pub fn queued_pattern(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    /// Requests a switch to pattern `number` (1 based). The pattern
    /// parameter follows so the host sees the selection.
    pub fn queue_pattern(&self, number: usize) {
        let number = number.clamp(1, PATTERN_COUNT);
        self.queued.store(number, Ordering::Release);
        if self.params.pattern() != number {
            self.params.set(ParamId::Pattern, number as f32);
        }
    }

    /// Consumes the pending request if it is still `number`.
    pub(crate) fn take_queued(&self, number: usize) -> bool {
        self.queued
            .compare_exchange(number, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the audio thread switched patterns since the last call.
    pub fn take_switched(&self) -> bool {
        self.switched.swap(false, Ordering::AcqRel)
    }

    /// Latency in samples the host should compensate.
    pub fn latency(&self) -> usize {
        self.latency.load(Ordering::Acquire)
    }

    pub(crate) fn set_latency(&self, samples: usize) {
        self.latency.store(samples, Ordering::Release);
    }

    /// Set when latency changed during playback; hosts usually need a
    /// restart of the transport to pick it up.
    pub fn latency_warning(&self) -> bool {
        self.latency_warning.load(Ordering::Acquire)
    }

    pub(crate) fn set_latency_warning(&self, value: bool) {
        self.latency_warning.store(value, Ordering::Release);
    }

    pub fn display(&self) -> &Display {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_consumed_once() {
        let shared = Shared::new();
        shared.queue_pattern(3);
        assert_eq!(shared.queued_pattern(), 3);
        assert_eq!(shared.params().pattern(), 3);
        assert!(!shared.take_queued(4));
        assert!(shared.take_queued(3));
        assert!(!shared.take_queued(3));
        assert_eq!(shared.queued_pattern(), 0);
    }

    #[test]
    fn test_queue_clamps() {
        let shared = Shared::new();
        shared.queue_pattern(0);
        assert_eq!(shared.queued_pattern(), 1);
        shared.queue_pattern(99);
        assert_eq!(shared.queued_pattern(), PATTERN_COUNT);
    }

    #[test]
    fn test_publish_ignores_bad_index() {
        let shared = Shared::new();
        shared.publish(PATTERN_COUNT, Curve::default());
        assert!(shared.curve(0).is_empty());
    }

    #[test]
    fn test_switch_flag() {
        let shared = Shared::new();
        shared.set_active_pattern(4);
        assert_eq!(shared.active_pattern(), 4);
        assert!(shared.take_switched());
        assert!(!shared.take_switched());
    }
}
