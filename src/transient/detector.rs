//! Envelope and energy based onset detection.

/// Time after a hit during which no new hit registers.
pub const COOLDOWN_MILLIS: f64 = 50.0;

/// Length of the energy window of [`DetectionAlgorithm::Drums`].
pub const DRUMS_WINDOW_MILLIS: f64 = 20.0;

const ATTACK_TAU: f64 = 0.1 / 1000.0;
const RELEASE_TAU: f64 = 100.0 / 1000.0;

// scale the per-sample deltas into the sensitivity range
const SIMPLE_GAIN: f64 = 10.0;
const DRUMS_GAIN: f64 = 75.0;

/// How onsets are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionAlgorithm {
    /// Peak envelope follower with fast attack and slow release
    #[default]
    Simple,
    /// RMS energy over a short window, better at separating drum hits
    Drums,
}

impl DetectionAlgorithm {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => DetectionAlgorithm::Simple,
            _ => DetectionAlgorithm::Drums,
        }
    }
}

/// Flags sudden rises of level in a single channel.
///
/// A hit needs three things at once: the rise of the measured level exceeds
/// `sense`, the absolute sample exceeds `threshold`, and no cooldown is
/// running. Detection never starts the cooldown on its own; the caller
/// decides whether a hit is accepted and calls
/// [`start_cooldown`](TransientDetector::start_cooldown).
///
/// # Examples
///
/// ```
/// use curvegate::{DetectionAlgorithm, TransientDetector};
///
/// let mut detector = TransientDetector::new(44100.0);
/// for _ in 0..1000 {
///     assert!(!detector.detect(DetectionAlgorithm::Simple, 0.0, 0.5, 0.25));
/// }
/// assert!(detector.detect(DetectionAlgorithm::Simple, 1.0, 0.5, 0.25));
/// ```
#[derive(Debug, Clone)]
pub struct TransientDetector {
    sample_rate: f64,
    cooldown: usize,
    hit: bool,

    // simple
    envelope: f64,
    prev_envelope: f64,
    attack_alpha: f64,
    release_alpha: f64,

    // drums
    energy_window: Vec<f64>,
    window_pos: usize,
    energy: f64,
    prev_energy: f64,
}

impl TransientDetector {
    pub fn new(sample_rate: f64) -> Self {
        let mut detector = Self {
            sample_rate,
            cooldown: 0,
            hit: false,
            envelope: 0.0,
            prev_envelope: 0.0,
            attack_alpha: 0.0,
            release_alpha: 0.0,
            energy_window: Vec::new(),
            window_pos: 0,
            energy: 0.0,
            prev_energy: 0.0,
        };
        detector.prepare(sample_rate);
        detector
    }

    /// Recomputes the coefficients and window for a sample rate and resets
    /// all running state. May allocate.
    pub fn prepare(&mut self, sample_rate: f64) {
        let sample_rate = sample_rate.max(1.0);
        self.sample_rate = sample_rate;
        self.attack_alpha = (-1.0 / (ATTACK_TAU * sample_rate)).exp();
        self.release_alpha = (-1.0 / (RELEASE_TAU * sample_rate)).exp();

        let window = ((sample_rate * DRUMS_WINDOW_MILLIS / 1000.0) as usize).max(1);
        self.energy_window.resize(window, 0.0);
        self.reset();
    }

    /// Clears the running state without touching the allocation.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.prev_envelope = 0.0;
        self.energy_window.fill(0.0);
        self.window_pos = 0;
        self.energy = 0.0;
        self.prev_energy = 0.0;
        self.cooldown = 0;
        self.hit = false;
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Blocks hits for the next [`COOLDOWN_MILLIS`].
    pub fn start_cooldown(&mut self) {
        self.cooldown = (self.sample_rate * COOLDOWN_MILLIS / 1000.0) as usize;
    }

    /// Samples left before hits can register again.
    pub fn cooldown(&self) -> usize {
        self.cooldown
    }

    /// Result of the latest [`detect`](TransientDetector::detect) call.
    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// Feeds one sample and reports whether it starts a transient.
    #[inline]
    pub fn detect(&mut self, algo: DetectionAlgorithm, sample: f64, threshold: f64, sense: f64) -> bool {
        let rise = match algo {
            DetectionAlgorithm::Simple => self.envelope_rise(sample),
            DetectionAlgorithm::Drums => self.energy_rise(sample),
        };

        let cooling = self.cooldown > 0;
        if cooling {
            self.cooldown -= 1;
        }

        self.hit = !cooling && rise > sense && sample.abs() > threshold;
        self.hit
    }

    fn envelope_rise(&mut self, sample: f64) -> f64 {
        let level = sample.abs();
        let alpha = if level > self.envelope {
            self.attack_alpha
        } else {
            self.release_alpha
        };
        self.envelope = alpha * self.envelope + (1.0 - alpha) * level;

        let diff = self.envelope - self.prev_envelope;
        self.prev_envelope = self.envelope;
        diff * SIMPLE_GAIN
    }

    fn energy_rise(&mut self, sample: f64) -> f64 {
        let size = self.energy_window.len();
        if size == 0 {
            return 0.0;
        }
        let power = sample * sample;
        self.energy += power - self.energy_window[self.window_pos];
        self.energy_window[self.window_pos] = power;
        self.window_pos = (self.window_pos + 1) % size;

        // the running sum can drift slightly below zero
        let rms = (self.energy.max(0.0) / size as f64).sqrt();
        let diff = rms - self.prev_energy;
        self.prev_energy = rms;
        diff * DRUMS_GAIN
    }
}
