//! Sample-accurate musical position.
//!
//! The clock converts host tempo into per-sample increments and keeps two
//! running positions: `beat_pos` in quarter notes for tempo-synced playback
//! and `rate_pos` in cycles for the free running rate.

/// Musical time advanced one sample at a time.
///
/// # Examples
///
/// ```
/// use curvegate::processor::Clock;
///
/// let mut clock = Clock::new(44100.0);
/// clock.set_tempo(120.0);
/// assert_eq!(clock.samples_per_beat(), 22050);
///
/// for _ in 0..22050 {
///     clock.tick(1.0, true);
/// }
/// assert!((clock.beat_pos() - 1.0).abs() < 1e-6);
/// assert_eq!(clock.time_in_samples(), 22050);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    sample_rate: f64,
    tempo: f64,
    /// Quarter notes per sample
    beats_per_sample: f64,
    samples_per_beat: i64,
    seconds_per_beat: f64,
    beat_pos: f64,
    rate_pos: f64,
    time_in_samples: i64,
}

impl Clock {
    pub fn new(sample_rate: f64) -> Self {
        let mut clock = Self {
            sample_rate: sample_rate.max(1.0),
            tempo: 120.0,
            beats_per_sample: 0.0,
            samples_per_beat: 0,
            seconds_per_beat: 0.0,
            beat_pos: 0.0,
            rate_pos: 0.0,
            time_in_samples: 0,
        };
        clock.update();
        clock
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
        self.update();
    }

    /// Sets the tempo in BPM. Non-positive tempos are ignored.
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm > 0.0 && bpm.is_finite() {
            self.tempo = bpm;
            self.update();
        }
    }

    fn update(&mut self) {
        let beats_per_second = self.tempo / 60.0;
        self.beats_per_sample = beats_per_second / self.sample_rate;
        self.seconds_per_beat = 1.0 / beats_per_second;
        self.samples_per_beat = (self.seconds_per_beat * self.sample_rate) as i64;
    }

    /// Jumps to a host position. The rate position follows the beat position
    /// so free running playback lines up with the timeline.
    pub fn locate(&mut self, beat_pos: f64, rate_hz: f64) {
        self.beat_pos = beat_pos;
        self.rate_pos = beat_pos * self.seconds_per_beat * rate_hz;
    }

    pub fn set_time_in_samples(&mut self, samples: i64) {
        self.time_in_samples = samples;
    }

    /// Jumps back to `loop_start` once the position passes `loop_end`.
    pub fn wrap_loop(&mut self, loop_start: f64, loop_end: f64, rate_hz: f64) {
        if loop_end > loop_start && self.beat_pos >= loop_end {
            self.locate(loop_start + (self.beat_pos - loop_end), rate_hz);
        }
    }

    /// Advances both positions by one sample.
    #[inline]
    pub fn tick(&mut self, rate_hz: f64, playing: bool) {
        self.beat_pos += self.beats_per_sample;
        self.rate_pos += rate_hz / self.sample_rate;
        if playing {
            self.time_in_samples += 1;
        }
    }

    /// Pattern position for a cycle of `sync_qn` quarter notes, or the free
    /// rate when `None`, shifted by `phase` and wrapped into `[0, 1)`.
    #[inline]
    pub fn position(&self, sync_qn: Option<f64>, phase: f64) -> f64 {
        let x = match sync_qn {
            Some(qn) => self.beat_pos / qn + phase,
            None => self.rate_pos + phase,
        };
        x - x.floor()
    }

    /// Pattern distance covered by one sample.
    #[inline]
    pub fn increment(&self, sync_qn: Option<f64>, rate_hz: f64) -> f64 {
        match sync_qn {
            Some(qn) => self.beats_per_sample / qn,
            None => rate_hz / self.sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn beat_pos(&self) -> f64 {
        self.beat_pos
    }

    pub fn rate_pos(&self) -> f64 {
        self.rate_pos
    }

    pub fn samples_per_beat(&self) -> i64 {
        self.samples_per_beat
    }

    pub fn time_in_samples(&self) -> i64 {
        self.time_in_samples
    }
}
