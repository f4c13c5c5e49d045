//! Biquad filter used on the transient detection sidechain.
//!
//! Coefficients follow Robert Bristow-Johnson's Audio EQ Cookbook and the
//! filter runs in direct form I. Unlike a free-running oscillator chain the
//! sample rate is only known once the host prepares playback, so it is passed
//! whenever the coefficients are recomputed.

use std::f64::consts::PI;

/// The response of a [`Biquad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Attenuates frequencies above the cutoff
    #[default]
    LowPass,
    /// Attenuates frequencies below the cutoff
    HighPass,
    /// Passes frequencies near the center with a peak gain of `q`
    BandPass,
}

/// A second order IIR filter.
///
/// A freshly created filter has all coefficients at zero and outputs silence
/// until one of [`lp`](Biquad::lp), [`hp`](Biquad::hp) or [`bp`](Biquad::bp)
/// is called.
///
/// # Examples
///
/// ```
/// use curvegate::filters::Biquad;
///
/// let mut filter = Biquad::default();
/// filter.hp(44100.0, 200.0, 0.707);
/// filter.clear(0.0);
///
/// // a step settles back to zero through a high-pass
/// let mut last = 1.0;
/// for _ in 0..44100 {
///     last = filter.df1(1.0);
/// }
/// assert!(last.abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    filter_type: FilterType,

    x0: f64,
    x1: f64,
    x2: f64,
    y0: f64,
    y1: f64,
    y2: f64,

    // normalized by a0
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Creates a filter with the given response already tuned.
    ///
    /// # Arguments
    ///
    /// * `filter_type` - Response shape
    /// * `srate` - Sample rate in Hz
    /// * `freq` - Cutoff or center frequency in Hz
    /// * `q` - Resonance, 0.707 gives a flat Butterworth response
    pub fn new(filter_type: FilterType, srate: f64, freq: f64, q: f64) -> Self {
        let mut filter = Self::default();
        filter.set(filter_type, srate, freq, q);
        filter
    }

    /// Recomputes the coefficients. The filter state is left untouched.
    pub fn set(&mut self, filter_type: FilterType, srate: f64, freq: f64, q: f64) {
        self.filter_type = filter_type;

        let q = q.max(0.001);
        // keep the cutoff below nyquist
        let ratio = if srate > 0.0 { (freq / srate).clamp(0.0, 0.49) } else { 0.0 };
        let w0 = 2.0 * PI * ratio;
        let alpha = w0.sin() / (2.0 * q);
        let scale = 1.0 / (1.0 + alpha);

        self.a1 = -2.0 * w0.cos() * scale;
        self.a2 = (1.0 - alpha) * scale;

        let (b0, b1, b2) = match filter_type {
            FilterType::LowPass => {
                let b0 = (1.0 + self.a1 + self.a2) * 0.25;
                (b0, 2.0 * b0, b0)
            }
            FilterType::HighPass => {
                let b0 = (1.0 - self.a1 + self.a2) * 0.25;
                (b0, -2.0 * b0, b0)
            }
            FilterType::BandPass => {
                let b0 = (1.0 - self.a2) * 0.5 * q;
                (b0, 0.0, -b0)
            }
        };
        self.b0 = b0;
        self.b1 = b1;
        self.b2 = b2;
    }

    /// Tunes the filter as a low-pass.
    pub fn lp(&mut self, srate: f64, freq: f64, q: f64) {
        self.set(FilterType::LowPass, srate, freq, q);
    }

    /// Tunes the filter as a high-pass.
    pub fn hp(&mut self, srate: f64, freq: f64, q: f64) {
        self.set(FilterType::HighPass, srate, freq, q);
    }

    /// Tunes the filter as a band-pass.
    pub fn bp(&mut self, srate: f64, freq: f64, q: f64) {
        self.set(FilterType::BandPass, srate, freq, q);
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Primes the state as if `input` had been fed forever.
    ///
    /// The output then starts at the steady state value instead of ringing up
    /// from zero.
    pub fn clear(&mut self, input: f64) {
        self.x0 = input;
        self.x1 = input;
        let denominator = 1.0 + self.a1 + self.a2;
        let steady = if denominator.abs() > f64::EPSILON {
            input / denominator * (self.b0 + self.b1 + self.b2)
        } else {
            0.0
        };
        self.y0 = steady;
        self.y1 = steady;
    }

    /// Processes one sample.
    ///
    /// Direct form I: `y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]`
    #[inline]
    pub fn df1(&mut self, sample: f64) -> f64 {
        self.x2 = self.x1;
        self.x1 = self.x0;
        self.x0 = sample;

        self.y2 = self.y1;
        self.y1 = self.y0;
        self.y0 = self.b0 * self.x0 + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.y0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 44100.0;

    fn sine(freq: f64, n: usize) -> impl Iterator<Item = f64> {
        (0..n).map(move |i| (2.0 * PI * freq * i as f64 / SAMPLE_RATE).sin())
    }

    // peak output after the filter has settled
    fn settled_peak(filter: &mut Biquad, freq: f64) -> f64 {
        filter.clear(0.0);
        sine(freq, 8820)
            .map(|s| filter.df1(s))
            .skip(4410)
            .fold(0.0_f64, |peak, s| peak.max(s.abs()))
    }

    #[test]
    fn test_default_outputs_silence() {
        let mut filter = Biquad::default();
        for s in sine(440.0, 100) {
            assert_eq!(filter.df1(s), 0.0);
        }
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut filter = Biquad::new(FilterType::LowPass, SAMPLE_RATE, 500.0, 0.707);
        assert!(settled_peak(&mut filter, 8000.0) < 0.05);
    }

    #[test]
    fn test_lowpass_passes_low_frequencies() {
        let mut filter = Biquad::new(FilterType::LowPass, SAMPLE_RATE, 5000.0, 0.707);
        let peak = settled_peak(&mut filter, 100.0);
        assert!(peak > 0.95 && peak < 1.05, "peak was {peak}");
    }

    #[test]
    fn test_highpass_attenuates_low_frequencies() {
        let mut filter = Biquad::default();
        filter.hp(SAMPLE_RATE, 5000.0, 0.707);
        assert!(settled_peak(&mut filter, 100.0) < 0.05);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::default();
        filter.hp(SAMPLE_RATE, 100.0, 0.707);
        filter.clear(0.0);
        let mut out = 1.0;
        for _ in 0..44100 {
            out = filter.df1(1.0);
        }
        assert!(out.abs() < 1e-3);
    }

    #[test]
    fn test_bandpass_attenuates_extremes() {
        let mut filter = Biquad::default();
        filter.bp(SAMPLE_RATE, 1000.0, 1.0);
        let center = settled_peak(&mut filter, 1000.0);
        let low = settled_peak(&mut filter, 50.0);
        let high = settled_peak(&mut filter, 15000.0);
        assert!(center > 0.9, "center was {center}");
        assert!(low < center * 0.2);
        assert!(high < center * 0.2);
    }

    #[test]
    fn test_clear_primes_steady_state() {
        let mut filter = Biquad::new(FilterType::LowPass, SAMPLE_RATE, 1000.0, 0.707);
        filter.clear(0.5);
        // unity DC gain: a constant input stays put from the first sample
        for _ in 0..64 {
            assert!((filter.df1(0.5) - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filter_stability() {
        let mut filter = Biquad::new(FilterType::LowPass, SAMPLE_RATE, 1000.0, 10.0);
        filter.clear(0.0);
        for s in sine(1000.0, 44100) {
            let out = filter.df1(s);
            assert!(out.is_finite());
            assert!(out.abs() < 20.0);
        }
    }

    #[test]
    fn test_frequency_clamping() {
        let mut filter = Biquad::new(FilterType::LowPass, SAMPLE_RATE, 100_000.0, 0.707);
        filter.clear(0.0);
        for s in sine(440.0, 1000) {
            assert!(filter.df1(s).is_finite());
        }
    }

    #[test]
    fn test_retune_keeps_type() {
        let mut filter = Biquad::default();
        filter.hp(SAMPLE_RATE, 300.0, 0.707);
        assert_eq!(filter.filter_type(), FilterType::HighPass);
        filter.lp(SAMPLE_RATE, 300.0, 0.707);
        assert_eq!(filter.filter_type(), FilterType::LowPass);
    }
}
