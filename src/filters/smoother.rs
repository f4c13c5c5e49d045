//! One-pole smoothing of the envelope value.

/// RC style low-pass with separate rise and fall coefficients.
///
/// Each coefficient comes from a time constant in seconds:
/// `a = 1 / (tau * sample_rate + 1)`. A time constant of zero gives `a = 1`,
/// which passes the input through unchanged.
///
/// # Examples
///
/// ```
/// use curvegate::filters::RcSmoother;
///
/// let mut smoother = RcSmoother::default();
/// smoother.setup(0.01, 0.0, 48000.0);
///
/// // rising values use the slow coefficient
/// let first = smoother.process(1.0, true);
/// assert!(first > 0.0 && first < 0.01);
///
/// // falling values use the instant one
/// assert_eq!(smoother.process(0.0, false), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RcSmoother {
    a: f64,
    b: f64,
    state: f64,
}

impl Default for RcSmoother {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 1.0,
            state: 0.0,
        }
    }
}

impl RcSmoother {
    /// Sets the two time constants in seconds.
    pub fn setup(&mut self, ra: f64, rb: f64, sample_rate: f64) {
        self.a = coefficient(ra, sample_rate);
        self.b = coefficient(rb, sample_rate);
    }

    /// Moves the state toward `input`, using `a` when `use_a` is set and `b`
    /// otherwise.
    #[inline]
    pub fn process(&mut self, input: f64, use_a: bool) -> f64 {
        let k = if use_a { self.a } else { self.b };
        self.state += k * (input - self.state);
        self.state
    }

    /// Jumps straight to `value`.
    pub fn reset(&mut self, value: f64) {
        self.state = value;
    }

    pub fn output(&self) -> f64 {
        self.state
    }
}

fn coefficient(tau: f64, sample_rate: f64) -> f64 {
    let denominator = tau.max(0.0) * sample_rate.max(0.0) + 1.0;
    1.0 / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_zero_time_is_passthrough() {
        let mut smoother = RcSmoother::default();
        smoother.setup(0.0, 0.0, 44100.0);
        assert_eq!(smoother.process(0.7, true), 0.7);
        assert_eq!(smoother.process(0.2, false), 0.2);
    }

    #[test]
    fn test_coefficient_formula() {
        let mut smoother = RcSmoother::default();
        smoother.setup(0.001, 0.002, 1000.0);
        // a = 1/2, b = 1/3
        assert!(approx_eq(smoother.process(1.0, true), 0.5));
        assert!(approx_eq(smoother.process(0.0, false), 0.5 - 0.5 / 3.0));
    }

    #[test]
    fn test_converges_to_input() {
        let mut smoother = RcSmoother::default();
        smoother.setup(0.005, 0.005, 44100.0);
        let mut out = 0.0;
        for _ in 0..44100 {
            out = smoother.process(1.0, true);
        }
        assert!(approx_eq(out, 1.0));
    }

    #[test]
    fn test_reset() {
        let mut smoother = RcSmoother::default();
        smoother.setup(1.0, 1.0, 44100.0);
        smoother.reset(0.4);
        assert_eq!(smoother.output(), 0.4);
        let out = smoother.process(0.4, true);
        assert!(approx_eq(out, 0.4));
    }
}
