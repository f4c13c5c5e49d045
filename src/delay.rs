//! Ring buffer delay line.
//!
//! Used to hold back the dry signal while the transient detector looks ahead.
//! Reads address the history relative to the write cursor: `read(1)` is the
//! most recent sample, `read(size - 1)` the oldest one still stored.

use std::collections::TryReserveError;

/// A fixed-size circular buffer of past samples.
///
/// The storage can be larger than the active `size`, so shrinking and growing
/// back does not reallocate and [`reserve`](DelayLine::reserve) can make room
/// ahead of time.
///
/// # Examples
///
/// ```
/// use curvegate::DelayLine;
///
/// let mut delay = DelayLine::new(4);
/// for s in [1.0, 2.0, 3.0] {
///     delay.write(s);
/// }
/// assert_eq!(delay.read(1.0), 3.0);
/// assert_eq!(delay.read(3.0), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buffer: Vec<f64>,
    size: usize,
    write_pos: usize,
    // returned when a read falls outside the buffer
    last: f64,
}

impl DelayLine {
    /// Creates a zeroed delay line holding `size` samples.
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            size,
            write_pos: 0,
            last: 0.0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stores `sample` and advances the cursor.
    #[inline]
    pub fn write(&mut self, sample: f64) {
        if self.size == 0 {
            return;
        }
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.size {
            self.write_pos = 0;
        }
    }

    /// Reads the sample written `delay` writes ago, truncating fractions.
    ///
    /// A delay at or beyond the buffer size returns the previous read.
    #[inline]
    pub fn read(&mut self, delay: f64) -> f64 {
        if let Some(pos) = self.position(delay) {
            self.last = self.buffer[pos as usize];
        }
        self.last
    }

    /// Reads with four point cubic interpolation for fractional delays.
    ///
    /// Integer delays return exactly what [`read`](DelayLine::read) does.
    #[inline]
    pub fn read3(&mut self, delay: f64) -> f64 {
        let Some(pos) = self.position(delay) else {
            return self.last;
        };
        let size = self.size;
        let i = (pos as usize).min(size - 1);
        let f = pos - i as f64;

        let x0 = self.buffer[(i + size - 1) % size];
        let x1 = self.buffer[i];
        let x2 = self.buffer[(i + 1) % size];
        let x3 = self.buffer[(i + 2) % size];

        let mut a3 = (f * f - 1.0) * (1.0 / 6.0);
        let mut a2 = (f + 1.0) * 0.5;
        let mut a0 = a2 - 1.0;
        let mut a1 = a3 * 3.0;
        a2 -= a1;
        a0 -= a3;
        a1 -= f;
        a0 *= f;
        a1 *= f;
        a2 *= f;
        a3 *= f;
        a1 += 1.0;

        self.last = a0 * x0 + a1 * x1 + a2 * x2 + a3 * x3;
        self.last
    }

    // buffer position for a delay, or None when out of range
    fn position(&self, delay: f64) -> Option<f64> {
        let size = self.size as f64;
        if delay.is_nan() || delay < 0.0 || delay >= size {
            return None;
        }
        let mut pos = self.write_pos as f64 - delay;
        if pos < 0.0 {
            pos += size;
            // float rounding can land exactly on size
            if pos >= size {
                pos = 0.0;
            }
        }
        Some(pos)
    }

    /// Changes the active size.
    ///
    /// With `clear` the content and cursor are reset. Otherwise the stored
    /// samples are kept, any newly exposed region reads as silence and the
    /// cursor wraps into the new size. Returns `false` and leaves the line
    /// untouched if the storage could not grow.
    pub fn resize(&mut self, new_size: usize, clear: bool) -> bool {
        let new_size = new_size.max(1);
        if new_size > self.buffer.len() {
            if self.grow(new_size).is_err() {
                return false;
            }
        } else if new_size > self.size {
            self.buffer[self.size..new_size].fill(0.0);
        }

        if clear {
            self.buffer[..new_size].fill(0.0);
            self.write_pos = 0;
            self.last = 0.0;
        } else {
            self.write_pos %= new_size;
        }
        self.size = new_size;
        true
    }

    /// Makes room for `samples` without changing the active size.
    pub fn reserve(&mut self, samples: usize) -> bool {
        let extra = samples.saturating_sub(self.buffer.len());
        self.buffer.try_reserve(extra).is_ok()
    }

    /// Zeroes the stored samples.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.last = 0.0;
    }

    fn grow(&mut self, new_size: usize) -> Result<(), TryReserveError> {
        self.buffer.try_reserve(new_size - self.buffer.len())?;
        self.buffer.resize(new_size, 0.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ramp(size: usize) -> DelayLine {
        let mut delay = DelayLine::new(size);
        for i in 0..size {
            delay.write(i as f64);
        }
        delay
    }

    #[test]
    fn test_ramp_reads_back_with_offset() {
        let n = 16;
        let mut delay = ramp(n);
        for d in 0..n {
            let expected = ((n - d) % n) as f64;
            assert_eq!(delay.read(d as f64), expected, "delay {d}");
        }
    }

    #[test]
    fn test_read3_matches_read_on_integers() {
        let n = 16;
        let mut delay = ramp(n);
        for d in 0..n {
            let exact = delay.read(d as f64);
            let cubic = delay.read3(d as f64);
            assert!(approx_eq(exact, cubic), "delay {d}: {exact} vs {cubic}");
        }
    }

    #[test]
    fn test_read3_interpolates_linear_signal() {
        let mut delay = ramp(16);
        assert!(approx_eq(delay.read3(2.5), 13.5));
        assert!(approx_eq(delay.read3(4.25), 11.75));
    }

    #[test]
    fn test_out_of_range_returns_last_value() {
        let mut delay = ramp(8);
        let last = delay.read(3.0);
        assert_eq!(delay.read(8.0), last);
        assert_eq!(delay.read(100.0), last);
        assert_eq!(delay.read3(-1.0), last);
    }

    #[test]
    fn test_wraparound() {
        let mut delay = DelayLine::new(4);
        for i in 0..10 {
            delay.write(i as f64);
        }
        assert_eq!(delay.read(1.0), 9.0);
        assert_eq!(delay.read(3.0), 7.0);
    }

    #[test]
    fn test_resize_preserving_content() {
        let mut delay = ramp(8);
        assert!(delay.resize(12, false));
        assert_eq!(delay.size(), 12);
        // the cursor was at 0, so the new region sits right behind it
        assert_eq!(delay.read(1.0), 0.0);
        assert_eq!(delay.read(4.0), 0.0);
        assert_eq!(delay.read(5.0), 7.0);
        delay.write(42.0);
        assert_eq!(delay.read(1.0), 42.0);
    }

    #[test]
    fn test_resize_clearing() {
        let mut delay = ramp(8);
        assert!(delay.resize(4, true));
        for d in 0..4 {
            assert_eq!(delay.read(d as f64), 0.0);
        }
    }

    #[test]
    fn test_shrink_then_grow_exposes_silence() {
        let mut delay = ramp(8);
        delay.resize(4, false);
        delay.resize(8, false);
        for d in 1..=4 {
            assert_eq!(delay.read(d as f64), 0.0);
        }
        assert_eq!(delay.read(5.0), 3.0);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let mut delay = DelayLine::default();
        delay.write(1.0);
        assert_eq!(delay.read(0.0), 0.0);
        assert!(delay.resize(0, true));
        assert_eq!(delay.size(), 1);
    }

    #[test]
    fn test_reserve_keeps_size() {
        let mut delay = DelayLine::new(4);
        assert!(delay.reserve(1024));
        assert_eq!(delay.size(), 4);
        assert!(delay.resize(1024, true));
    }

    #[test]
    fn test_latency_compensation_order() {
        // read before write: a line of size n + 1 delays by exactly n
        let latency = 5;
        let mut delay = DelayLine::new(latency + 1);
        let mut out = Vec::new();
        for i in 1..=12 {
            out.push(delay.read(latency as f64));
            delay.write(i as f64);
        }
        assert_eq!(&out[..latency], &[0.0; 5]);
        assert_eq!(out[latency], 1.0);
        assert_eq!(out[11], 7.0);
    }
}
