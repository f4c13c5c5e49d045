//! Segment evaluation.
//!
//! Every shape maps the normalized position `u` in `[0, 1]` across the segment
//! to a normalized travel `f(u)` with `f(0) = 0` and `f(1) = 1`, so the curve
//! always leaves the left point at `y1` and arrives at the right point at
//! `y2`. Neighbouring segments therefore join without discontinuities.

use std::f64::consts::PI;

use super::PointType;

/// Exponent used by the power shapes for a given tension.
///
/// Zero tension is linear (exponent 1); the exponent grows geometrically with
/// |tension| and reaches roughly 117 at the extremes.
///
/// # Examples
///
/// ```
/// use curvegate::tension_power;
///
/// assert_eq!(tension_power(0.0), 1.0);
/// assert_eq!(tension_power(0.5), tension_power(-0.5));
/// assert!(tension_power(1.0) > 100.0);
/// ```
pub fn tension_power(tension: f64) -> f64 {
    1.1f64.powf(tension.clamp(-1.0, 1.0).abs() * 50.0)
}

/// One interval of a pattern between two neighbouring points.
///
/// Segments are derived from points and never edited directly. `tension` is
/// the left point's own tension; `bend` is that tension after the pattern's
/// global bias was applied, and `power` is precomputed from `bend`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub tension: f64,
    pub bend: f64,
    pub power: f64,
    pub shape: PointType,
}

impl Segment {
    /// Creates a segment and precomputes its power from `bend`.
    pub fn new(
        (x1, y1): (f64, f64),
        (x2, y2): (f64, f64),
        tension: f64,
        bend: f64,
        shape: PointType,
    ) -> Self {
        let bend = bend.clamp(-1.0, 1.0);
        Self {
            x1,
            x2,
            y1,
            y2,
            tension,
            bend,
            power: tension_power(bend),
            shape,
        }
    }

    /// Whether the value rises across the segment.
    pub fn is_rising(&self) -> bool {
        self.y2 > self.y1
    }

    /// Evaluates the segment at absolute position `x`.
    ///
    /// Positions outside `[x1, x2]` are clamped onto the segment. A zero-width
    /// segment (two points sharing an x) evaluates to `y2`.
    ///
    /// # Examples
    ///
    /// ```
    /// use curvegate::{PointType, Segment};
    ///
    /// let seg = Segment::new((0.0, 0.0), (1.0, 1.0), 0.0, 0.0, PointType::Curve);
    /// assert_eq!(seg.y_at(0.25), 0.25);
    ///
    /// let hold = Segment::new((0.0, 1.0), (1.0, 0.0), 0.0, 0.0, PointType::Hold);
    /// assert_eq!(hold.y_at(0.999), 1.0);
    /// assert_eq!(hold.y_at(1.0), 0.0);
    /// ```
    pub fn y_at(&self, x: f64) -> f64 {
        let width = self.x2 - self.x1;
        if width <= 0.0 || x >= self.x2 {
            return self.y2;
        }
        if x <= self.x1 {
            return self.y1;
        }
        if self.shape == PointType::Hold {
            return self.y1;
        }
        let u = ((x - self.x1) / width).clamp(0.0, 1.0);
        self.y1 + (self.y2 - self.y1) * self.travel(u)
    }

    /// Normalized travel `f(u)` for this segment's shape.
    fn travel(&self, u: f64) -> f64 {
        match self.shape {
            PointType::Hold => 0.0,
            PointType::Curve => ease(u, self.power, self.bend < 0.0),
            PointType::SCurve => {
                // ease-in-out for positive bend, ease-out-in for negative
                let out_first = self.bend < 0.0;
                if u < 0.5 {
                    0.5 * ease(u * 2.0, self.power, out_first)
                } else {
                    0.5 + 0.5 * ease(u * 2.0 - 1.0, self.power, !out_first)
                }
            }
            PointType::Pulse => {
                let count = pulse_count(self.tension) as f64;
                let high = (u * count).fract() >= 0.5;
                if high == (self.tension >= 0.0) { 1.0 } else { 0.0 }
            }
            PointType::Wave => {
                let strokes = stroke_count(self.tension) as f64;
                (1.0 - (PI * strokes * u).cos()) * 0.5
            }
            PointType::Triangle => {
                let v = stroke_count(self.tension) as f64 * u;
                2.0 * (v * 0.5 - (v * 0.5 + 0.5).floor()).abs()
            }
            PointType::Stairs => {
                let steps = stair_count(self.tension) as f64;
                if self.tension >= 0.0 {
                    ((u * steps).floor() / (steps - 1.0)).min(1.0)
                } else {
                    ((u * steps).ceil() / steps).min(1.0)
                }
            }
            PointType::SmoothStairs => {
                let steps = smooth_stair_count(self.tension) as f64;
                let pos = u * steps;
                let step = pos.floor();
                let frac = pos - step;
                let a = frac.powi(4);
                let b = (1.0 - frac).powi(4);
                ((step + a / (a + b)) / steps).min(1.0)
            }
        }
    }

    /// Number of cycles drawn across an oscillating segment.
    ///
    /// Wave and triangle segments always run an odd number of half cycles so
    /// they end on `y2`; the count reported here rounds that trailing half
    /// cycle up. Pulse segments report their pulse count. Other shapes report
    /// zero.
    pub fn wave_count(&self) -> u32 {
        match self.shape {
            PointType::Wave | PointType::Triangle => stroke_count(self.tension).div_ceil(2),
            PointType::Pulse => pulse_count(self.tension),
            _ => 0,
        }
    }
}

#[inline]
fn ease(u: f64, power: f64, out: bool) -> f64 {
    if out {
        1.0 - (1.0 - u).powf(power)
    } else {
        u.powf(power)
    }
}

fn pulse_count(tension: f64) -> u32 {
    ((tension * tension * 100.0).floor() as u32).max(1)
}

/// Odd number of half cycles for wave and triangle shapes.
fn stroke_count(tension: f64) -> u32 {
    2 * (tension * tension * 50.0).floor() as u32 + 1
}

fn stair_count(tension: f64) -> u32 {
    ((tension * tension * 150.0).floor() as u32).max(2)
}

fn smooth_stair_count(tension: f64) -> u32 {
    (tension * tension * 50.0).floor() as u32 + 2
}
