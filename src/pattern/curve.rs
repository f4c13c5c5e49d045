//! Immutable, evaluable view of a pattern.

use crate::curves::Segment;

use super::{PPoint, TensionBias};

/// Segments built from a sorted point list, ready for evaluation.
///
/// A `Curve` never changes after it is built. The control thread builds one
/// after every edit and hands it to the audio thread, which only ever calls
/// [`Curve::y_at`]. Evaluation does not allocate.
#[derive(Debug, Clone, Default)]
pub struct Curve {
    segments: Vec<Segment>,
    /// Runs from the last point to the first point one period later.
    wrap: Option<Segment>,
}

impl Curve {
    /// Builds segments from points sorted by x.
    ///
    /// Each segment takes its shape and tension from its left point; the bias
    /// turns that tension into the bend used by the power shapes.
    pub fn build(points: &[PPoint], bias: &TensionBias) -> Self {
        let segment = |a: &PPoint, (x2, y2): (f64, f64)| {
            Segment::new(
                (a.x, a.y),
                (x2, y2),
                a.tension,
                bias.bend(a.tension, a.y, y2),
                a.kind,
            )
        };

        let segments = points
            .windows(2)
            .map(|pair| segment(&pair[0], (pair[1].x, pair[1].y)))
            .collect();
        let wrap = match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some(segment(last, (first.x + 1.0, first.y))),
            _ => None,
        };

        Self { segments, wrap }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment connecting the last point to the next period's first.
    pub fn wrap_segment(&self) -> Option<&Segment> {
        self.wrap.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.wrap.is_none()
    }

    /// Value at normalized position `x`.
    ///
    /// `x` outside `[0, 1]` wraps around (`1.0` itself is kept so the last
    /// point stays reachable). Positions before the first or after the last
    /// point evaluate the wrap segment. An empty curve yields `0.0`.
    pub fn y_at(&self, x: f64) -> f64 {
        let Some(wrap) = self.wrap.as_ref() else {
            return 0.0;
        };
        if !x.is_finite() {
            return wrap.y1;
        }
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            // single point
            return wrap.y1;
        };

        let x = if x == 1.0 { x } else { x - x.floor() };
        if x > last.x2 {
            return wrap.y_at(x);
        }
        if x < first.x1 {
            return wrap.y_at(x + 1.0);
        }
        let index = self.segments.partition_point(|s| s.x2 < x);
        self.segments[index.min(self.segments.len() - 1)].y_at(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::PointType;

    fn points(raw: &[(f64, f64, f64, PointType)]) -> Vec<PPoint> {
        raw.iter()
            .map(|&(x, y, t, kind)| PPoint::new(x, y, t, kind))
            .collect()
    }

    #[test]
    fn test_empty_curve_is_zero() {
        let curve = Curve::build(&[], &TensionBias::default());
        assert!(curve.is_empty());
        assert_eq!(curve.y_at(0.5), 0.0);
    }

    #[test]
    fn test_single_point_is_constant() {
        let curve = Curve::build(&points(&[(0.3, 0.7, 0.0, PointType::Curve)]), &TensionBias::default());
        assert_eq!(curve.segments().len(), 0);
        assert_eq!(curve.y_at(0.0), 0.7);
        assert_eq!(curve.y_at(0.3), 0.7);
        assert_eq!(curve.y_at(0.9), 0.7);
    }

    #[test]
    fn test_segment_count() {
        let pts = points(&[
            (0.0, 0.0, 0.0, PointType::Curve),
            (0.5, 1.0, 0.0, PointType::Curve),
            (1.0, 0.0, 0.0, PointType::Curve),
        ]);
        let curve = Curve::build(&pts, &TensionBias::default());
        assert_eq!(curve.segments().len(), 2);
        assert_eq!(curve.y_at(0.25), 0.5);
        assert_eq!(curve.y_at(0.75), 0.5);
    }

    #[test]
    fn test_wraps_outside_unit_range() {
        let pts = points(&[
            (0.25, 0.0, 0.0, PointType::Curve),
            (0.75, 1.0, 0.0, PointType::Curve),
        ]);
        let curve = Curve::build(&pts, &TensionBias::default());
        // wrap segment runs from 0.75 (y=1) to 1.25 (y=0)
        assert!((curve.y_at(1.0) - 0.5).abs() < 1e-12);
        assert!((curve.y_at(0.0) - 0.5).abs() < 1e-12);
        assert!((curve.y_at(1.5) - curve.y_at(0.5)).abs() < 1e-12);
        assert!((curve.y_at(-0.5) - curve.y_at(0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_left_point_shape_governs_segment() {
        let pts = points(&[
            (0.0, 1.0, 0.0, PointType::Hold),
            (0.5, 0.0, 0.0, PointType::Curve),
            (1.0, 1.0, 0.0, PointType::Hold),
        ]);
        let curve = Curve::build(&pts, &TensionBias::default());
        assert_eq!(curve.y_at(0.4), 1.0);
        assert_eq!(curve.y_at(0.75), 0.5);
    }

    #[test]
    fn test_non_finite_input_is_safe() {
        let pts = points(&[(0.0, 0.2, 0.0, PointType::Curve), (1.0, 0.2, 0.0, PointType::Curve)]);
        let curve = Curve::build(&pts, &TensionBias::default());
        assert_eq!(curve.y_at(f64::NAN), 0.2);
        assert_eq!(curve.y_at(f64::INFINITY), 0.2);
    }
}
