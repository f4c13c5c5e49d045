//! Control points.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::curves::PointType;

static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

fn next_point_id() -> u64 {
    NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A control point of a pattern.
///
/// `x` is normalized time and `y` the normalized value, where `0.0` is the
/// top of the editor (full envelope) and `1.0` the bottom. `tension` and
/// `kind` shape the segment that starts at this point.
///
/// The `id` follows a point through edits so selections survive re-sorting.
/// It takes no part in equality checks, see [`compare_points`].
#[derive(Debug, Clone)]
pub struct PPoint {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub tension: f64,
    pub kind: PointType,
}

impl PPoint {
    /// Creates a point with a fresh id. Coordinates are clamped to `[0, 1]`
    /// and tension to `[-1, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use curvegate::{PPoint, PointType};
    ///
    /// let a = PPoint::new(1.5, 0.5, 0.0, PointType::Curve);
    /// let b = PPoint::new(0.5, 0.5, 0.0, PointType::Curve);
    /// assert_eq!(a.x, 1.0);
    /// assert_ne!(a.id, b.id);
    /// ```
    pub fn new(x: f64, y: f64, tension: f64, kind: PointType) -> Self {
        Self {
            id: next_point_id(),
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            tension: tension.clamp(-1.0, 1.0),
            kind,
        }
    }

    /// Copy of this point under a new id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: next_point_id(),
            ..self.clone()
        }
    }

    /// Structural equality, ignoring the id.
    pub fn same_as(&self, other: &PPoint) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.tension == other.tension
            && self.kind == other.kind
    }
}

/// Whether two point lists describe the same curve, ignoring ids.
///
/// Used to skip undo frames for edits that changed nothing.
pub fn compare_points(a: &[PPoint], b: &[PPoint]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| p.same_as(q))
}

/// Stable sort by x; points sharing an x keep their insertion order.
pub(crate) fn sort_points(points: &mut [PPoint]) {
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
}

/// Mirrors a sorted point list horizontally.
///
/// Each point takes the shape of the segment that now starts at it. Shapes
/// that are not symmetric in time get their tension negated so the mirrored
/// segment bends the other way. Applying this twice restores the original
/// list.
pub(crate) fn reverse_points(points: &[PPoint]) -> Vec<PPoint> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let src = &points[n - 1 - i];
            let attrs = &points[(2 * n - 2 - i) % n];
            PPoint {
                id: src.id,
                x: 1.0 - src.x,
                y: src.y,
                tension: if attrs.kind.is_directional() {
                    -attrs.tension
                } else {
                    attrs.tension
                },
                kind: attrs.kind,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = PPoint::new(0.0, 0.0, 0.0, PointType::Curve);
        let b = a.duplicate();
        assert_ne!(a.id, b.id);
        assert!(a.same_as(&b));
    }

    #[test]
    fn test_compare_ignores_id() {
        let a = vec![PPoint::new(0.0, 1.0, 0.2, PointType::Hold)];
        let b = vec![PPoint::new(0.0, 1.0, 0.2, PointType::Hold)];
        let c = vec![PPoint::new(0.0, 1.0, 0.3, PointType::Hold)];
        assert!(compare_points(&a, &b));
        assert!(!compare_points(&a, &c));
        assert!(!compare_points(&a, &[]));
    }

    #[test]
    fn test_sort_is_stable() {
        let first = PPoint::new(0.5, 0.0, 0.0, PointType::Curve);
        let second = PPoint::new(0.5, 1.0, 0.0, PointType::Curve);
        let mut points = vec![
            PPoint::new(1.0, 0.0, 0.0, PointType::Curve),
            first.clone(),
            second.clone(),
            PPoint::new(0.0, 0.0, 0.0, PointType::Curve),
        ];
        sort_points(&mut points);
        assert_eq!(points[1].id, first.id);
        assert_eq!(points[2].id, second.id);
    }

    #[test]
    fn test_reverse_moves_segment_attributes() {
        let points = vec![
            PPoint::new(0.0, 1.0, 0.5, PointType::Curve),
            PPoint::new(0.25, 0.0, 0.0, PointType::Hold),
            PPoint::new(1.0, 1.0, -0.25, PointType::Wave),
        ];
        let reversed = reverse_points(&points);

        assert_eq!(reversed[0].x, 0.0);
        assert_eq!(reversed[1].x, 0.75);
        assert_eq!(reversed[2].x, 1.0);
        // segment [0, 0.75] mirrors the old Hold segment
        assert_eq!(reversed[0].kind, PointType::Hold);
        // segment [0.75, 1] mirrors the old Curve segment
        assert_eq!(reversed[1].kind, PointType::Curve);
        assert_eq!(reversed[1].tension, -0.5);
        // waves read the same both ways
        assert_eq!(reversed[2].kind, PointType::Wave);
        assert_eq!(reversed[2].tension, -0.25);
    }
}
