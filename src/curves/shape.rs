//! Point/segment shape kinds.

use serde::{Deserialize, Serialize};

/// Interpolation shape of a segment.
///
/// The shape stored on a point governs the segment that *starts* at that
/// point. The numeric index is the one used by the pattern text format
/// (`x y tension type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointType {
    /// Holds the left value and steps to the right value at the segment end
    Hold,
    /// Power curve, ease-in for positive tension and ease-out for negative
    #[default]
    Curve,
    /// Symmetric power curve (ease-in-out or its inverse)
    SCurve,
    /// Square pulses, count grows with |tension|
    Pulse,
    /// Cosine oscillation with an odd number of half cycles
    Wave,
    /// Linear zig-zag with an odd number of strokes
    Triangle,
    /// Quantized ramp, step count grows with |tension|
    Stairs,
    /// Quantized ramp with eased transitions between steps
    SmoothStairs,
}

impl PointType {
    /// All shapes in index order.
    pub const ALL: [PointType; 8] = [
        PointType::Hold,
        PointType::Curve,
        PointType::SCurve,
        PointType::Pulse,
        PointType::Wave,
        PointType::Triangle,
        PointType::Stairs,
        PointType::SmoothStairs,
    ];

    /// Returns the shape for a serialized index, if it names one.
    ///
    /// # Examples
    ///
    /// ```
    /// use curvegate::PointType;
    ///
    /// assert_eq!(PointType::from_index(0), Some(PointType::Hold));
    /// assert_eq!(PointType::from_index(7), Some(PointType::SmoothStairs));
    /// assert_eq!(PointType::from_index(8), None);
    /// ```
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Serialized index of this shape.
    pub fn index(self) -> i64 {
        self as i64
    }

    /// Menu label.
    pub fn name(self) -> &'static str {
        match self {
            PointType::Hold => "Hold",
            PointType::Curve => "Curve",
            PointType::SCurve => "S-Curve",
            PointType::Pulse => "Pulse",
            PointType::Wave => "Wave",
            PointType::Triangle => "Triangle",
            PointType::Stairs => "Stairs",
            PointType::SmoothStairs => "Smooth stairs",
        }
    }

    /// Whether the shape reads differently when played backwards.
    ///
    /// Mirroring such a segment in time needs its tension negated; the other
    /// shapes are symmetric and keep their tension.
    pub fn is_directional(self) -> bool {
        matches!(self, PointType::Curve | PointType::Stairs)
    }

    /// Whether the shape oscillates inside its segment.
    pub fn is_oscillating(self) -> bool {
        matches!(self, PointType::Pulse | PointType::Wave | PointType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for shape in PointType::ALL {
            assert_eq!(PointType::from_index(shape.index()), Some(shape));
        }
    }

    #[test]
    fn test_negative_index_rejected() {
        assert_eq!(PointType::from_index(-1), None);
    }

    #[test]
    fn test_default_is_curve() {
        assert_eq!(PointType::default(), PointType::Curve);
    }
}
