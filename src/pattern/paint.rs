//! Stamping paint patterns into a pattern.

use crate::curves::PointType;

use super::point::reverse_points;
use super::{PPoint, Pattern};

/// Target rectangle of a paint stroke in normalized pattern coordinates.
///
/// `x`/`y` is the top-left corner. A zero width or height flattens the stamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PaintRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

impl Pattern {
    /// Replaces the region under `rect` with `source` scaled into it.
    ///
    /// Points in `[rect.x, rect.x + rect.width)` are removed first. A flat
    /// rectangle stamps only the source's first and last points; a rectangle
    /// that is flat in both directions stamps only the first. Segments are
    /// rebuilt afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use curvegate::{PaintRect, Pattern};
    ///
    /// let mut brush = Pattern::new(100);
    /// brush.load_triangle();
    ///
    /// let mut pattern = Pattern::new(0);
    /// pattern.load_text("0 0 0 1 1 0 0 1").unwrap();
    /// pattern.apply_paint(PaintRect::new(0.25, 0.0, 0.5, 1.0), brush.points(), false, false);
    /// assert_eq!(pattern.get_y_at(0.5), 0.0);
    /// assert_eq!(pattern.get_y_at(0.25), 1.0);
    /// ```
    pub fn apply_paint(&mut self, rect: PaintRect, source: &[PPoint], flip_x: bool, flip_y: bool) {
        let x1 = rect.x.clamp(0.0, 1.0);
        let x2 = (rect.x + rect.width).clamp(0.0, 1.0);
        self.remove_points_in_range(x1, x2);

        let mut stamp: Vec<PPoint> = match source {
            [] => Vec::new(),
            [first, ..] if rect.width == 0.0 && rect.height == 0.0 => vec![first.clone()],
            [first, .., last] if rect.width == 0.0 || rect.height == 0.0 => {
                vec![first.clone(), last.clone()]
            }
            _ => source.to_vec(),
        };
        if flip_x {
            stamp = reverse_points(&stamp);
        }
        for p in &mut stamp {
            if flip_y {
                p.y = 1.0 - p.y;
            }
        }

        for p in &stamp {
            self.insert_point(
                rect.x + p.x * rect.width,
                rect.y + p.y * rect.height,
                p.tension,
                p.kind,
                false,
            );
        }
        self.sort_points();
        self.build_segments();
    }
}

/// Built-in content for the first paint slots.
///
/// Slots past the presets start as a plain descending line.
pub fn paint_preset(slot: usize) -> Vec<PPoint> {
    use PointType::*;
    let raw: &[(f64, f64, f64, PointType)] = match slot {
        0 => &[(0.0, 1.0, 0.0, Curve), (1.0, 0.0, 0.0, Curve)],
        1 => &[(0.0, 0.0, 0.0, Curve), (1.0, 1.0, 0.0, Curve)],
        2 => &[(0.0, 1.0, 0.0, Curve), (0.5, 0.0, 0.0, Curve), (1.0, 1.0, 0.0, Curve)],
        3 => &[(0.0, 1.0, 0.6, Curve), (1.0, 0.0, 0.0, Curve)],
        4 => &[(0.0, 0.0, -0.6, Curve), (1.0, 1.0, 0.0, Curve)],
        5 => &[(0.0, 1.0, 0.4, SCurve), (0.5, 0.0, 0.4, SCurve), (1.0, 1.0, 0.0, Curve)],
        6 => &[(0.0, 0.0, 0.0, Hold), (0.5, 1.0, 0.0, Hold), (1.0, 1.0, 0.0, Curve)],
        7 => &[(0.0, 1.0, 0.2, Stairs), (1.0, 0.0, 0.0, Curve)],
        _ => &[(0.0, 1.0, 0.0, Curve), (1.0, 0.0, 0.0, Curve)],
    };
    raw.iter()
        .map(|&(x, y, tension, kind)| PPoint::new(x, y, tension, kind))
        .collect()
}

/// Number of paint slots with dedicated presets.
pub const PAINT_PRESETS: usize = 8;
