//! Editable envelope patterns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::curves::{PointType, Segment};
use crate::error::Result;

use super::point::{reverse_points, sort_points};
use super::{Clipboard, Curve, PPoint, TensionBias, compare_points, parse_points, points_to_text};

/// Maximum number of undo (and redo) frames kept per pattern.
pub const MAX_UNDO: usize = 100;

/// Tolerance for position comparisons.
pub const EPS: f64 = 1e-10;

static NEXT_VERSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_version_id() -> u64 {
    NEXT_VERSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// A piecewise curve over normalized time `[0, 1]`.
///
/// Points are kept sorted by x. Every editing method leaves the segment list
/// stale until [`Pattern::build_segments`] is called, except the operations
/// that replace the whole point list (load, paste, undo, redo), which rebuild
/// on their own.
///
/// A pattern is owned by the control thread. The audio thread never sees it
/// directly: it evaluates [`Curve`] snapshots taken with [`Pattern::curve`].
///
/// # Examples
///
/// ```
/// use curvegate::{Pattern, PointType};
///
/// let mut pattern = Pattern::new(0);
/// pattern.insert_point(0.0, 1.0, 0.0, PointType::Hold, true);
/// pattern.insert_point(1.0, 0.0, 0.0, PointType::Hold, true);
/// pattern.build_segments();
///
/// assert_eq!(pattern.get_y_at(0.0), 1.0);
/// assert_eq!(pattern.get_y_at(0.999), 1.0);
/// assert_eq!(pattern.get_y_at(1.0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    index: usize,
    version_id: u64,
    points: Vec<PPoint>,
    curve: Curve,
    tension: TensionBias,
    undo_stack: VecDeque<Vec<PPoint>>,
    redo_stack: VecDeque<Vec<PPoint>>,
}

impl Pattern {
    /// Creates an empty pattern identified by `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            version_id: next_version_id(),
            points: Vec::new(),
            curve: Curve::default(),
            tension: TensionBias::default(),
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Identity of the current content. Changes whenever the point list is
    /// replaced wholesale, so point selections made against an older version
    /// can be dropped.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    pub fn increment_version(&mut self) {
        self.version_id = next_version_id();
    }

    pub fn points(&self) -> &[PPoint] {
        &self.points
    }

    pub fn segments(&self) -> &[Segment] {
        self.curve.segments()
    }

    /// The last built curve.
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn tension(&self) -> &TensionBias {
        &self.tension
    }

    /// Inserts a point and returns its index in the point list.
    ///
    /// Coordinates are clamped into range. With `sort` off the point is
    /// appended and the caller must sort before building segments.
    pub fn insert_point(&mut self, x: f64, y: f64, tension: f64, kind: PointType, sort: bool) -> usize {
        let point = PPoint::new(x, y, tension, kind);
        let id = point.id;
        self.points.push(point);
        if sort {
            self.sort_points();
        }
        self.points
            .iter()
            .position(|p| p.id == id)
            .unwrap_or(self.points.len() - 1)
    }

    pub fn sort_points(&mut self) {
        sort_points(&mut self.points);
    }

    /// Replaces all points, sorts them and rebuilds.
    pub fn set_points(&mut self, points: Vec<PPoint>) {
        self.points = points;
        self.sort_points();
        self.increment_version();
        self.build_segments();
    }

    /// Stores the global tension bias. Segments pick it up on the next build.
    pub fn set_tension(&mut self, mult: f64, attack: f64, release: f64, dual: bool) {
        self.tension.set(mult, attack, release, dual);
    }

    /// Removes the first point located at `(x, y)`.
    ///
    /// The last remaining point is never removed; use [`Pattern::clear`].
    pub fn remove_point_at(&mut self, x: f64, y: f64) -> bool {
        match self
            .points
            .iter()
            .position(|p| (p.x - x).abs() < EPS && (p.y - y).abs() < EPS)
        {
            Some(i) => self.remove_point(i),
            None => false,
        }
    }

    /// Removes the point at `index`. Out of range indices and removing the
    /// last remaining point are ignored.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index >= self.points.len() || self.points.len() == 1 {
            return false;
        }
        self.points.remove(index);
        true
    }

    /// Removes every point with `x1 <= x < x2`.
    pub fn remove_points_in_range(&mut self, x1: f64, x2: f64) {
        self.points.retain(|p| !(p.x >= x1 - EPS && p.x < x2 - EPS));
    }

    /// Mirrors the pattern vertically.
    pub fn invert(&mut self) {
        for p in &mut self.points {
            p.y = 1.0 - p.y;
        }
    }

    /// Mirrors the pattern horizontally.
    pub fn reverse(&mut self) {
        self.sort_points();
        self.points = reverse_points(&self.points);
    }

    /// Shifts the pattern right by `delta` periods, wrapping around.
    ///
    /// Boundary points are added at `x = 0` and `x = 1` with the value found
    /// at the cut so the full period stays covered.
    pub fn rotate(&mut self, delta: f64) {
        let delta = delta.rem_euclid(1.0);
        if self.points.is_empty() || delta == 0.0 {
            return;
        }
        self.sort_points();
        self.build_segments();

        let cut = (1.0 - delta).rem_euclid(1.0);
        let y_cut = self.get_y_at(cut);
        let (tension, kind) = self
            .points
            .iter()
            .rev()
            .find(|p| p.x <= cut)
            .or(self.points.last())
            .map(|p| (p.tension, p.kind))
            .unwrap_or_default();

        let (tail, head): (Vec<PPoint>, Vec<PPoint>) =
            self.points.drain(..).partition(|p| p.x >= cut);
        let mut rotated: Vec<PPoint> = tail
            .into_iter()
            .map(|p| PPoint { x: (p.x + delta - 1.0).clamp(0.0, 1.0), ..p })
            .chain(
                head.into_iter()
                    .map(|p| PPoint { x: (p.x + delta).clamp(0.0, 1.0), ..p }),
            )
            .collect();

        if !rotated.iter().any(|p| p.x.abs() < EPS) {
            rotated.insert(0, PPoint::new(0.0, y_cut, tension, kind));
        }
        if !rotated.iter().any(|p| (p.x - 1.0).abs() < EPS) {
            rotated.push(PPoint::new(1.0, y_cut, tension, kind));
        }
        self.points = rotated;
        self.sort_points();
    }

    /// Compresses the pattern into the first half and repeats it in the second.
    pub fn double_pattern(&mut self) {
        let half: Vec<PPoint> = self
            .points
            .iter()
            .map(|p| PPoint { x: p.x / 2.0, ..p.clone() })
            .collect();
        let copies: Vec<PPoint> = half
            .iter()
            .map(|p| PPoint { x: p.x + 0.5, ..p.duplicate() })
            .collect();
        self.points = half;
        self.points.extend(copies);
        self.sort_points();
    }

    /// Removes every point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.increment_version();
    }

    /// Rebuilds segments from the current points and tension bias.
    pub fn build_segments(&mut self) {
        self.curve = Curve::build(&self.points, &self.tension);
    }

    /// Value at normalized position `x` on the last built curve.
    pub fn get_y_at(&self, x: f64) -> f64 {
        self.curve.y_at(x)
    }

    /// Number of cycles drawn by the segment at `index`.
    pub fn wave_count(&self, index: usize) -> u32 {
        self.segments().get(index).map_or(0, Segment::wave_count)
    }

    /// Loads a single sine-like cycle.
    pub fn load_sine(&mut self) {
        self.replace_with(&[
            (0.0, 1.0, 0.33, PointType::SCurve),
            (0.5, 0.0, 0.33, PointType::SCurve),
            (1.0, 1.0, 0.33, PointType::SCurve),
        ]);
    }

    /// Loads a single linear triangle, the default pattern content.
    pub fn load_triangle(&mut self) {
        self.replace_with(&[
            (0.0, 1.0, 0.0, PointType::Curve),
            (0.5, 0.0, 0.0, PointType::Curve),
            (1.0, 1.0, 0.0, PointType::Curve),
        ]);
    }

    /// Loads `grid` random steps. The closing point repeats the first value so
    /// the pattern loops without a jump.
    pub fn load_random(&mut self, grid: usize) {
        let grid = grid.max(1);
        let mut rng = rand::thread_rng();
        let mut raw: Vec<(f64, f64, f64, PointType)> = (0..grid)
            .map(|i| (i as f64 / grid as f64, rng.gen_range(0.0..=1.0), 0.0, PointType::Curve))
            .collect();
        raw.push((1.0, raw[0].1, 0.0, PointType::Curve));
        self.replace_with(&raw);
    }

    fn replace_with(&mut self, raw: &[(f64, f64, f64, PointType)]) {
        self.set_points(
            raw.iter()
                .map(|&(x, y, tension, kind)| PPoint::new(x, y, tension, kind))
                .collect(),
        );
    }

    /// Copies the points into `clipboard`.
    pub fn copy(&self, clipboard: &Clipboard) {
        clipboard.store(&self.points);
    }

    /// Replaces the points with the clipboard contents, if any.
    pub fn paste(&mut self, clipboard: &Clipboard) {
        if let Some(points) = clipboard.contents() {
            self.set_points(points.iter().map(PPoint::duplicate).collect());
        }
    }

    /// Serializes the points as `x y tension type` quadruples.
    pub fn to_text(&self) -> String {
        points_to_text(&self.points)
    }

    /// Replaces the points with a parsed quadruple list.
    ///
    /// On a parse error the pattern is left untouched.
    pub fn load_text(&mut self, text: &str) -> Result<()> {
        let points = parse_points(text)?;
        self.set_points(points);
        Ok(())
    }

    /// Records the current points as an undo frame.
    ///
    /// Nothing is recorded when the points equal the newest frame.
    pub fn create_undo(&mut self) {
        if self
            .undo_stack
            .back()
            .is_some_and(|top| compare_points(top, &self.points))
        {
            return;
        }
        self.undo_stack.push_back(self.points.clone());
        while self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Records `snapshot`, taken before an edit, as an undo frame if the edit
    /// changed anything.
    pub fn create_undo_from(&mut self, snapshot: Vec<PPoint>) {
        if compare_points(&snapshot, &self.points) {
            return;
        }
        let current = std::mem::replace(&mut self.points, snapshot);
        self.create_undo();
        self.points = current;
    }

    /// Restores the newest undo frame. Does nothing when there is none.
    pub fn undo(&mut self) {
        let Some(points) = self.undo_stack.pop_back() else {
            return;
        };
        let current = std::mem::replace(&mut self.points, points);
        self.redo_stack.push_back(current);
        while self.redo_stack.len() > MAX_UNDO {
            self.redo_stack.pop_front();
        }
        self.increment_version();
        self.build_segments();
    }

    /// Re-applies the newest undone frame. Does nothing when there is none.
    pub fn redo(&mut self) {
        let Some(points) = self.redo_stack.pop_back() else {
            return;
        };
        let current = std::mem::replace(&mut self.points, points);
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.pop_front();
        }
        self.increment_version();
        self.build_segments();
    }

    pub fn clear_undo(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
