//! Step grid compiling into a pattern.

use std::collections::VecDeque;

use rand::Rng;

use crate::curves::PointType;
use crate::pattern::{MAX_UNDO, PPoint, Pattern};

use super::cell::{Cell, CellShape, EPS, EditMode, compare_cells};

/// Source of paint library content for [`CellShape::PTool`] cells.
pub trait PaintLibrary {
    /// Points of paint slot `slot`, if it exists.
    fn paint_points(&self, slot: usize) -> Option<&[PPoint]>;
}

impl PaintLibrary for [Pattern] {
    fn paint_points(&self, slot: usize) -> Option<&[PPoint]> {
        self.get(slot).map(Pattern::points)
    }
}

/// One pointer gesture over the grid, in normalized editor coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEdit {
    pub x: f64,
    pub y: f64,
    /// Cells per period
    pub grid: usize,
    /// Continuation of a gesture rather than its first contact
    pub drag: bool,
    /// Quantize `y` to the grid's vertical divisions
    pub snap: bool,
}

/// A grid of cells that builds a pattern's points.
///
/// While open, the sequencer owns the content of one pattern: every build
/// replaces that pattern's points, and the points the pattern had before
/// opening are kept as a backup. Closing restores the backup; applying makes
/// the built points the new backup and records a pattern undo frame.
///
/// Cell edits only change cells; call [`Sequencer::build`] afterwards to
/// compile them into the pattern.
///
/// # Examples
///
/// ```
/// use curvegate::{Cell, CellShape, Pattern, Sequencer};
///
/// let mut pattern = Pattern::new(0);
/// pattern.load_triangle();
///
/// let mut seq = Sequencer::new();
/// let mut cell = Cell::new(CellShape::Line, 0, 0.0, 1.0);
/// cell.miny = 0.5;
/// cell.maxy = 0.5;
/// seq.set_cells(vec![cell]);
///
/// seq.open(&mut pattern, &[] as &[Pattern]);
/// assert_eq!(pattern.get_y_at(0.3), 0.5);
///
/// seq.close(&mut pattern);
/// assert_eq!(pattern.get_y_at(0.5), 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    cells: Vec<Cell>,
    pub edit_mode: EditMode,
    pub selected_shape: CellShape,
    /// Paint slot given to new paint-tool cells
    pub paint_tool: usize,
    pattern_idx: Option<usize>,
    backup: Vec<PPoint>,
    built: Vec<PPoint>,
    gesture_snapshot: Option<Vec<Cell>>,
    /// Invert state a drag spreads to every cell it crosses
    start_invert: bool,
    undo_stack: VecDeque<Vec<Cell>>,
    redo_stack: VecDeque<Vec<Cell>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Replaces every cell, keeping them sorted by start.
    pub fn set_cells(&mut self, cells: Vec<Cell>) {
        self.cells = cells;
        self.sort_cells();
    }

    /// Index of the pattern currently driven by the sequencer.
    pub fn pattern_index(&self) -> Option<usize> {
        self.pattern_idx
    }

    pub fn is_open(&self) -> bool {
        self.pattern_idx.is_some()
    }

    /// Points the open pattern had before the sequencer took over.
    pub fn backup(&self) -> Option<&[PPoint]> {
        self.pattern_idx.map(|_| self.backup.as_slice())
    }

    /// Points produced by the last build.
    pub fn built_points(&self) -> &[PPoint] {
        &self.built
    }

    /// Takes over `pattern`, backing up its points and building the grid.
    pub fn open<P: PaintLibrary + ?Sized>(&mut self, pattern: &mut Pattern, paints: &P) {
        self.backup = pattern.points().to_vec();
        self.pattern_idx = Some(pattern.index());
        self.build(pattern, paints);
    }

    /// Restores the backup into `pattern` and releases it.
    ///
    /// Ignored when `pattern` is not the one that was opened.
    pub fn close(&mut self, pattern: &mut Pattern) {
        if self.pattern_idx != Some(pattern.index()) {
            return;
        }
        self.pattern_idx = None;
        pattern.set_points(self.backup.clone());
    }

    /// Commits the built points to `pattern` as one undoable change.
    pub fn apply(&mut self, pattern: &mut Pattern) {
        pattern.create_undo_from(self.backup.clone());
        self.backup = self.built.clone();
    }

    /// Compiles every cell and replaces the points of `pattern`.
    pub fn build<P: PaintLibrary + ?Sized>(&mut self, pattern: &mut Pattern, paints: &P) {
        let mut points: Vec<PPoint> = Vec::new();
        for cell in &self.cells {
            for mut p in build_seg(cell, paints) {
                if p.x < 0.0 {
                    p.x += 1.0;
                }
                if p.x > 1.0 {
                    p.x -= 1.0;
                }
                points.push(PPoint::new(p.x, p.y, p.tension, p.kind));
            }
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        self.built = points.clone();
        pattern.set_points(points);
    }

    /// Removes every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Index of the first cell starting in `[minx, maxx)`.
    pub fn cell_index(&self, minx: f64, maxx: f64) -> Option<usize> {
        self.cells.iter().position(|c| c.starts_in(minx, maxx))
    }

    /// Indices of every cell starting in `[minx, maxx)`.
    pub fn cells_in_range(&self, minx: f64, maxx: f64) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.starts_in(minx, maxx))
            .map(|(i, _)| i)
            .collect()
    }

    /// Inserts a cell with the selected shape over `[minx, maxx)`, removing
    /// any cell it overlaps. Returns its index.
    pub fn add_cell(&mut self, minx: f64, maxx: f64) -> usize {
        self.cells.retain(|c| !(c.minx < maxx && c.maxx > minx));
        let cell = Cell::new(self.selected_shape, self.paint_tool, minx, maxx);
        let index = self.cells.partition_point(|c| c.minx < minx);
        self.cells.insert(index, cell);
        index
    }

    /// Removes cells overlapping `[minx, maxx)`. Unless `remove_all` is set, a
    /// cell spanning exactly that range survives.
    pub fn clear_segment(&mut self, minx: f64, maxx: f64, remove_all: bool) {
        self.cells.retain(|c| {
            let exact = (c.minx - minx).abs() < EPS && (c.maxx - maxx).abs() < EPS;
            let overlaps = c.minx < maxx - EPS && c.maxx > minx + EPS;
            !(overlaps && (!exact || remove_all))
        });
    }

    pub fn sort_cells(&mut self) {
        self.cells.sort_by(|a, b| a.minx.total_cmp(&b.minx));
    }

    /// Starts a pointer gesture; the cells as they are now become the undo
    /// frame committed by [`Sequencer::end_gesture`].
    pub fn begin_gesture(&mut self) {
        self.gesture_snapshot = Some(self.cells.clone());
    }

    pub fn end_gesture(&mut self) {
        if let Some(snapshot) = self.gesture_snapshot.take() {
            self.create_undo(snapshot);
        }
    }

    /// Applies a primary-button gesture at one grid step.
    ///
    /// With [`EditMode::Max`] and a shape selected, the step is (re)filled with
    /// that shape first. A fresh click closer to a cell's top than its bottom
    /// switches the mode to [`EditMode::Min`].
    pub fn apply_edit(&mut self, edit: CellEdit) {
        let (x1, x2) = grid_step(edit.x, edit.grid);
        let mut y = edit.y.clamp(0.0, 1.0);
        if edit.snap {
            let divisions = if edit.grid % 6 == 0 { 12.0 } else { 16.0 };
            y = (y * divisions).round() / divisions;
        }

        let can_add = self.edit_mode == EditMode::Max && self.selected_shape != CellShape::None;
        let mut is_new = false;
        if can_add {
            self.clear_segment(x1, x2, false);
            if self.cell_index(x1, x2).is_none() {
                self.add_cell(x1, x2);
                is_new = true;
            }
        }

        let indices = self.cells_in_range(x1, x2);
        let Some(&first) = indices.first() else {
            return;
        };

        if can_add {
            if self.selected_shape == CellShape::Silence {
                self.clear_segment(x1, x2, true);
                return;
            }
            let shape = self.selected_shape;
            let cell = &mut self.cells[first];
            if shape == CellShape::PTool {
                cell.ptool = self.paint_tool;
            } else {
                cell.invertx = shape == CellShape::RampUp;
            }
            cell.shape = shape;
            cell.lshape = shape;
        }

        let single_point = matches!(
            self.selected_shape,
            CellShape::Line | CellShape::LPoint | CellShape::RPoint
        );
        if self.edit_mode == EditMode::Max && !edit.drag && !single_point && !is_new {
            let cell = &self.cells[first];
            if (y - cell.miny).abs() <= (y - cell.maxy).abs() {
                self.edit_mode = EditMode::Min;
            }
        }

        let tension = y * 2.0 - 1.0;
        if self.edit_mode == EditMode::InvertX && !edit.drag {
            self.start_invert = !self.cells[first].invertx;
        }
        for i in indices {
            let mode = self.edit_mode;
            let cell = &mut self.cells[i];
            if cell.shape == CellShape::Line {
                cell.maxy = 1.0;
            }
            match mode {
                EditMode::Min => {
                    cell.miny = y;
                    cell.maxy = cell.maxy.max(y);
                }
                EditMode::Max => {
                    cell.maxy = y;
                    cell.miny = cell.miny.min(y);
                }
                EditMode::InvertX => cell.invertx = self.start_invert,
                EditMode::Tension => {
                    cell.tenatt = tension;
                    cell.tenrel = tension;
                }
                EditMode::TenAttack => {
                    if cell.invertx {
                        cell.tenrel = tension;
                    } else {
                        cell.tenatt = tension;
                    }
                }
                EditMode::TenRelease => {
                    if cell.invertx {
                        cell.tenatt = tension;
                    } else {
                        cell.tenrel = tension;
                    }
                }
                EditMode::Skew => cell.skew = tension,
            }
        }
    }

    /// Applies a secondary-button gesture: resets the attribute selected by
    /// the edit mode on every cell of the step under `x`.
    pub fn reset_edit(&mut self, x: f64, grid: usize) {
        let (x1, x2) = grid_step(x, grid);
        let mode = self.edit_mode;
        for i in self.cells_in_range(x1, x2) {
            let cell = &mut self.cells[i];
            if cell.shape == CellShape::Silence {
                continue;
            }
            match mode {
                EditMode::Min => cell.maxy = 1.0,
                EditMode::Max => cell.miny = 0.0,
                EditMode::TenAttack => cell.tenatt = 0.0,
                EditMode::TenRelease => cell.tenrel = 0.0,
                EditMode::Tension => {
                    cell.tenatt = 0.0;
                    cell.tenrel = 0.0;
                }
                EditMode::InvertX => cell.invertx = false,
                EditMode::Skew => {}
            }
        }
    }

    /// Resets the attribute selected by `mode` on every cell, as one undo frame.
    pub fn clear_mode(&mut self, mode: EditMode) {
        let snapshot = self.cells.clone();
        for cell in &mut self.cells {
            match mode {
                EditMode::Max => cell.maxy = 0.0,
                EditMode::Min => cell.miny = 0.0,
                EditMode::InvertX => cell.invertx = cell.shape == CellShape::RampUp,
                EditMode::TenAttack => {
                    if cell.invertx {
                        cell.tenrel = 0.0;
                    } else {
                        cell.tenatt = 0.0;
                    }
                }
                EditMode::TenRelease => {
                    if cell.invertx {
                        cell.tenatt = 0.0;
                    } else {
                        cell.tenrel = 0.0;
                    }
                }
                EditMode::Tension => {
                    cell.tenatt = 0.0;
                    cell.tenrel = 0.0;
                }
                EditMode::Skew => {}
            }
        }
        self.create_undo(snapshot);
    }

    /// Sets the attribute selected by `mode` to random values drawn from
    /// `[min, max]` (as a fraction of the editor height, measured upwards).
    pub fn randomize(&mut self, mode: EditMode, min: f64, max: f64, grid: usize, snap: bool) {
        let snapshot = self.cells.clone();
        let mut rng = rand::thread_rng();
        let divisions = if grid % 6 == 0 { 12.0 } else { 16.0 };

        for cell in &mut self.cells {
            let (mut rmin, mut rmax) = (min, max);
            // map the random range onto the free part of the cell's span
            if mode == EditMode::Min {
                rmin = rmin.max(1.0 - cell.maxy);
                rmax = (rmin + (max - min) * (1.0 - rmin)).max(rmax);
            } else if mode == EditMode::Max {
                rmax = rmax.min(1.0 - cell.miny);
                rmin = (rmax - (max - min) * rmax).min(rmin);
            }

            let random: f64 = rng.gen_range(0.0..=1.0);
            let mut value = rmin + (rmax - rmin) * random;
            let flag = random <= (rmax - rmin) / 2.0 + rmin;
            if snap {
                value = (value * divisions).round() / divisions;
            }
            let tension = -(value * 2.0 - 1.0);

            match mode {
                EditMode::TenAttack => {
                    if cell.invertx {
                        cell.tenrel = tension;
                    } else {
                        cell.tenatt = tension;
                    }
                }
                EditMode::TenRelease => {
                    if cell.invertx {
                        cell.tenatt = tension;
                    } else {
                        cell.tenrel = tension;
                    }
                }
                EditMode::Tension => {
                    cell.tenatt = tension;
                    cell.tenrel = tension;
                }
                EditMode::Min => cell.miny = value.min(cell.maxy),
                EditMode::Max => cell.maxy = value.max(cell.miny),
                EditMode::InvertX => cell.invertx = flag,
                EditMode::Skew => cell.skew = tension,
            }
        }
        self.create_undo(snapshot);
    }

    /// Moves every cell one grid step later, wrapping around.
    pub fn rotate_right(&mut self, grid: usize) {
        let snapshot = self.cells.clone();
        let step = 1.0 / grid.max(1) as f64;
        for cell in &mut self.cells {
            cell.minx += step;
            cell.maxx += step;
            if cell.minx >= 1.0 - EPS {
                cell.minx -= 1.0;
                cell.maxx -= 1.0;
            }
        }
        self.sort_cells();
        self.create_undo(snapshot);
    }

    /// Moves every cell one grid step earlier, wrapping around.
    pub fn rotate_left(&mut self, grid: usize) {
        let snapshot = self.cells.clone();
        let step = 1.0 / grid.max(1) as f64;
        for cell in &mut self.cells {
            cell.minx -= step;
            cell.maxx -= step;
            if cell.maxx <= EPS {
                cell.minx += 1.0;
                cell.maxx += 1.0;
            }
        }
        self.sort_cells();
        self.create_undo(snapshot);
    }

    /// Compresses the grid into the first half and repeats it in the second.
    pub fn double_pattern(&mut self) {
        let snapshot = self.cells.clone();
        let copies: Vec<Cell> = self
            .cells
            .iter()
            .map(|c| Cell {
                minx: c.minx + 1.0,
                maxx: c.maxx + 1.0,
                ..*c
            })
            .collect();
        self.cells.extend(copies);
        for cell in &mut self.cells {
            cell.minx /= 2.0;
            cell.maxx /= 2.0;
        }
        self.create_undo(snapshot);
    }

    /// Records `snapshot` as an undo frame if the cells changed since.
    pub fn create_undo(&mut self, snapshot: Vec<Cell>) {
        if compare_cells(&snapshot, &self.cells) {
            return;
        }
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) {
        let Some(cells) = self.undo_stack.pop_back() else {
            return;
        };
        let current = std::mem::replace(&mut self.cells, cells);
        self.redo_stack.push_back(current);
    }

    pub fn redo(&mut self) {
        let Some(cells) = self.redo_stack.pop_back() else {
            return;
        };
        let current = std::mem::replace(&mut self.cells, cells);
        self.undo_stack.push_back(current);
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

/// Grid step `[x1, x2)` containing `x`.
fn grid_step(x: f64, grid: usize) -> (f64, f64) {
    let width = 1.0 / grid.max(1) as f64;
    let x = x.clamp(0.0, 1.0 - 1e-8);
    let x1 = (x / width).floor() * width;
    (x1, x1 + width)
}

const RAMP: &[(f64, f64)] = &[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)];
const TRI: &[(f64, f64)] = &[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)];
const LINE: &[(f64, f64)] = &[(0.0, 1.0), (1.0, 1.0)];
const LPOINT: &[(f64, f64)] = &[(0.0, 1.0)];
const RPOINT: &[(f64, f64)] = &[(1.0, 1.0)];
const SILENCE: &[(f64, f64)] = &[(0.0, 1.0), (1.0, 1.0)];

/// A template point before it is mapped into a cell.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    x: f64,
    y: f64,
    tension: f64,
    kind: PointType,
}

/// Maps a cell's template into its rectangle.
///
/// Interior points are skewed horizontally and, when the cell carries
/// tension, each point gets the attack tension if the envelope opens towards
/// the next point and the negated release tension otherwise. Returned points
/// may lie slightly outside `[0, 1]` for cells that wrapped.
fn build_seg<P: PaintLibrary + ?Sized>(cell: &Cell, paints: &P) -> Vec<Stamp> {
    let minx = cell.minx + 1e-8;
    let maxx = cell.maxx - 1e-8;
    let width = maxx - minx;
    let (mut top, mut height) = (cell.miny, cell.maxy - cell.miny);

    let template = |raw: &[(f64, f64)]| -> Vec<Stamp> {
        raw.iter()
            .map(|&(x, y)| Stamp {
                x,
                y,
                tension: 0.0,
                kind: PointType::Curve,
            })
            .collect()
    };
    let mut stamps = match cell.shape {
        CellShape::RampUp | CellShape::RampDn => template(RAMP),
        CellShape::Tri => template(TRI),
        CellShape::Line => template(LINE),
        CellShape::LPoint => template(LPOINT),
        CellShape::RPoint => template(RPOINT),
        CellShape::PTool => paints
            .paint_points(cell.ptool)
            .map(|points| {
                points
                    .iter()
                    .map(|p| Stamp {
                        x: p.x,
                        y: p.y,
                        tension: p.tension,
                        kind: p.kind,
                    })
                    .collect()
            })
            .unwrap_or_else(|| template(SILENCE)),
        CellShape::None | CellShape::Silence => template(SILENCE),
    };

    if cell.shape == CellShape::Silence {
        // pinned to the bottom of the editor
        top = 1.0;
        height = 0.0;
    }
    if height == 0.0 && stamps.len() > 1 {
        let last = stamps[stamps.len() - 1];
        stamps.truncate(1);
        stamps.push(last);
    }

    let size = stamps.len();
    let skew = -cell.skew;
    let tensioned = cell.tenatt != 0.0 || cell.tenrel != 0.0;
    for i in 0..size {
        if tensioned {
            // a rise toward the next point, never on the last two points
            let attack = i + 2 < size && stamps[i].y < stamps[i + 1].y;
            stamps[i].tension = if attack { cell.tenatt } else { -cell.tenrel };
        }
        if i > 0 && i + 1 < size && skew != 0.0 {
            let x = stamps[i].x;
            stamps[i].x = if skew > 0.0 { x + skew * (1.0 - x) } else { x + skew * x };
        }
    }

    if cell.invertx {
        stamps = reverse_stamps(&stamps);
    }

    stamps
        .into_iter()
        .map(|s| Stamp {
            x: minx + s.x * width,
            y: top + s.y * height,
            ..s
        })
        .collect()
}

fn reverse_stamps(stamps: &[Stamp]) -> Vec<Stamp> {
    let points: Vec<PPoint> = stamps
        .iter()
        .map(|s| PPoint::new(s.x, s.y, s.tension, s.kind))
        .collect();
    let mut mirrored = Pattern::new(0);
    mirrored.set_points(points);
    mirrored.reverse();
    mirrored
        .points()
        .iter()
        .map(|p| Stamp {
            x: p.x,
            y: p.y,
            tension: p.tension,
            kind: p.kind,
        })
        .collect()
}
