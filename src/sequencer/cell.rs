//! Sequencer cells and their text form.

use std::fmt::Write as _;

use crate::error::{Error, Result};

/// Template drawn inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellShape {
    /// Nothing selected; clicking edits existing cells only
    None,
    /// Flat line at the bottom of the editor
    Silence,
    RampUp,
    RampDn,
    Tri,
    /// Single point at the cell's left edge
    LPoint,
    /// Single point at the cell's right edge
    RPoint,
    #[default]
    Line,
    /// Content of a paint library slot
    PTool,
}

impl CellShape {
    pub const ALL: [CellShape; 9] = [
        CellShape::None,
        CellShape::Silence,
        CellShape::RampUp,
        CellShape::RampDn,
        CellShape::Tri,
        CellShape::LPoint,
        CellShape::RPoint,
        CellShape::Line,
        CellShape::PTool,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i64 {
        self as i64
    }
}

/// Which cell attribute an edit gesture changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    Min,
    #[default]
    Max,
    Tension,
    TenAttack,
    TenRelease,
    InvertX,
    Skew,
}

/// One step of the sequencer grid.
///
/// `miny`/`maxy` use the pattern's screen convention: `miny` is the top of the
/// cell's span and `maxy` the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub shape: CellShape,
    /// Last shape picked for this cell, restored after toggling silence
    pub lshape: CellShape,
    /// Paint library slot used when `shape` is [`CellShape::PTool`]
    pub ptool: usize,
    pub invertx: bool,
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
    pub tenatt: f64,
    pub tenrel: f64,
    pub skew: f64,
}

impl Cell {
    /// A full-height cell spanning `[minx, maxx)`.
    pub fn new(shape: CellShape, ptool: usize, minx: f64, maxx: f64) -> Self {
        Self {
            shape,
            lshape: shape,
            ptool,
            invertx: false,
            minx,
            maxx,
            miny: 0.0,
            maxy: 1.0,
            tenatt: 0.0,
            tenrel: 0.0,
            skew: 0.0,
        }
    }

    /// Whether the cell starts inside `[minx, maxx)`.
    pub fn starts_in(&self, minx: f64, maxx: f64) -> bool {
        self.minx >= minx - EPS && self.minx < maxx - EPS
    }
}

pub(crate) const EPS: f64 = 1e-10;

/// Whether two cell lists are equal in every edited attribute.
pub fn compare_cells(a: &[Cell], b: &[Cell]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(p, q)| {
            p.invertx == q.invertx
                && p.minx == q.minx
                && p.maxx == q.maxx
                && p.miny == q.miny
                && p.maxy == q.maxy
                && p.shape == q.shape
                && p.tenatt == q.tenatt
                && p.tenrel == q.tenrel
                && p.ptool == q.ptool
                && p.skew == q.skew
        })
}

/// Writes cells one per line as
/// `shape lshape ptool invertx minx maxx miny maxy tenatt tenrel skew`.
pub fn cells_to_text(cells: &[Cell]) -> String {
    let mut out = String::new();
    for c in cells {
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {} {} {} {} {}",
            c.shape.index(),
            c.lshape.index(),
            c.ptool,
            u8::from(c.invertx),
            c.minx,
            c.maxx,
            c.miny,
            c.maxy,
            c.tenatt,
            c.tenrel,
            c.skew
        );
    }
    out
}

/// Parses the output of [`cells_to_text`]. Blank lines are skipped.
pub fn parse_cells(text: &str) -> Result<Vec<Cell>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_cell)
        .collect()
}

fn parse_cell(line: &str) -> Result<Cell> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[shape, lshape, ptool, invertx, minx, maxx, miny, maxy, tenatt, tenrel, skew] =
        fields.as_slice()
    else {
        return Err(malformed(format!("expected 11 cell fields, got {}", fields.len())));
    };

    let shape_of = |token: &str| {
        token
            .parse::<i64>()
            .ok()
            .and_then(CellShape::from_index)
            .ok_or_else(|| malformed(format!("invalid cell shape '{token}'")))
    };
    let number = |token: &str| {
        token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| malformed(format!("invalid number '{token}'")))
    };

    Ok(Cell {
        shape: shape_of(shape)?,
        lshape: shape_of(lshape)?,
        ptool: ptool
            .parse()
            .map_err(|_| malformed(format!("invalid paint slot '{ptool}'")))?,
        invertx: invertx != "0",
        minx: number(minx)?,
        maxx: number(maxx)?,
        miny: number(miny)?.clamp(0.0, 1.0),
        maxy: number(maxy)?.clamp(0.0, 1.0),
        tenatt: number(tenatt)?.clamp(-1.0, 1.0),
        tenrel: number(tenrel)?.clamp(-1.0, 1.0),
        skew: number(skew)?.clamp(-1.0, 1.0),
    })
}

fn malformed(reason: String) -> Error {
    Error::MalformedCell { reason }
}
