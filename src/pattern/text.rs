//! Plain-text point format.
//!
//! A point list is written as whitespace separated `x y tension type`
//! quadruples. A pattern bank file holds one such list per line, one line per
//! pattern.

use std::fmt::Write as _;

use crate::curves::PointType;
use crate::error::{Error, Result};

use super::PPoint;

/// Serializes points as `x y tension type` quadruples.
///
/// # Examples
///
/// ```
/// use curvegate::{PPoint, PointType};
/// use curvegate::pattern::points_to_text;
///
/// let points = [
///     PPoint::new(0.0, 1.0, 0.0, PointType::Hold),
///     PPoint::new(1.0, 0.0, 0.5, PointType::Curve),
/// ];
/// assert_eq!(points_to_text(&points), "0 1 0 0 1 0 0.5 1");
/// ```
pub fn points_to_text(points: &[PPoint]) -> String {
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // writing into a String cannot fail
        let _ = write!(out, "{} {} {} {}", p.x, p.y, p.tension, p.kind.index());
    }
    out
}

/// Parses a quadruple list.
///
/// Values are clamped into range. A trailing partial quadruple, a token that
/// is not a number or an unknown type index rejects the whole list.
pub fn parse_points(text: &str) -> Result<Vec<PPoint>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() % 4 != 0 {
        return Err(Error::MalformedPoint {
            reason: format!("{} values do not form whole points", tokens.len()),
        });
    }

    tokens
        .chunks_exact(4)
        .map(|quad| {
            let x = parse_number(quad[0])?;
            let y = parse_number(quad[1])?;
            let tension = parse_number(quad[2])?;
            let index: i64 = quad[3].parse().map_err(|_| Error::MalformedPoint {
                reason: format!("invalid type '{}'", quad[3]),
            })?;
            let kind = PointType::from_index(index).ok_or(Error::UnknownPointType(index))?;
            Ok(PPoint::new(x, y, tension, kind))
        })
        .collect()
}

fn parse_number(token: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::MalformedPoint {
            reason: format!("invalid number '{token}'"),
        }),
    }
}

/// Writes a bank of point lists, one line each.
pub fn write_bank<'a, I>(lists: I) -> String
where
    I: IntoIterator<Item = &'a [PPoint]>,
{
    lists
        .into_iter()
        .map(points_to_text)
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

/// Reads up to `count` lines of a bank file.
///
/// Every line is parsed independently so one malformed line does not affect
/// the others. Lines missing from a short file come back as `None`.
pub fn read_bank(text: &str, count: usize) -> Vec<Option<Result<Vec<PPoint>>>> {
    let mut lines = text.lines();
    (0..count)
        .map(|_| lines.next().map(parse_points))
        .collect()
}
