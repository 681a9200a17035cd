//! Path descriptors for connectors and tessellated curves.
//!
//! Emitted as compact SVG-like strings (`M 0 0 Q 50 -20 100 0`) and parsed
//! back with `winnow`, so hosts can hand the string straight to a 2D
//! context or round-trip it through storage.

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use winnow::ascii::{float, multispace0};
use winnow::combinator::{opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::one_of;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path descriptor at byte {offset}: {message}")]
pub struct PathParseError {
    pub offset: usize,
    pub message: String,
}

/// A single path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),         // control, end
    CubicTo(Point, Point, Point), // c1, c2, end
    Close,
}

/// An ordered list of path commands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathData {
    pub commands: Vec<PathCmd>,
}

impl PathData {
    /// The descriptor for a curve from `start` to `end`: a line for no
    /// controls, a quadratic for one, a cubic for two (extra controls ignored).
    pub fn curve(start: Point, controls: &[Point], end: Point) -> Self {
        let tail = match controls {
            [] => PathCmd::LineTo(end),
            [c] => PathCmd::QuadTo(*c, end),
            [c1, c2, ..] => PathCmd::CubicTo(*c1, *c2, end),
        };
        Self {
            commands: vec![PathCmd::MoveTo(start), tail],
        }
    }

    /// A polyline through `points`.
    pub fn polyline(points: &[Point]) -> Self {
        let commands = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    PathCmd::MoveTo(*p)
                } else {
                    PathCmd::LineTo(*p)
                }
            })
            .collect();
        Self { commands }
    }

    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        terminated(repeat(0.., command), multispace0)
            .parse(text)
            .map(|commands: Vec<PathCmd>| Self { commands })
            .map_err(|e| PathParseError {
                offset: e.offset(),
                message: e.inner().to_string(),
            })
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for cmd in &self.commands {
            match *cmd {
                PathCmd::MoveTo(p) => path.move_to(p),
                PathCmd::LineTo(p) => path.line_to(p),
                PathCmd::QuadTo(c, p) => path.quad_to(c, p),
                PathCmd::CubicTo(c1, c2, p) => path.curve_to(c1, c2, p),
                PathCmd::Close => path.close_path(),
            }
        }
        path
    }
}

/// Numbers are written with at most three decimals; `-0` is normalized.
fn fmt_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{r}")
    }
}

fn fmt_pt(p: Point) -> String {
    format!("{} {}", fmt_num(p.x), fmt_num(p.y))
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(p) => format!("M {}", fmt_pt(p)),
                PathCmd::LineTo(p) => format!("L {}", fmt_pt(p)),
                PathCmd::QuadTo(c, p) => format!("Q {} {}", fmt_pt(c), fmt_pt(p)),
                PathCmd::CubicTo(c1, c2, p) => {
                    format!("C {} {} {}", fmt_pt(c1), fmt_pt(c2), fmt_pt(p))
                }
                PathCmd::Close => "Z".to_string(),
            })
            .collect();
        f.write_str(&parts.join(" "))
    }
}

// ─── Parser ──────────────────────────────────────────────────────────────

fn number(input: &mut &str) -> ModalResult<f64> {
    preceded((multispace0, opt(','), multispace0), float).parse_next(input)
}

fn point(input: &mut &str) -> ModalResult<Point> {
    (number, number)
        .map(|(x, y)| Point::new(x, y))
        .parse_next(input)
}

fn command(input: &mut &str) -> ModalResult<PathCmd> {
    let letter = preceded(multispace0, one_of(['M', 'L', 'Q', 'C', 'Z'])).parse_next(input)?;
    match letter {
        'M' => point.map(PathCmd::MoveTo).parse_next(input),
        'L' => point.map(PathCmd::LineTo).parse_next(input),
        'Q' => (point, point)
            .map(|(c, p)| PathCmd::QuadTo(c, p))
            .parse_next(input),
        'C' => (point, point, point)
            .map(|(c1, c2, p)| PathCmd::CubicTo(c1, c2, p))
            .parse_next(input),
        _ => Ok(PathCmd::Close),
    }
}
