//! Path data (`d` attribute) tokenizer and flattener.
//!
//! [`parse_path_data`] turns the compact path grammar into a list of
//! [`PathSegment`]s; [`flatten`] resolves relative coordinates, applies the
//! document scale and replaces every curve with a polyline whose chords stay
//! within the flatness tolerance (in mm, since scaling happens first).
//!
//! Elliptical arcs are not flattened: each `A` command contributes a straight
//! chord to its endpoint.

use lyon::geom::{CubicBezierSegment, LineSegment, QuadraticBezierSegment};

use crate::models::Point;

use super::parser::Scale;

/// A closing segment shorter than this is not added again.
const CLOSE_EPSILON: f64 = 0.01;

/// Subdivision depth cap; 2^16 chords per curve is far below any tolerance.
const MAX_SUBDIVISION_DEPTH: u32 = 16;

// ── Commands ──────────────────────────────────────────────────────────────────

/// One path command with its raw (unscaled) arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    HorizontalTo(f64),
    VerticalTo(f64),
    CubicTo(Point, Point, Point),
    SmoothCubicTo(Point, Point),
    QuadTo(Point, Point),
    SmoothQuadTo(Point),
    ArcTo {
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    ClosePath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub command: PathCommand,
    /// Lowercase command letter: coordinates are offsets from the current point.
    pub relative: bool,
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a str) -> Self {
        Lexer {
            bytes: data.as_bytes(),
            pos: 0,
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// `[sign] digits [. digits] [e [sign] digits]`, so `1.5.5` is `1.5 .5`
    /// and `10-5` is `10 -5`. Values that overflow `f64` are malformed.
    fn number(&mut self) -> Option<f64> {
        self.skip_separators();
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut digits = self.eat_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            digits += self.eat_digits();
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                self.pos = mark;
            }
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
    }

    /// Arc flags are a single `0`/`1` and may be packed without separators.
    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        let b = self.peek()?;
        let value = match b {
            b'0' => false,
            b'1' => true,
            _ => return None,
        };
        self.pos += 1;
        Some(value)
    }

    fn point(&mut self) -> Option<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Some(Point::new(x, y))
    }
}

fn parse_arguments(lexer: &mut Lexer<'_>, command: u8) -> Option<PathCommand> {
    let cmd = match command.to_ascii_uppercase() {
        b'M' => PathCommand::MoveTo(lexer.point()?),
        b'L' => PathCommand::LineTo(lexer.point()?),
        b'H' => PathCommand::HorizontalTo(lexer.number()?),
        b'V' => PathCommand::VerticalTo(lexer.number()?),
        b'C' => PathCommand::CubicTo(lexer.point()?, lexer.point()?, lexer.point()?),
        b'S' => PathCommand::SmoothCubicTo(lexer.point()?, lexer.point()?),
        b'Q' => PathCommand::QuadTo(lexer.point()?, lexer.point()?),
        b'T' => PathCommand::SmoothQuadTo(lexer.point()?),
        b'A' => PathCommand::ArcTo {
            rx: lexer.number()?,
            ry: lexer.number()?,
            x_axis_rotation: lexer.number()?,
            large_arc: lexer.flag()?,
            sweep: lexer.flag()?,
            to: lexer.point()?,
        },
        b'Z' => PathCommand::ClosePath,
        _ => return None,
    };
    Some(cmd)
}

/// Tokenize path data.
///
/// Argument groups after a command letter repeat that command; extra pairs
/// after a move-to are line-tos. Parsing stops at the first malformed token
/// and keeps everything before it.
pub fn parse_path_data(data: &str) -> Vec<PathSegment> {
    let mut lexer = Lexer::new(data);
    let mut segments = Vec::new();
    let mut previous: Option<u8> = None;

    loop {
        lexer.skip_separators();
        let Some(b) = lexer.peek() else {
            break;
        };

        let command = if b.is_ascii_alphabetic() {
            lexer.pos += 1;
            b
        } else {
            match previous {
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(b'Z' | b'z') | None => break,
                Some(p) => p,
            }
        };

        let Some(parsed) = parse_arguments(&mut lexer, command) else {
            break;
        };
        segments.push(PathSegment {
            command: parsed,
            relative: command.is_ascii_lowercase(),
        });
        previous = Some(command);
    }

    segments
}

/// Numbers of a `points` attribute, up to the first malformed token.
pub fn parse_number_list(data: &str) -> Vec<f64> {
    let mut lexer = Lexer::new(data);
    std::iter::from_fn(|| lexer.number()).collect()
}

// ── Flattening ────────────────────────────────────────────────────────────────

/// Append the flattened cubic to `out`, excluding its start point.
///
/// Midpoint (de Casteljau) subdivision until both control points lie within
/// `tolerance` of the chord. The last appended point is exactly `curve.to`.
pub fn flatten_cubic(curve: &CubicBezierSegment<f64>, tolerance: f64, out: &mut Vec<Point>) {
    subdivide(curve, tolerance, 0, out);
}

fn subdivide(curve: &CubicBezierSegment<f64>, tolerance: f64, depth: u32, out: &mut Vec<Point>) {
    if depth >= MAX_SUBDIVISION_DEPTH || is_flat(curve, tolerance) {
        out.push(curve.to);
        return;
    }
    let (head, tail) = curve.split(0.5);
    subdivide(&head, tolerance, depth + 1, out);
    subdivide(&tail, tolerance, depth + 1, out);
}

fn is_flat(curve: &CubicBezierSegment<f64>, tolerance: f64) -> bool {
    let chord = LineSegment {
        from: curve.from,
        to: curve.to,
    };
    chord.distance_to_point(curve.ctrl1) <= tolerance
        && chord.distance_to_point(curve.ctrl2) <= tolerance
}

/// Control point mirrored through `center`.
fn reflect(control: Point, center: Point) -> Point {
    center + (center - control)
}

/// Resolve, scale and flatten `segments` into polylines, one per subpath.
///
/// Pen-up moves never appear inside a polyline, so summing polyline lengths
/// gives the drawn length. Subpaths with fewer than two points are dropped.
pub fn flatten(segments: &[PathSegment], scale: Scale, tolerance: f64) -> Vec<Vec<Point>> {
    let mut subpaths = Vec::new();
    let mut active: Vec<Point> = Vec::new();
    let mut current = Point::origin();
    let mut start = Point::origin();
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;

    for seg in segments {
        let origin = if seg.relative { current } else { Point::origin() };
        let resolve = |p: Point| Point::new(origin.x + p.x * scale.x, origin.y + p.y * scale.y);

        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        match seg.command {
            PathCommand::MoveTo(p) => {
                finish(&mut subpaths, &mut active);
                current = resolve(p);
                start = current;
                active.push(current);
            }
            PathCommand::LineTo(p) => {
                let to = resolve(p);
                pen_down(&mut active, current);
                active.push(to);
                current = to;
            }
            PathCommand::HorizontalTo(x) => {
                let to = Point::new(origin.x + x * scale.x, current.y);
                pen_down(&mut active, current);
                active.push(to);
                current = to;
            }
            PathCommand::VerticalTo(y) => {
                let to = Point::new(current.x, origin.y + y * scale.y);
                pen_down(&mut active, current);
                active.push(to);
                current = to;
            }
            PathCommand::CubicTo(c1, c2, to) => {
                let (c1, c2, to) = (resolve(c1), resolve(c2), resolve(to));
                pen_down(&mut active, current);
                flatten_cubic(&cubic(current, c1, c2, to), tolerance, &mut active);
                cubic_ctrl = Some(c2);
                current = to;
            }
            PathCommand::SmoothCubicTo(c2, to) => {
                let c1 = last_cubic_ctrl
                    .map(|c| reflect(c, current))
                    .unwrap_or(current);
                let (c2, to) = (resolve(c2), resolve(to));
                pen_down(&mut active, current);
                flatten_cubic(&cubic(current, c1, c2, to), tolerance, &mut active);
                cubic_ctrl = Some(c2);
                current = to;
            }
            PathCommand::QuadTo(c, to) => {
                let (c, to) = (resolve(c), resolve(to));
                pen_down(&mut active, current);
                flatten_cubic(&quad(current, c, to).to_cubic(), tolerance, &mut active);
                quad_ctrl = Some(c);
                current = to;
            }
            PathCommand::SmoothQuadTo(to) => {
                let c = last_quad_ctrl
                    .map(|c| reflect(c, current))
                    .unwrap_or(current);
                let to = resolve(to);
                pen_down(&mut active, current);
                flatten_cubic(&quad(current, c, to).to_cubic(), tolerance, &mut active);
                quad_ctrl = Some(c);
                current = to;
            }
            PathCommand::ArcTo { rx, ry, to, .. } => {
                let to = resolve(to);
                tracing::debug!(rx, ry, "arc approximated by its chord");
                pen_down(&mut active, current);
                active.push(to);
                current = to;
            }
            PathCommand::ClosePath => {
                if !active.is_empty() && current.distance_to(start) > CLOSE_EPSILON {
                    active.push(start);
                }
                finish(&mut subpaths, &mut active);
                current = start;
            }
        }

        last_cubic_ctrl = cubic_ctrl;
        last_quad_ctrl = quad_ctrl;
    }

    finish(&mut subpaths, &mut active);
    subpaths
}

fn cubic(from: Point, ctrl1: Point, ctrl2: Point, to: Point) -> CubicBezierSegment<f64> {
    CubicBezierSegment {
        from,
        ctrl1,
        ctrl2,
        to,
    }
}

fn quad(from: Point, ctrl: Point, to: Point) -> QuadraticBezierSegment<f64> {
    QuadraticBezierSegment { from, ctrl, to }
}

/// Start a polyline at `current` if drawing resumes after a close or at the
/// very beginning of a path without a move-to.
fn pen_down(active: &mut Vec<Point>, current: Point) {
    if active.is_empty() {
        active.push(current);
    }
}

fn finish(subpaths: &mut Vec<Vec<Point>>, active: &mut Vec<Point>) {
    let done = std::mem::take(active);
    if done.len() >= 2 {
        subpaths.push(done);
    }
}
