//! Per-primitive measurement in millimetres.
//!
//! Every shape is scaled by the document's viewBox scale before it is
//! measured, so the flatness tolerance and all outputs are real-world units.

use std::f64::consts::PI;

use crate::models::{BoundingBox, Point, PrimitiveKind};

use super::parser::{Primitive, Scale};
use super::path;

/// Maximum chord deviation when flattening Bezier curves, in mm.
pub const FLATNESS_TOLERANCE_MM: f64 = 0.1;

/// Length, filled area, perimeter and bounds of one primitive.
///
/// `length` is the distance the laser head travels along the outline; for a
/// closed shape it equals `perimeter`. `points` is the measured polyline for
/// paths, polylines, polygons and lines, and empty for analytic shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryResult {
    pub length: f64,
    pub area: f64,
    pub perimeter: f64,
    pub bounds: BoundingBox,
    pub points: Vec<Point>,
}

impl GeometryResult {
    fn outline(length: f64, area: f64, bounds: BoundingBox) -> Self {
        GeometryResult {
            length,
            area,
            perimeter: length,
            bounds,
            points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryCalculator {
    scale: Scale,
    tolerance: f64,
}

impl GeometryCalculator {
    pub fn new(scale: Scale) -> Self {
        GeometryCalculator {
            scale,
            tolerance: FLATNESS_TOLERANCE_MM,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Measure one primitive. Never fails: missing or unparseable attributes
    /// read as 0 and produce an empty result.
    pub fn measure(&self, primitive: &Primitive) -> GeometryResult {
        match primitive.kind {
            PrimitiveKind::Rect => self.rect(primitive),
            PrimitiveKind::Circle => self.circle(primitive),
            PrimitiveKind::Ellipse => self.ellipse(primitive),
            PrimitiveKind::Line => self.line(primitive),
            PrimitiveKind::Polyline => self.poly(primitive, false),
            PrimitiveKind::Polygon => self.poly(primitive, true),
            PrimitiveKind::Path => self.path(primitive),
        }
    }

    fn x(&self, p: &Primitive, name: &str) -> f64 {
        number_attr(p, name) * self.scale.x
    }

    fn y(&self, p: &Primitive, name: &str) -> f64 {
        number_attr(p, name) * self.scale.y
    }

    fn rect(&self, p: &Primitive) -> GeometryResult {
        let x = self.x(p, "x");
        let y = self.y(p, "y");
        let w = self.x(p, "width").max(0.0);
        let h = self.y(p, "height").max(0.0);
        let mut rx = self.x(p, "rx").max(0.0);
        let mut ry = self.y(p, "ry").max(0.0);

        // A single radius applies to both axes.
        if rx == 0.0 {
            rx = ry;
        }
        if ry == 0.0 {
            ry = rx;
        }
        let rx = rx.min(w / 2.0);
        let ry = ry.min(h / 2.0);

        let mut perimeter = 2.0 * (w + h);
        let mut area = w * h;
        if rx > 0.0 && ry > 0.0 {
            area -= 4.0 * (rx * ry - PI * rx * ry / 4.0);
            perimeter = 2.0 * (w - 2.0 * rx) + 2.0 * (h - 2.0 * ry) + ellipse_perimeter(rx, ry);
        }

        GeometryResult::outline(perimeter, area, BoundingBox::new(x, y, x + w, y + h))
    }

    fn circle(&self, p: &Primitive) -> GeometryResult {
        let cx = self.x(p, "cx");
        let cy = self.y(p, "cy");
        let r = (number_attr(p, "r") * (self.scale.x + self.scale.y) / 2.0).max(0.0);

        GeometryResult::outline(
            2.0 * PI * r,
            PI * r * r,
            BoundingBox::new(cx - r, cy - r, cx + r, cy + r),
        )
    }

    fn ellipse(&self, p: &Primitive) -> GeometryResult {
        let cx = self.x(p, "cx");
        let cy = self.y(p, "cy");
        let rx = self.x(p, "rx").max(0.0);
        let ry = self.y(p, "ry").max(0.0);

        GeometryResult::outline(
            ellipse_perimeter(rx, ry),
            PI * rx * ry,
            BoundingBox::new(cx - rx, cy - ry, cx + rx, cy + ry),
        )
    }

    fn line(&self, p: &Primitive) -> GeometryResult {
        let a = Point::new(self.x(p, "x1"), self.y(p, "y1"));
        let b = Point::new(self.x(p, "x2"), self.y(p, "y2"));
        let length = a.distance_to(b);

        GeometryResult {
            length,
            area: 0.0,
            perimeter: length,
            bounds: BoundingBox::from_corners(a, b),
            points: vec![a, b],
        }
    }

    fn poly(&self, p: &Primitive, closed: bool) -> GeometryResult {
        let nums = path::parse_number_list(p.attr("points").unwrap_or_default());
        let points: Vec<Point> = nums
            .chunks_exact(2)
            .map(|c| Point::new(c[0] * self.scale.x, c[1] * self.scale.y))
            .collect();
        if points.len() < 2 {
            return GeometryResult::default();
        }

        let mut length = polyline_length(&points);
        let mut area = 0.0;
        if closed && points.len() > 2 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                length += last.distance_to(*first);
            }
            area = shoelace_area(&points);
        }

        GeometryResult {
            length,
            area,
            perimeter: length,
            bounds: BoundingBox::from_points(&points).unwrap_or_default(),
            points,
        }
    }

    fn path(&self, p: &Primitive) -> GeometryResult {
        let segments = path::parse_path_data(p.attr("d").unwrap_or_default());
        let subpaths = path::flatten(&segments, self.scale, self.tolerance);

        let length: f64 = subpaths.iter().map(|s| polyline_length(s)).sum();
        let area: f64 = subpaths.iter().map(|s| shoelace_area(s)).sum();
        let points: Vec<Point> = subpaths.into_iter().flatten().collect();

        GeometryResult {
            length,
            area,
            perimeter: length,
            bounds: BoundingBox::from_points(&points).unwrap_or_default(),
            points,
        }
    }
}

/// Plain number attribute in user units; a trailing `px` is tolerated.
fn number_attr(p: &Primitive, name: &str) -> f64 {
    p.attr(name)
        .map(|v| v.trim())
        .map(|v| v.strip_suffix("px").unwrap_or(v))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Sum of consecutive segment lengths.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Absolute polygon area by the Shoelace formula (implicitly closed).
pub fn shoelace_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice.abs() / 2.0
}

/// Ramanujan's second approximation; exact for a circle.
pub fn ellipse_perimeter(rx: f64, ry: f64) -> f64 {
    let sum = rx + ry;
    if sum <= 0.0 {
        return 0.0;
    }
    if rx == ry {
        return 2.0 * PI * rx;
    }
    let h = ((rx - ry) / sum).powi(2);
    PI * sum * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
}
