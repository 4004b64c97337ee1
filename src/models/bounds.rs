//! Planar point and axis-aligned bounding box, both in millimetres.
//!
//! These are the coordinate primitives shared by the geometry calculator, the
//! analyzer and the pricing side (which only ever needs the box area). The
//! arithmetic is lyon's (euclid `Point2D`/`Box2D`); [`BoundingBox`] is the
//! serializable view reported in an analysis.

use lyon::geom::euclid::default::{Box2D, Point2D};
use serde::{Deserialize, Serialize};

/// A point in drawing space, already scaled to mm.
pub type Point = Point2D<f64>;

/// Axis-aligned bounding box in millimetres.
///
/// The default value is the zero box at the origin, which is what an analysis
/// reports when no element had a box with positive extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box spanning two corner points in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Box2D::from_points([a, b]).into()
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Box2D::from_points(points).into())
    }

    pub fn to_box2d(&self) -> Box2D<f64> {
        Box2D::new(
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.max_y),
        )
    }

    /// Smallest box containing both boxes, including zero-height ones.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let (a, b) = (self.to_box2d(), other.to_box2d());
        Box2D::from_points([a.min, a.max, b.min, b.max]).into()
    }

    pub fn width(&self) -> f64 {
        self.to_box2d().width()
    }

    pub fn height(&self) -> f64 {
        self.to_box2d().height()
    }

    pub fn area(&self) -> f64 {
        self.to_box2d().area()
    }

    /// `true` when the box extends along at least one axis.
    ///
    /// A horizontal line has positive extent even though its area is zero.
    pub fn has_extent(&self) -> bool {
        self.max_x > self.min_x || self.max_y > self.min_y
    }
}

impl From<Box2D<f64>> for BoundingBox {
    fn from(b: Box2D<f64>) -> Self {
        BoundingBox::new(b.min.x, b.min.y, b.max.x, b.max.y)
    }
}
