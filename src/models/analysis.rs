//! Analysis data model: the aggregate produced once per uploaded drawing.
//!
//! An [`Analysis`] is immutable once built by the analyzer. It is persisted by
//! an external store and re-used by any number of price calculations, so
//! re-pricing with different options never re-parses the markup.

use serde::{Deserialize, Serialize};

use super::bounds::BoundingBox;
use super::operation::OperationSet;

/// Drawable primitive type tag.
///
/// Serialized as the lowercase SVG element name (e.g. `"polyline"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl PrimitiveKind {
    /// Map an SVG element local name to a primitive kind.
    ///
    /// Returns `None` for containers (`g`, `svg`) and every non-shape element.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "path" => Some(PrimitiveKind::Path),
            "rect" => Some(PrimitiveKind::Rect),
            "circle" => Some(PrimitiveKind::Circle),
            "ellipse" => Some(PrimitiveKind::Ellipse),
            "line" => Some(PrimitiveKind::Line),
            "polyline" => Some(PrimitiveKind::Polyline),
            "polygon" => Some(PrimitiveKind::Polygon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Path => "path",
            PrimitiveKind::Rect => "rect",
            PrimitiveKind::Circle => "circle",
            PrimitiveKind::Ellipse => "ellipse",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Polyline => "polyline",
            PrimitiveKind::Polygon => "polygon",
        }
    }
}

/// Per-primitive outcome of classification and measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResult {
    pub kind: PrimitiveKind,
    /// The element's `id` attribute, if it had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Stroke colour exactly as written in the markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Fill colour exactly as written in the markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub operations: OperationSet,
    pub length_mm: f64,
    pub area_mm2: f64,
    pub perimeter_mm: f64,
    pub bounds: BoundingBox,
}

/// Aggregated geometry of one uploaded drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// SHA-256 hex digest of the raw markup (dedup key).
    pub content_hash: String,
    /// Document width in mm.
    pub width_mm: f64,
    /// Document height in mm.
    pub height_mm: f64,
    /// viewBox → mm scale along X.
    pub scale_x: f64,
    /// viewBox → mm scale along Y.
    pub scale_y: f64,
    /// Total length of cut-tagged elements.
    pub cut_length_mm: f64,
    /// Total length of vector-engrave-tagged elements.
    pub vector_length_mm: f64,
    /// Total filled area of raster-engrave-tagged elements.
    pub raster_area_mm2: f64,
    pub element_count: usize,
    pub cut_count: usize,
    pub vector_count: usize,
    pub raster_count: usize,
    /// Elements that matched no colour convention.
    pub ignored_count: usize,
    /// Union of every element box with positive extent.
    pub bounds: BoundingBox,
    #[serde(default)]
    pub elements: Vec<ElementResult>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Analysis {
    /// Working area of the design: the global bounding box area.
    pub fn total_area(&self) -> f64 {
        self.bounds.area()
    }

    /// `(cut + vector length) / sqrt(bounding box area)`; 0 for a flat box.
    pub fn complexity(&self) -> f64 {
        complexity_factor(self.cut_length_mm + self.vector_length_mm, self.total_area())
    }

    /// Geometry of `quantity` identical pieces treated as one combined job.
    pub fn job_geometry(&self, quantity: u32) -> JobGeometry {
        let q = f64::from(quantity);
        JobGeometry {
            quantity,
            cut_length_mm: self.cut_length_mm * q,
            vector_length_mm: self.vector_length_mm * q,
            raster_area_mm2: self.raster_area_mm2 * q,
            footprint_area_mm2: self.total_area() * q,
        }
    }
}

/// Analysis totals scaled by the ordered quantity.
///
/// N pieces are one continuous machine run: lengths and areas add up, the
/// material footprint is N bounding boxes, and setup still happens once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobGeometry {
    pub quantity: u32,
    pub cut_length_mm: f64,
    pub vector_length_mm: f64,
    pub raster_area_mm2: f64,
    pub footprint_area_mm2: f64,
}

impl JobGeometry {
    pub fn complexity(&self) -> f64 {
        complexity_factor(
            self.cut_length_mm + self.vector_length_mm,
            self.footprint_area_mm2,
        )
    }
}

/// Ratio of path length to the side of a square with the given area.
pub fn complexity_factor(total_length: f64, area: f64) -> f64 {
    if area <= 0.0 {
        return 0.0;
    }
    total_length / area.sqrt()
}
