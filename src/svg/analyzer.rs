//! Parser → classifier → geometry, aggregated into an [`Analysis`].

use sha2::Digest as _;

use crate::models::{Analysis, BoundingBox, ElementResult};

use super::classifier::Classifier;
use super::geometry::{GeometryCalculator, FLATNESS_TOLERANCE_MM};
use super::parser;
use super::SvgError;

pub const NO_STANDARD_COLORS_WARNING: &str =
    "No elements with standard colors found (red stroke=cut, blue stroke=vector, black fill=raster)";

/// SHA-256 of the raw markup as lowercase hex; the upload dedup key.
pub fn content_hash(markup: &str) -> String {
    let digest = sha2::Sha256::digest(markup.as_bytes());
    format!("{digest:x}")
}

#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    classifier: Classifier,
    tolerance: f64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            classifier: Classifier::new(),
            tolerance: FLATNESS_TOLERANCE_MM,
        }
    }

    /// Analyse raw markup.
    ///
    /// # Errors
    /// [`SvgError::MalformedDocument`] when the markup cannot be parsed. All
    /// other problems are reported in [`Analysis::warnings`].
    pub fn analyze(&self, markup: &str) -> Result<Analysis, SvgError> {
        let doc = parser::parse(markup)?;
        let geometry = GeometryCalculator::new(doc.scale).with_tolerance(self.tolerance);

        let mut analysis = Analysis {
            content_hash: content_hash(markup),
            width_mm: doc.width_mm,
            height_mm: doc.height_mm,
            scale_x: doc.scale.x,
            scale_y: doc.scale.y,
            cut_length_mm: 0.0,
            vector_length_mm: 0.0,
            raster_area_mm2: 0.0,
            element_count: 0,
            cut_count: 0,
            vector_count: 0,
            raster_count: 0,
            ignored_count: 0,
            bounds: BoundingBox::default(),
            elements: Vec::with_capacity(doc.primitives.len()),
            warnings: doc.warnings,
        };
        let mut bounds: Option<BoundingBox> = None;

        for primitive in &doc.primitives {
            let classified = self.classifier.classify(primitive);
            let geom = geometry.measure(primitive);
            let ops = classified.operations;

            analysis.element_count += 1;
            if ops.is_cut() {
                analysis.cut_length_mm += geom.length;
                analysis.cut_count += 1;
            }
            if ops.is_vector_engrave() {
                analysis.vector_length_mm += geom.length;
                analysis.vector_count += 1;
            }
            if ops.is_raster_engrave() {
                analysis.raster_area_mm2 += geom.area;
                analysis.raster_count += 1;
            }
            if ops.is_empty() {
                analysis.ignored_count += 1;
            }

            if geom.bounds.has_extent() {
                bounds = Some(match bounds {
                    Some(b) => b.union(&geom.bounds),
                    None => geom.bounds,
                });
            }

            analysis.elements.push(ElementResult {
                kind: primitive.kind,
                element_id: primitive.id.clone(),
                stroke: classified.stroke,
                fill: classified.fill,
                operations: ops,
                length_mm: geom.length,
                area_mm2: geom.area,
                perimeter_mm: geom.perimeter,
                bounds: geom.bounds,
            });
        }

        analysis.bounds = bounds.unwrap_or_default();
        if analysis.cut_count + analysis.vector_count + analysis.raster_count == 0 {
            analysis.warnings.push(NO_STANDARD_COLORS_WARNING.to_string());
        }

        tracing::debug!(
            hash = %analysis.content_hash,
            elements = analysis.element_count,
            cut_mm = analysis.cut_length_mm,
            vector_mm = analysis.vector_length_mm,
            raster_mm2 = analysis.raster_area_mm2,
            "analysis complete"
        );

        Ok(analysis)
    }
}
