//! Drawing analysis engine: markup in, aggregated laser geometry out.
//!
//! # Module structure
//!
//! ```text
//! svg/
//! ├── parser.rs       document size, viewBox scale, flat list of primitives
//! ├── path.rs         path-data tokenizer and Bezier flattening
//! ├── geometry.rs     per-primitive length / area / perimeter / bounds (mm)
//! ├── classifier.rs   colour conventions → operation set
//! └── analyzer.rs     parser → classifier → geometry, aggregated into an Analysis
//! ```
//!
//! Everything here is a pure function of the input text. The only failure is a
//! document that is not well-formed markup; every other oddity becomes a
//! warning string on the resulting [`crate::models::Analysis`].

pub mod analyzer;
pub mod classifier;
pub mod geometry;
pub mod parser;
pub mod path;

pub use analyzer::{content_hash, Analyzer};
pub use classifier::{ClassifiedPrimitive, Classifier, Rgb};
pub use geometry::{GeometryCalculator, GeometryResult};
pub use parser::{ParsedDocument, Primitive, Scale, ViewBox};

/// Errors produced while reading drawing markup.
#[derive(Debug, thiserror::Error)]
pub enum SvgError {
    /// The text is not well-formed XML, or its root element is not `<svg>`.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}
