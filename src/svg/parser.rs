//! Structural drawing parser.
//!
//! Reads the document's physical size and viewBox, derives the user-unit → mm
//! scale, and flattens the element tree into a list of drawable primitives in
//! document order. Container transforms are not applied; group nesting only
//! matters for finding the primitives.

use std::collections::BTreeMap;

use roxmltree::{Document, Node, ParsingOptions};

use super::SvgError;
use crate::models::PrimitiveKind;

/// Size used for a missing or unusable width/height, in mm.
pub const DEFAULT_DOCUMENT_SIZE_MM: f64 = 100.0;

/// CSS reference pixel density.
const PX_PER_INCH: f64 = 96.0;
const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

/// Elements whose content is never rendered directly.
const NON_RENDERED: [&str; 6] = ["defs", "clipPath", "mask", "symbol", "marker", "pattern"];

// ── Types ─────────────────────────────────────────────────────────────────────

/// `viewBox="min-x min-y width height"` in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// A viewBox with a zero or negative dimension disables scaling.
    pub fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// User-unit → mm multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };
}

impl Default for Scale {
    fn default() -> Self {
        Scale::IDENTITY
    }
}

/// One drawable element with its raw attributes.
///
/// Attributes are keyed by local name; namespaced editor attributes
/// (`inkscape:label`, …) are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub id: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind) -> Self {
        Primitive {
            kind,
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder used by tests and callers that synthesise primitives.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if name == "id" {
            self.id = Some(value.to_string());
        }
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Result of the structural pass over one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub width_mm: f64,
    pub height_mm: f64,
    pub view_box: Option<ViewBox>,
    pub scale: Scale,
    pub primitives: Vec<Primitive>,
    pub warnings: Vec<String>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse drawing markup into a [`ParsedDocument`].
///
/// Fails only when the text is not well-formed XML or the root element is not
/// `<svg>`. A document without drawable elements parses successfully and
/// carries a warning.
pub fn parse(markup: &str) -> Result<ParsedDocument, SvgError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(markup, options)
        .map_err(|e| SvgError::MalformedDocument(e.to_string()))?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(SvgError::MalformedDocument(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let mut warnings = Vec::new();

    let view_box = root.attribute("viewBox").and_then(parse_view_box);
    let vb_width = view_box.map(|vb| vb.width).unwrap_or(0.0);
    let vb_height = view_box.map(|vb| vb.height).unwrap_or(0.0);

    let width_mm = resolve_dimension(root.attribute("width"), vb_width).unwrap_or_else(|| {
        warnings.push(format!(
            "No width specified, using default {DEFAULT_DOCUMENT_SIZE_MM}mm"
        ));
        DEFAULT_DOCUMENT_SIZE_MM
    });
    let height_mm = resolve_dimension(root.attribute("height"), vb_height).unwrap_or_else(|| {
        warnings.push(format!(
            "No height specified, using default {DEFAULT_DOCUMENT_SIZE_MM}mm"
        ));
        DEFAULT_DOCUMENT_SIZE_MM
    });

    let scale = match view_box {
        Some(vb) if vb.is_usable() => Scale {
            x: width_mm / vb.width,
            y: height_mm / vb.height,
        },
        _ => Scale::IDENTITY,
    };

    let primitives = collect_primitives(root);
    if primitives.is_empty() {
        warnings.push("No drawable elements found in SVG".to_string());
    }

    tracing::debug!(
        width_mm,
        height_mm,
        scale_x = scale.x,
        scale_y = scale.y,
        primitives = primitives.len(),
        "parsed document"
    );

    Ok(ParsedDocument {
        width_mm,
        height_mm,
        view_box,
        scale,
        primitives,
        warnings,
    })
}

/// Width/height attribute, then the matching viewBox dimension.
fn resolve_dimension(attr: Option<&str>, view_box_dim: f64) -> Option<f64> {
    attr.and_then(|v| parse_length(v, view_box_dim))
        .filter(|v| *v > 0.0)
        .or_else(|| Some(view_box_dim).filter(|v| *v > 0.0))
}

/// Depth-first walk in document order, skipping non-rendered subtrees.
///
/// Uses an explicit stack so deeply nested groups cannot exhaust the call stack.
fn collect_primitives(root: Node<'_, '_>) -> Vec<Primitive> {
    let mut out = Vec::new();
    let mut stack: Vec<Node<'_, '_>> = root.children().filter(Node::is_element).collect();
    stack.reverse();

    while let Some(node) = stack.pop() {
        let tag = node.tag_name().name();
        if NON_RENDERED.contains(&tag) {
            continue;
        }
        if let Some(kind) = PrimitiveKind::from_tag(tag) {
            out.push(to_primitive(kind, node));
            continue;
        }
        let mark = stack.len();
        stack.extend(node.children().filter(Node::is_element));
        stack[mark..].reverse();
    }
    out
}

fn to_primitive(kind: PrimitiveKind, node: Node<'_, '_>) -> Primitive {
    let attributes: BTreeMap<String, String> = node
        .attributes()
        .filter(|a| a.namespace().is_none())
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();
    Primitive {
        kind,
        id: attributes.get("id").cloned(),
        attributes,
    }
}

// ── Attribute values ──────────────────────────────────────────────────────────

/// Parse `"min-x min-y width height"` (whitespace and/or comma separated).
pub fn parse_view_box(value: &str) -> Option<ViewBox> {
    let nums: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [min_x, min_y, width, height] => Some(ViewBox {
            min_x: *min_x,
            min_y: *min_y,
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Convert a length with an optional unit suffix to millimetres.
///
/// Unitless values are taken as mm. Percentages resolve against `reference`.
/// Returns `None` for an empty, non-numeric, non-finite or negative value, or
/// an unknown unit.
pub fn parse_length(value: &str, reference: f64) -> Option<f64> {
    const UNITS: [&str; 6] = ["mm", "cm", "in", "pt", "px", "%"];

    let value = value.trim();
    let (number, unit) = UNITS
        .iter()
        .find_map(|u| value.strip_suffix(u).map(|n| (n, *u)))
        .unwrap_or((value, ""));
    let n: f64 = number.trim().parse().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    let mm = match unit {
        "cm" => n * 10.0,
        "in" => n * MM_PER_INCH,
        "pt" => n * MM_PER_INCH / PT_PER_INCH,
        "px" => n * MM_PER_INCH / PX_PER_INCH,
        "%" => reference * n / 100.0,
        _ => n,
    };
    Some(mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parse_length_converts_units() {
        assert_eq!(parse_length("10", 0.0), Some(10.0));
        assert_eq!(parse_length("10mm", 0.0), Some(10.0));
        assert_eq!(parse_length("2cm", 0.0), Some(20.0));
        assert_eq!(parse_length("1in", 0.0), Some(25.4));
        assert!(close(parse_length("72pt", 0.0).expect("pt"), 25.4));
        assert!(close(parse_length("96px", 0.0).expect("px"), 25.4));
        assert_eq!(parse_length("50%", 200.0), Some(100.0));
        assert_eq!(parse_length(" 3.5 mm ", 0.0), Some(3.5));
        assert_eq!(parse_length("1e2mm", 0.0), Some(100.0));
    }

    #[test]
    fn parse_length_rejects_garbage() {
        assert_eq!(parse_length("", 0.0), None);
        assert_eq!(parse_length("abc", 0.0), None);
        assert_eq!(parse_length("10furlongs", 0.0), None);
        assert_eq!(parse_length("-5mm", 0.0), None);
    }

    #[test]
    fn parse_view_box_accepts_commas_and_spaces() {
        let vb = parse_view_box("0,0, 200 100").expect("viewBox");
        assert_eq!(vb.width, 200.0);
        assert_eq!(vb.height, 100.0);
        assert!(parse_view_box("0 0 200").is_none());
        assert!(parse_view_box("0 0 a b").is_none());
    }

    #[test]
    fn scale_comes_from_width_over_view_box() {
        let doc = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="50mm" viewBox="0 0 200 100">
                 <rect width="10" height="10" stroke="red"/>
               </svg>"#,
        )
        .expect("parse");
        assert_eq!(doc.width_mm, 100.0);
        assert_eq!(doc.height_mm, 50.0);
        assert!(close(doc.scale.x, 0.5));
        assert!(close(doc.scale.y, 0.5));
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn missing_size_falls_back_to_view_box_then_default() {
        let doc = parse(r#"<svg viewBox="0 0 300 150"><line x2="1"/></svg>"#).expect("parse");
        assert_eq!(doc.width_mm, 300.0);
        assert_eq!(doc.height_mm, 150.0);
        assert_eq!(doc.scale, Scale::IDENTITY);

        let doc = parse(r#"<svg><line x2="1"/></svg>"#).expect("parse");
        assert_eq!(doc.width_mm, DEFAULT_DOCUMENT_SIZE_MM);
        assert_eq!(doc.height_mm, DEFAULT_DOCUMENT_SIZE_MM);
        assert_eq!(doc.scale, Scale::IDENTITY);
        assert!(doc
            .warnings
            .contains(&"No width specified, using default 100mm".to_string()));
        assert!(doc
            .warnings
            .contains(&"No height specified, using default 100mm".to_string()));
    }

    #[test]
    fn zero_view_box_disables_scaling() {
        let doc = parse(r#"<svg width="50" height="50" viewBox="0 0 0 0"><line x2="1"/></svg>"#)
            .expect("parse");
        assert_eq!(doc.scale, Scale::IDENTITY);
    }

    #[test]
    fn primitives_are_collected_in_document_order_through_groups() {
        let doc = parse(
            r#"<svg width="10" height="10">
                 <rect id="a"/>
                 <g><g><circle id="b"/></g><line id="c"/></g>
                 <path id="d"/>
               </svg>"#,
        )
        .expect("parse");
        let ids: Vec<&str> = doc
            .primitives
            .iter()
            .filter_map(|p| p.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn defs_and_text_are_not_primitives() {
        let doc = parse(
            r#"<svg width="10" height="10">
                 <defs><rect id="hidden"/></defs>
                 <text>hello</text>
                 <rect id="shown"/>
               </svg>"#,
        )
        .expect("parse");
        assert_eq!(doc.primitives.len(), 1);
        assert_eq!(doc.primitives[0].id.as_deref(), Some("shown"));
    }

    #[test]
    fn namespaced_attributes_are_dropped() {
        let doc = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"
                    xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
                    width="10" height="10">
                 <rect inkscape:label="Layer" stroke="red"/>
               </svg>"#,
        )
        .expect("parse");
        let rect = &doc.primitives[0];
        assert_eq!(rect.attr("stroke"), Some("red"));
        assert!(rect.attr("label").is_none());
    }

    #[test]
    fn empty_document_warns() {
        let doc = parse(r#"<svg width="10" height="10"></svg>"#).expect("parse");
        assert!(doc.primitives.is_empty());
        assert!(doc
            .warnings
            .contains(&"No drawable elements found in SVG".to_string()));
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(matches!(
            parse("<svg><rect></svg>"),
            Err(SvgError::MalformedDocument(_))
        ));
        assert!(matches!(parse("not xml at all"), Err(SvgError::MalformedDocument(_))));
        assert!(matches!(
            parse("<html><body/></html>"),
            Err(SvgError::MalformedDocument(_))
        ));
    }

    #[test]
    fn doctype_is_accepted() {
        let doc = parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg width="10" height="10"><rect/></svg>"#,
        )
        .expect("parse with doctype");
        assert_eq!(doc.primitives.len(), 1);
    }
}
