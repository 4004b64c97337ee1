//! Colour-convention classifier.
//!
//! Red stroke → cut, blue stroke → vector engrave, black fill → raster
//! engrave. Each rule is checked independently, so one primitive can carry
//! several operations. Matching is per channel within a tolerance.

use crate::models::{Operation, OperationSet};

use super::parser::Primitive;

/// Per-channel match tolerance (about 10 % of 255).
pub const COLOR_TOLERANCE: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn matches(&self, target: &Rgb, tolerance: u8) -> bool {
        self.r.abs_diff(target.r) <= tolerance
            && self.g.abs_diff(target.g) <= tolerance
            && self.b.abs_diff(target.b) <= tolerance
    }
}

const NAMED_COLORS: [(&str, Rgb); 8] = [
    ("red", Rgb::new(255, 0, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("green", Rgb::new(0, 128, 0)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
];

/// Parse a paint value: `#rgb`, `#rrggbb`, `rgb(r, g, b)` or a named colour.
///
/// `none`, `transparent`, `currentColor`, gradients and anything else
/// unrecognised yield `None`.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim().to_ascii_lowercase();

    if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
        return Some(*rgb);
    }
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = value
        .strip_prefix("rgb")
        .map(str::trim_start)
        .and_then(|s| s.strip_prefix('('))
        .and_then(|s| s.strip_suffix(')'))
    {
        return parse_rgb_function(args);
    }
    None
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..=i].repeat(2));
            Some(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Rgb::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// `r, g, b` as integers (clamped to 255) or percentages.
fn parse_rgb_function(args: &str) -> Option<Rgb> {
    let channels: Vec<u8> = args
        .split(',')
        .map(|part| {
            let part = part.trim();
            let value = match part.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? * 255.0 / 100.0,
                None => part.parse::<f64>().ok()?,
            };
            if !value.is_finite() {
                return None;
            }
            Some(value.round().clamp(0.0, 255.0) as u8)
        })
        .collect::<Option<_>>()?;
    match channels.as_slice() {
        [r, g, b] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

/// Resolve a paint property: the direct attribute wins over `style`.
///
/// The value is returned trimmed but otherwise as written.
pub fn resolve_paint(primitive: &Primitive, property: &str) -> Option<String> {
    if let Some(value) = primitive.attr(property) {
        let value = value.trim();
        return (!value.is_empty()).then(|| value.to_string());
    }
    let style = primitive.attr("style")?;
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A primitive together with its resolved paints and operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPrimitive<'a> {
    pub primitive: &'a Primitive,
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub operations: OperationSet,
}

impl ClassifiedPrimitive<'_> {
    pub fn is_ignored(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    tolerance: u8,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Classifier {
            tolerance: COLOR_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: u8) -> Self {
        Classifier { tolerance }
    }

    /// Tag a primitive. Never fails; unmatched colours leave the set empty.
    pub fn classify<'a>(&self, primitive: &'a Primitive) -> ClassifiedPrimitive<'a> {
        let stroke = resolve_paint(primitive, "stroke");
        let fill = resolve_paint(primitive, "fill");

        let mut operations = OperationSet::empty();
        if let Some(rgb) = stroke.as_deref().and_then(parse_color) {
            if rgb.matches(&Rgb::RED, self.tolerance) {
                operations.insert(Operation::Cut);
            }
            if rgb.matches(&Rgb::BLUE, self.tolerance) {
                operations.insert(Operation::VectorEngrave);
            }
        }
        if let Some(rgb) = fill.as_deref().and_then(parse_color) {
            if rgb.matches(&Rgb::BLACK, self.tolerance) {
                operations.insert(Operation::RasterEngrave);
            }
        }

        ClassifiedPrimitive {
            primitive,
            stroke,
            fill,
            operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrimitiveKind;

    fn rect() -> Primitive {
        Primitive::new(PrimitiveKind::Rect)
    }

    #[test]
    fn parse_color_formats() {
        assert_eq!(parse_color("#FF0000"), Some(Rgb::RED));
        assert_eq!(parse_color("#00f"), Some(Rgb::BLUE));
        assert_eq!(parse_color(" Black "), Some(Rgb::BLACK));
        assert_eq!(parse_color("green"), Some(Rgb::new(0, 128, 0)));
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some(Rgb::RED));
        assert_eq!(parse_color("RGB (0,0,255)"), Some(Rgb::BLUE));
        assert_eq!(parse_color("rgb(100%, 0%, 0%)"), Some(Rgb::RED));
        assert_eq!(parse_color("rgb(300, 0, 0)"), Some(Rgb::RED));
    }

    #[test]
    fn parse_color_rejects_non_colours() {
        for value in ["none", "transparent", "", "currentColor", "#12", "#ggg", "url(#grad)"] {
            assert_eq!(parse_color(value), None, "{value}");
        }
    }

    #[test]
    fn tolerance_is_inclusive() {
        assert!(Rgb::new(230, 25, 25).matches(&Rgb::RED, COLOR_TOLERANCE));
        assert!(!Rgb::new(229, 0, 0).matches(&Rgb::RED, COLOR_TOLERANCE));
        assert!(!Rgb::new(255, 26, 0).matches(&Rgb::RED, COLOR_TOLERANCE));
    }

    #[test]
    fn red_stroke_and_black_fill_is_cut_and_raster() {
        let p = rect().with_attr("stroke", "#FF0000").with_attr("fill", "#000000");
        let c = Classifier::new().classify(&p);
        assert!(c.operations.is_cut());
        assert!(c.operations.is_raster_engrave());
        assert!(!c.operations.is_vector_engrave());
    }

    #[test]
    fn blue_stroke_and_black_fill_is_vector_and_raster() {
        let p = rect().with_attr("stroke", "blue").with_attr("fill", "black");
        let c = Classifier::new().classify(&p);
        assert!(c.operations.is_vector_engrave());
        assert!(c.operations.is_raster_engrave());
        assert_eq!(c.operations.iter().count(), 2);
    }

    #[test]
    fn style_declarations_are_read() {
        let p = rect().with_attr("style", "stroke-width:0.1;STROKE: #f00 ;fill:none");
        let c = Classifier::new().classify(&p);
        assert_eq!(c.stroke.as_deref(), Some("#f00"));
        assert_eq!(c.fill.as_deref(), Some("none"));
        assert!(c.operations.is_cut());
        assert!(!c.operations.is_raster_engrave());
    }

    #[test]
    fn direct_attribute_wins_over_style() {
        let p = rect()
            .with_attr("stroke", "blue")
            .with_attr("style", "stroke:red");
        let c = Classifier::new().classify(&p);
        assert!(c.operations.is_vector_engrave());
        assert!(!c.operations.is_cut());
    }

    #[test]
    fn missing_fill_is_not_raster() {
        let p = rect().with_attr("stroke", "green");
        let c = Classifier::new().classify(&p);
        assert!(c.is_ignored());
        assert!(c.fill.is_none());
    }

    #[test]
    fn custom_tolerance_widens_matches() {
        let p = rect().with_attr("stroke", "rgb(200, 40, 40)");
        assert!(Classifier::new().classify(&p).is_ignored());
        assert!(Classifier::with_tolerance(60).classify(&p).operations.is_cut());
    }
}
