//! Canvas data model for the annotation widget.
//!
//! Objects are flat: the scene is an ordered list of `DrawableObject`
//! values, painted back to front. Styling is resolved at generation time:
//! an object carries its own fill/stroke, nothing is inherited afterwards.

use crate::id::ObjectId;
use crate::parser::SvgShape;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi << 4 | lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
    }
}

// ─── Font / Text ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Font families offered by the text toolbar, as `(label, value)`.
pub const FONT_FAMILIES: &[(&str, &str)] = &[
    ("Serif", "serif"),
    ("Sans-Serif", "sans-serif"),
    ("Monospace", "monospace"),
];

/// Font settings applied to newly generated text objects.
///
/// Field names follow the engine's text option names so the struct can be
/// handed to the engine as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontOptions {
    pub font_size: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub underline: bool,
    pub linethrough: bool,
    pub overline: bool,
    pub text_align: TextAlign,
    pub line_height: f64,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            font_size: 40.0,
            font_family: "serif".into(),
            font_style: FontStyle::Normal,
            font_weight: FontWeight::Normal,
            underline: false,
            linethrough: false,
            overline: false,
            text_align: TextAlign::Left,
            line_height: 1.0,
        }
    }
}

// ─── Styling ─────────────────────────────────────────────────────────────

/// Current toolbar styling. Read when an object is generated; objects never
/// track later changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    pub font: FontOptions,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            stroke: Color::BLACK,
            stroke_width: 2.0,
            font: FontOptions::default(),
        }
    }
}

// ─── Objects ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Geometry of a drawable object. Sizes are in canvas units; line and path
/// coordinates are absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    /// Editable text.
    #[serde(rename = "i-text")]
    Text {
        text: String,
        width: f64,
        height: f64,
        font: FontOptions,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Circle {
        radius: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
    Rect {
        width: f64,
        height: f64,
    },
    Triangle {
        width: f64,
        height: f64,
    },
    /// Free-draw stroke.
    Path {
        points: Vec<(f64, f64)>,
    },
    /// One element of a stamp's SVG source.
    Svg {
        shape: SvgShape,
    },
}

impl ObjectKind {
    /// Short name used for ID prefixes and logging.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Text { .. } => "text",
            ObjectKind::Line { .. } => "line",
            ObjectKind::Circle { .. } => "circle",
            ObjectKind::Ellipse { .. } => "ellipse",
            ObjectKind::Rect { .. } => "rect",
            ObjectKind::Triangle { .. } => "triangle",
            ObjectKind::Path { .. } => "path",
            ObjectKind::Svg { .. } => "svg",
        }
    }
}

/// An object handed to the canvas. Ownership moves to the scene on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub left: f64,
    pub top: f64,
    #[serde(default)]
    pub origin_x: OriginX,
    #[serde(default)]
    pub origin_y: OriginY,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub selectable: bool,
}

impl DrawableObject {
    /// Create an unstyled, non-selectable object anchored at its top-left.
    pub fn new(kind: ObjectKind, left: f64, top: f64) -> Self {
        Self {
            id: ObjectId::with_prefix(kind.name()),
            kind,
            left,
            top,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            fill: None,
            stroke: None,
            stroke_width: None,
            selectable: false,
        }
    }

    /// Apply fill, stroke and stroke width from the toolbar style.
    pub fn with_style(mut self, style: &StyleOptions) -> Self {
        self.fill = Some(style.fill);
        self.stroke = Some(style.stroke);
        self.stroke_width = Some(style.stroke_width);
        self
    }

    /// Width and height of the object's box before origin adjustment.
    pub fn size(&self) -> (f64, f64) {
        match &self.kind {
            ObjectKind::Text { width, height, .. }
            | ObjectKind::Rect { width, height }
            | ObjectKind::Triangle { width, height } => (*width, *height),
            ObjectKind::Line { x1, y1, x2, y2 } => ((x2 - x1).abs(), (y2 - y1).abs()),
            ObjectKind::Circle { radius } => (radius * 2.0, radius * 2.0),
            ObjectKind::Ellipse { rx, ry } => (rx * 2.0, ry * 2.0),
            ObjectKind::Path { points } => {
                let bounds = points_bounds(points);
                (bounds.2 - bounds.0, bounds.3 - bounds.1)
            }
            ObjectKind::Svg { shape } => {
                let b = shape.bounds();
                (b.width(), b.height())
            }
        }
    }
}

/// `(min_x, min_y, max_x, max_y)` of a point list; zeroes when empty.
pub fn points_bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    points.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    )
}
