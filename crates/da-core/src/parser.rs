//! Parser for stamp SVG sources → drawable parts.
//!
//! Built on `winnow` 0.7. Only the structure needed to split a stamp into
//! parts is understood: elements, attributes, text content, comments,
//! CDATA, processing instructions and doctypes. Container elements
//! (`svg`, `g`, `a`, `switch`) are flattened and hand their presentation
//! attributes down to the shapes they contain.

use kurbo::{BezPath, Rect, Shape};
use serde::{Deserialize, Serialize};
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Elements that become one part each.
const DRAWABLE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text", "image",
];

/// Elements whose children are flattened into the part list.
const CONTAINER_TAGS: &[&str] = &["svg", "g", "a", "switch"];

/// Attributes a container passes down to children that don't set them.
const INHERITED_ATTRS: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "opacity",
    "font-family",
    "font-size",
    "font-weight",
];

/// A single SVG element lifted out of a stamp, with inherited attributes
/// already merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgShape {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SvgShape {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn num(&self, name: &str) -> f64 {
        self.attr(name).and_then(parse_length).unwrap_or(0.0)
    }

    /// Bounding box in the element's own coordinate space.
    /// Text boxes are degenerate: glyph metrics belong to the engine.
    pub fn bounds(&self) -> Rect {
        match self.tag.as_str() {
            "rect" | "image" => {
                let (x, y) = (self.num("x"), self.num("y"));
                Rect::new(x, y, x + self.num("width"), y + self.num("height"))
            }
            "circle" => {
                let (cx, cy, r) = (self.num("cx"), self.num("cy"), self.num("r"));
                Rect::new(cx - r, cy - r, cx + r, cy + r)
            }
            "ellipse" => {
                let (cx, cy) = (self.num("cx"), self.num("cy"));
                let (rx, ry) = (self.num("rx"), self.num("ry"));
                Rect::new(cx - rx, cy - ry, cx + rx, cy + ry)
            }
            "line" => Rect::from_points(
                (self.num("x1"), self.num("y1")),
                (self.num("x2"), self.num("y2")),
            ),
            "polyline" | "polygon" => {
                let points = parse_points(self.attr("points").unwrap_or_default());
                let (min_x, min_y, max_x, max_y) = crate::model::points_bounds(&points);
                Rect::new(min_x, min_y, max_x, max_y)
            }
            "path" => self
                .attr("d")
                .and_then(|d| BezPath::from_svg(d).ok())
                .map(|path| path.bounding_box())
                .unwrap_or(Rect::ZERO),
            "text" => {
                let (x, y) = (self.num("x"), self.num("y"));
                Rect::new(x, y, x, y)
            }
            _ => Rect::ZERO,
        }
    }
}

/// Parse a length attribute, ignoring a trailing `px`.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    value.strip_suffix("px").unwrap_or(value).trim().parse().ok()
}

/// Parse a `points` attribute (`"0,0 10,0 5,8"`) into coordinate pairs.
/// A trailing unpaired number is dropped.
pub fn parse_points(value: &str) -> Vec<(f64, f64)> {
    let numbers: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    numbers.chunks_exact(2).map(|p| (p[0], p[1])).collect()
}

// ─── Document walk ───────────────────────────────────────────────────────

enum FrameKind {
    /// Flattened container; holds the attributes its children inherit.
    Container(Vec<(String, String)>),
    /// A part being collected until its closing tag.
    Drawable(SvgShape),
    /// An element inside a part (e.g. `tspan`); contributes text only.
    Nested,
    /// Non-rendering subtree (`defs`, `title`, `style`, ...).
    Skipped,
}

struct Frame {
    tag: String,
    kind: FrameKind,
}

/// Parse an SVG document or fragment into its drawable parts, in paint order.
///
/// # Errors
/// Returns a description of the first malformed tag, mismatched closing tag
/// or unterminated construct.
pub fn parse_svg(input: &str) -> Result<Vec<SvgShape>, String> {
    let mut rest = input;
    let mut parts = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let text = take_till::<_, _, ContextError>(0.., '<')
            .parse_next(&mut rest)
            .unwrap_or_default();
        append_text(&mut stack, text);

        if rest.is_empty() {
            break;
        }

        if rest.starts_with("<!--") {
            skip_past(&mut rest, "-->")?;
        } else if rest.starts_with("<![CDATA[") {
            let data = parse_cdata
                .parse_next(&mut rest)
                .map_err(|e| format!("CDATA parse error: {e}"))?;
            append_text(&mut stack, data);
        } else if rest.starts_with("<?") {
            skip_past(&mut rest, "?>")?;
        } else if rest.starts_with("<!") {
            skip_past(&mut rest, ">")?;
        } else if rest.starts_with("</") {
            let name = parse_close_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("Closing tag parse error: {e}"))?;
            let name = local_name(name);
            let frame = stack
                .pop()
                .ok_or_else(|| format!("unexpected closing tag </{name}>"))?;
            if frame.tag != name {
                return Err(format!("expected </{}>, found </{name}>", frame.tag));
            }
            if let FrameKind::Drawable(mut shape) = frame.kind {
                shape.content = shape
                    .content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
                parts.push(shape);
            }
        } else {
            let tag = parse_open_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("Tag parse error: {e}"))?;
            let name = local_name(tag.name).to_string();
            let attributes = tag
                .attributes
                .into_iter()
                .map(|(k, v)| (local_name(k).to_string(), decode_entities(v)))
                .collect();
            match (classify(&stack, &name, attributes), tag.self_closing) {
                (FrameKind::Drawable(shape), true) => parts.push(shape),
                (_, true) => {}
                (kind, false) => stack.push(Frame { tag: name, kind }),
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(format!("unclosed <{}>", frame.tag));
    }
    Ok(parts)
}

fn classify(stack: &[Frame], name: &str, attributes: Vec<(String, String)>) -> FrameKind {
    let inherited: &[(String, String)] = match stack.last().map(|f| &f.kind) {
        Some(FrameKind::Skipped) => return FrameKind::Skipped,
        Some(FrameKind::Drawable(_) | FrameKind::Nested) => return FrameKind::Nested,
        Some(FrameKind::Container(attrs)) => attrs,
        None => &[],
    };

    if CONTAINER_TAGS.contains(&name) {
        let mut passed_down: Vec<(String, String)> = inherited.to_vec();
        for (key, value) in attributes {
            if INHERITED_ATTRS.contains(&key.as_str()) {
                passed_down.retain(|(k, _)| *k != key);
                passed_down.push((key, value));
            }
        }
        FrameKind::Container(passed_down)
    } else if DRAWABLE_TAGS.contains(&name) {
        let mut merged = attributes;
        for (key, value) in inherited {
            if !merged.iter().any(|(k, _)| k == key) {
                merged.push((key.clone(), value.clone()));
            }
        }
        FrameKind::Drawable(SvgShape {
            tag: name.to_string(),
            attributes: merged,
            content: None,
        })
    } else {
        FrameKind::Skipped
    }
}

/// Route character data to the part currently collecting text, if any.
fn append_text(stack: &mut [Frame], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    for frame in stack.iter_mut().rev() {
        match &mut frame.kind {
            FrameKind::Nested => continue,
            FrameKind::Drawable(shape) => {
                shape
                    .content
                    .get_or_insert_with(String::new)
                    .push_str(&decode_entities(text));
                return;
            }
            _ => return,
        }
    }
}

fn skip_past(input: &mut &str, terminator: &str) -> Result<(), String> {
    match input.find(terminator) {
        Some(pos) => {
            *input = &input[pos + terminator.len()..];
            Ok(())
        }
        None => Err(format!("missing `{terminator}`")),
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ─── Token parsers ───────────────────────────────────────────────────────

struct OpenTag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, &'a str)>,
    self_closing: bool,
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
    })
    .parse_next(input)
}

fn parse_attr_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name = preceded(multispace0, parse_name).parse_next(input)?;
    let _ = (multispace0, '=', multispace0).parse_next(input)?;
    let value = parse_attr_value.parse_next(input)?;
    Ok((name, value))
}

fn parse_open_tag<'a>(input: &mut &'a str) -> ModalResult<OpenTag<'a>> {
    let _ = '<'.parse_next(input)?;
    let name = parse_name.parse_next(input)?;
    let attributes: Vec<(&str, &str)> = repeat(0.., parse_attribute).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let self_closing = opt('/').parse_next(input)?.is_some();
    let _ = '>'.parse_next(input)?;
    Ok(OpenTag {
        name,
        attributes,
        self_closing,
    })
}

fn parse_close_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("</", preceded(multispace0, parse_name), (multispace0, '>')).parse_next(input)
}

fn parse_cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BURST: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <!-- outer ring -->
  <defs><linearGradient id="g1"><stop offset="0"/></linearGradient></defs>
  <g fill="#FF0000" stroke="#000">
    <circle cx="50" cy="50" r="40"/>
    <rect x="10" y="20" width="30" height="10" fill="#00FF00"></rect>
  </g>
  <text x="20" y="55">APPROVED <tspan>&amp; SIGNED</tspan></text>
</svg>"##;

    #[test]
    fn splits_stamp_into_parts_in_paint_order() {
        let parts = parse_svg(BURST).unwrap();
        let tags: Vec<&str> = parts.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["circle", "rect", "text"]);
    }

    #[test]
    fn group_attributes_are_inherited_but_not_overridden() {
        let parts = parse_svg(BURST).unwrap();
        assert_eq!(parts[0].attr("fill"), Some("#FF0000"));
        assert_eq!(parts[0].attr("stroke"), Some("#000"));
        assert_eq!(parts[1].attr("fill"), Some("#00FF00"));
        assert_eq!(parts[1].attr("stroke"), Some("#000"));
        // The root's sizing attributes stay on the root.
        assert_eq!(parts[2].attr("width"), None);
    }

    #[test]
    fn text_content_includes_nested_spans() {
        let parts = parse_svg(BURST).unwrap();
        assert_eq!(parts[2].content.as_deref(), Some("APPROVED & SIGNED"));
    }

    #[test]
    fn empty_svg_has_no_parts() {
        assert!(parse_svg("<svg></svg>").unwrap().is_empty());
        assert!(parse_svg("").unwrap().is_empty());
    }

    #[test]
    fn single_quoted_and_namespaced_attributes() {
        let parts =
            parse_svg("<svg:svg><svg:path d='M0 0 L10 10' xlink:href='#a'/></svg:svg>").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].tag, "path");
        assert_eq!(parts[0].attr("href"), Some("#a"));
    }

    #[test]
    fn mismatched_and_unclosed_tags_are_errors() {
        assert!(parse_svg("<svg><g></svg>").is_err());
        assert!(parse_svg("<svg><rect/>").is_err());
        assert!(parse_svg("<svg><!-- never closed").is_err());
        assert!(parse_svg("</g>").is_err());
    }

    #[test]
    fn shape_bounds() {
        let parts = parse_svg(BURST).unwrap();
        assert_eq!(parts[0].bounds(), Rect::new(10.0, 10.0, 90.0, 90.0));
        assert_eq!(parts[1].bounds(), Rect::new(10.0, 20.0, 40.0, 30.0));

        let path = parse_svg(r#"<path d="M5 5 L25 5 L25 15 Z"/>"#).unwrap();
        assert_eq!(path[0].bounds(), Rect::new(5.0, 5.0, 25.0, 15.0));

        let poly = parse_svg(r#"<polygon points="0,0 10,0 5,8"/>"#).unwrap();
        assert_eq!(poly[0].bounds(), Rect::new(0.0, 0.0, 10.0, 8.0));
    }

    #[test]
    fn lengths_and_points() {
        assert_eq!(parse_length("12px"), Some(12.0));
        assert_eq!(parse_length(" 3.5 "), Some(3.5));
        assert_eq!(parse_length("auto"), None);
        assert_eq!(parse_points("1,2 3 4 5"), vec![(1.0, 2.0), (3.0, 4.0)]);
    }
}
