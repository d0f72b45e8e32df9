//! SVG snapshot of a scene.
//!
//! Used by the in-memory scene for `to_data_url`; browser engines rasterize
//! their own canvas instead.

use crate::hit::{object_bounds, placement_offset};
use crate::model::{Color, DrawableObject, ObjectKind};
use std::fmt::Write;

fn paint(color: Option<Color>) -> String {
    color.map_or_else(|| "none".to_string(), |c| c.to_hex())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the objects, back to front, into a standalone SVG document.
pub fn emit_svg(
    objects: &[DrawableObject],
    width: f64,
    height: f64,
    background: Option<&str>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    if let Some(url) = background {
        let _ = writeln!(
            out,
            "  <image href=\"{}\" x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" />",
            escape(url)
        );
    }
    for obj in objects {
        emit_object(&mut out, obj);
    }
    out.push_str("</svg>");
    out
}

fn emit_object(out: &mut String, obj: &DrawableObject) {
    let b = object_bounds(obj);
    let offset = placement_offset(obj);
    let fill = paint(obj.fill);
    let stroke = paint(obj.stroke);
    let stroke_width = obj.stroke_width.unwrap_or(1.0);

    let _ = match &obj.kind {
        ObjectKind::Text { text, font, .. } => writeln!(
            out,
            "  <text x=\"{}\" y=\"{}\" font-size=\"{}\" font-family=\"{}\" fill=\"{fill}\">{}</text>",
            b.x0,
            b.y0 + font.font_size * 0.9,
            font.font_size,
            escape(&font.font_family),
            escape(text)
        ),
        ObjectKind::Line { x1, y1, x2, y2 } => writeln!(
            out,
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
            x1 + offset.x,
            y1 + offset.y,
            x2 + offset.x,
            y2 + offset.y
        ),
        ObjectKind::Circle { radius } => writeln!(
            out,
            "  <circle cx=\"{}\" cy=\"{}\" r=\"{radius}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
            b.center().x,
            b.center().y
        ),
        ObjectKind::Ellipse { rx, ry } => writeln!(
            out,
            "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{rx}\" ry=\"{ry}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
            b.center().x,
            b.center().y
        ),
        ObjectKind::Rect { .. } => writeln!(
            out,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
            b.x0,
            b.y0,
            b.width(),
            b.height()
        ),
        ObjectKind::Triangle { .. } => writeln!(
            out,
            "  <polygon points=\"{},{} {},{} {},{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
            b.center().x,
            b.y0,
            b.x1,
            b.y1,
            b.x0,
            b.y1
        ),
        ObjectKind::Path { points } => {
            let mut d = String::new();
            for (i, (x, y)) in points.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{cmd} {} {} ", x + offset.x, y + offset.y);
            }
            writeln!(
                out,
                "  <path d=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" />",
                d.trim_end()
            )
        }
        ObjectKind::Svg { shape } => {
            let _ = write!(
                out,
                "  <g transform=\"translate({}, {})\"><{}",
                offset.x, offset.y, shape.tag
            );
            for (key, value) in &shape.attributes {
                let overridden = (key == "fill" && obj.fill.is_some())
                    || (key == "stroke" && obj.stroke.is_some());
                if !overridden {
                    let _ = write!(out, " {key}=\"{}\"", escape(value));
                }
            }
            if let Some(c) = obj.fill {
                let _ = write!(out, " fill=\"{}\"", c.to_hex());
            }
            if let Some(c) = obj.stroke {
                let _ = write!(out, " stroke=\"{}\"", c.to_hex());
            }
            match &shape.content {
                Some(text) => writeln!(out, ">{}</{}></g>", escape(text), shape.tag),
                None => writeln!(out, " /></g>"),
            }
        }
    };
}

/// Wrap an SVG document as a `data:` URL.
pub fn to_data_url(svg: &str) -> String {
    let encoded = svg
        .replace('%', "%25")
        .replace('#', "%23")
        .replace('\n', "%0A");
    format!("data:image/svg+xml;utf8,{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyleOptions;
    use crate::parser::parse_svg;

    #[test]
    fn emits_each_kind_in_paint_order() {
        let style = StyleOptions::default();
        let objects = vec![
            DrawableObject::new(
                ObjectKind::Rect {
                    width: 30.0,
                    height: 20.0,
                },
                10.0,
                10.0,
            )
            .with_style(&style),
            DrawableObject::new(ObjectKind::Circle { radius: 5.0 }, 50.0, 50.0).with_style(&style),
        ];
        let svg = emit_svg(&objects, 200.0, 100.0, None);
        assert!(svg.starts_with("<svg"));
        let rect_at = svg.find("<rect").unwrap();
        let circle_at = svg.find("<circle").unwrap();
        assert!(rect_at < circle_at);
        assert!(svg.contains("cx=\"55\" cy=\"55\" r=\"5\""));
        assert!(svg.contains("fill=\"#FFFFFF\""));
    }

    #[test]
    fn stamp_part_keeps_its_own_paint() {
        let shape = parse_svg(r##"<circle cx="10" cy="10" r="10" fill="#FF0000"/>"##)
            .unwrap()
            .remove(0);
        let obj = DrawableObject::new(ObjectKind::Svg { shape }, 100.0, 40.0);
        let svg = emit_svg(&[obj], 200.0, 100.0, Some("bg.png"));
        assert!(svg.contains("translate(100, 40)"));
        assert!(svg.contains("fill=\"#FF0000\""));
        assert!(svg.contains("<image href=\"bg.png\""));
    }

    #[test]
    fn text_is_escaped() {
        let obj = DrawableObject::new(
            ObjectKind::Text {
                text: "a < b & c".into(),
                width: 10.0,
                height: 10.0,
                font: Default::default(),
            },
            0.0,
            0.0,
        );
        let svg = emit_svg(&[obj], 10.0, 10.0, None);
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn data_url_escapes_reserved_characters() {
        let url = to_data_url("<svg fill=\"#fff\">100%</svg>");
        assert_eq!(
            url,
            "data:image/svg+xml;utf8,<svg fill=\"%23fff\">100%25</svg>"
        );
    }
}
