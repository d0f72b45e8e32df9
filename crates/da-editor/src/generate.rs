//! Object generation: turn a finished gesture into canvas objects.
//!
//! Generation is pure. It works on a [`GenerationRequest`] snapshot taken at
//! pointer-up, so nothing that changes afterwards (toolbar, style, menu)
//! affects the result. Inserting the result is the controller's job.

use crate::gesture::Gesture;
use crate::menu::{Menu, MenuItem, ShapeKind};
use crate::mode::Toolbar;
use da_core::model::*;
use da_core::{CanvasError, Point, SvgParts};

/// Placeholder content of a new text object.
pub const DEFAULT_TEXT: &str = "Text Here";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub toolbar: Toolbar,
    pub menu_item: Option<MenuItem>,
    pub gesture: Gesture,
    pub style: StyleOptions,
}

/// Where and what to stamp once the engine has parsed the SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct StampPlacement {
    pub key: String,
    pub svg: String,
    pub center: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Nothing,
    /// A single object; `select` makes it the active object after insertion.
    Object { object: DrawableObject, select: bool },
    Stamp(StampPlacement),
}

/// Build the object(s) for a released gesture.
///
/// Stamps are resolved against `stamps` by key; an unknown key generates
/// nothing.
pub fn generate(request: &GenerationRequest, stamps: &Menu) -> Generated {
    let gesture = &request.gesture;
    let origin = gesture.top_left();
    let (mx, my) = gesture.extent();
    let style = &request.style;

    match (request.toolbar, &request.menu_item) {
        (Toolbar::Text, _) => {
            let mut text = DrawableObject::new(
                ObjectKind::Text {
                    text: DEFAULT_TEXT.into(),
                    width: mx,
                    height: my,
                    font: style.font.clone(),
                },
                origin.x,
                origin.y,
            );
            text.fill = Some(style.stroke);
            text.selectable = true;
            Generated::Object {
                object: text,
                select: true,
            }
        }
        (Toolbar::Shapes, Some(MenuItem::Shape(shape))) => {
            let kind = match shape {
                ShapeKind::Line => {
                    let end = gesture.end();
                    ObjectKind::Line {
                        x1: gesture.down.x,
                        y1: gesture.down.y,
                        x2: end.x,
                        y2: end.y,
                    }
                }
                ShapeKind::Circle => ObjectKind::Circle {
                    radius: mx.max(my) / 2.0,
                },
                ShapeKind::Ellipse => ObjectKind::Ellipse {
                    rx: mx / 2.0,
                    ry: my / 2.0,
                },
                ShapeKind::Square => ObjectKind::Rect {
                    width: mx,
                    height: mx,
                },
                ShapeKind::Rectangle => ObjectKind::Rect {
                    width: mx,
                    height: my,
                },
                ShapeKind::Triangle => ObjectKind::Triangle {
                    width: mx,
                    height: my,
                },
            };
            Generated::Object {
                object: DrawableObject::new(kind, origin.x, origin.y).with_style(style),
                select: false,
            }
        }
        (Toolbar::Stamps, Some(MenuItem::Stamp(key))) => match stamps.find_stamp(key) {
            Some(svg) => Generated::Stamp(StampPlacement {
                key: key.clone(),
                svg: svg.to_string(),
                center: gesture.midpoint(),
            }),
            None => {
                log::warn!("no stamp with key {key:?}");
                Generated::Nothing
            }
        },
        _ => Generated::Nothing,
    }
}

/// Position one parsed stamp part: centered on `center`, paint and stroke
/// left to the part's own SVG attributes, not selectable.
pub fn place_stamp_part(mut part: DrawableObject, center: Point) -> DrawableObject {
    part.fill = None;
    part.stroke = None;
    part.stroke_width = None;
    part.origin_x = OriginX::Center;
    part.origin_y = OriginY::Center;
    part.left = center.x;
    part.top = center.y;
    part.selectable = false;
    part
}

// ─── Asynchronous stamps ─────────────────────────────────────────────────

/// A stamp waiting on the engine's SVG parse.
pub struct PendingStamp {
    pub key: String,
    pub center: Point,
    pub parts: SvgParts,
}

impl std::fmt::Debug for PendingStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingStamp")
            .field("key", &self.key)
            .field("center", &self.center)
            .finish_non_exhaustive()
    }
}

impl PendingStamp {
    /// Wait for the parse to finish.
    pub async fn ready(self) -> ReadyStamp {
        ReadyStamp {
            key: self.key,
            center: self.center,
            parts: self.parts.await,
        }
    }
}

/// A parsed stamp, ready to hand back to the controller.
#[derive(Debug)]
pub struct ReadyStamp {
    pub key: String,
    pub center: Point,
    pub parts: Result<Vec<DrawableObject>, CanvasError>,
}
