//! Canvas capability trait and the in-memory scene.
//!
//! The controller only ever talks to a canvas through [`SceneCanvas`]. A
//! browser build binds it to the JS engine; [`Scene`] is a complete engine
//! in plain Rust that native hosts and the test suites drive directly.

use crate::emitter;
use crate::error::CanvasError;
use crate::event::{CanvasEvent, ObjectChange};
use crate::hit;
use crate::id::ObjectId;
use crate::model::{Color, DrawableObject, ObjectKind, points_bounds};
use crate::parser::parse_svg;
use futures::future::{self, LocalBoxFuture};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stamp SVG converted to objects, resolved once the engine has parsed it.
pub type SvgParts = LocalBoxFuture<'static, Result<Vec<DrawableObject>, CanvasError>>;

/// Everything the interaction controller needs from a 2D scene engine.
pub trait SceneCanvas {
    /// Insert an object on top of the scene.
    fn add(&mut self, object: DrawableObject);
    /// Remove an object. Returns false if it was not in the scene.
    fn remove(&mut self, id: ObjectId) -> bool;
    /// Ids of all objects, back to front.
    fn object_ids(&self) -> Vec<ObjectId>;
    fn set_selectable(&mut self, id: ObjectId, selectable: bool);

    fn active_objects(&self) -> Vec<ObjectId>;
    fn set_active_object(&mut self, id: ObjectId);
    fn discard_active_object(&mut self);
    fn request_render(&mut self);

    fn set_free_drawing(&mut self, enabled: bool);
    fn set_brush(&mut self, color: Color, width: f64);

    /// Serialize the whole scene.
    fn to_json(&self) -> Result<String, CanvasError>;
    /// Replace the scene with a serialized one. An empty string leaves the
    /// scene untouched.
    fn load_json(&mut self, json: &str) -> Result<(), CanvasError>;
    fn set_background_image(&mut self, url: &str) -> Result<(), CanvasError>;
    /// Image snapshot of the scene as a `data:` URL.
    fn to_data_url(&self) -> Result<String, CanvasError>;
    fn set_dimensions(&mut self, width: f64, height: f64);

    /// Parse stamp SVG into placeable objects.
    fn load_svg(&self, svg: &str) -> SvgParts;

    /// Drain native events queued since the last call.
    fn take_events(&mut self) -> Vec<CanvasEvent>;
}

// ─── In-memory scene ─────────────────────────────────────────────────────

pub const SCENE_VERSION: &str = "1";

/// Serialized form of a [`Scene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneDocument {
    pub version: String,
    pub objects: Vec<DrawableObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: SCENE_VERSION.into(),
            objects: Vec::new(),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    document: SceneDocument,
    active: SmallVec<[ObjectId; 2]>,
    events: Vec<CanvasEvent>,
    free_drawing: bool,
    brush_color: Color,
    brush_width: f64,
    width: f64,
    height: f64,
    renders: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(1000.0, 400.0)
    }
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            document: SceneDocument::default(),
            active: SmallVec::new(),
            events: Vec::new(),
            free_drawing: false,
            brush_color: Color::BLACK,
            brush_width: 1.0,
            width,
            height,
            renders: 0,
        }
    }

    pub fn objects(&self) -> &[DrawableObject] {
        &self.document.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&DrawableObject> {
        self.document.objects.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: ObjectId) -> Option<&mut DrawableObject> {
        self.document.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn is_free_drawing(&self) -> bool {
        self.free_drawing
    }

    pub fn brush(&self) -> (Color, f64) {
        (self.brush_color, self.brush_width)
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn background_image(&self) -> Option<&str> {
        self.document.background_image.as_deref()
    }

    /// Number of render requests received so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Queue an event as if the engine had raised it.
    pub fn push_event(&mut self, event: CanvasEvent) {
        self.events.push(event);
    }

    // ─── Native interactions ─────────────────────────────────────────────

    /// Pointer press: selects the topmost selectable object under the
    /// pointer (or clears the selection) and queues `PointerDown`.
    pub fn pointer_down(&mut self, point: Point) {
        self.active.clear();
        if let Some(obj) = hit::hit_test(&self.document.objects, point) {
            self.active.push(obj.id);
        }
        self.events.push(CanvasEvent::PointerDown(point));
    }

    pub fn pointer_up(&mut self, point: Point) {
        self.events.push(CanvasEvent::PointerUp(point));
    }

    /// Commit a free-draw stroke. Ignored unless free drawing is on.
    pub fn draw_path(&mut self, points: &[(f64, f64)]) -> Option<ObjectId> {
        if !self.free_drawing || points.is_empty() {
            return None;
        }
        let (min_x, min_y, _, _) = points_bounds(points);
        let mut path = DrawableObject::new(
            ObjectKind::Path {
                points: points.to_vec(),
            },
            min_x,
            min_y,
        );
        path.stroke = Some(self.brush_color);
        path.stroke_width = Some(self.brush_width);
        path.selectable = true;
        let id = path.id;
        self.document.objects.push(path);
        self.events.push(CanvasEvent::PathCreated(id));
        Some(id)
    }

    /// Drag the active selection by `(dx, dy)`.
    pub fn move_active(&mut self, dx: f64, dy: f64) {
        let active = self.active.clone();
        for id in active {
            if let Some(obj) = self.get_mut(id) {
                obj.left += dx;
                obj.top += dy;
                self.events.push(CanvasEvent::ObjectChanged {
                    id: Some(id),
                    change: ObjectChange::Moved,
                });
            }
        }
    }
}

impl SceneCanvas for Scene {
    fn add(&mut self, object: DrawableObject) {
        log::trace!("scene add {:?} ({})", object.id, object.kind.name());
        self.document.objects.push(object);
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.document.objects.len();
        self.document.objects.retain(|o| o.id != id);
        self.active.retain(|a| *a != id);
        self.document.objects.len() != before
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.document.objects.iter().map(|o| o.id).collect()
    }

    fn set_selectable(&mut self, id: ObjectId, selectable: bool) {
        if let Some(obj) = self.get_mut(id) {
            obj.selectable = selectable;
        }
    }

    fn active_objects(&self) -> Vec<ObjectId> {
        self.active.to_vec()
    }

    fn set_active_object(&mut self, id: ObjectId) {
        if self.get(id).is_some() {
            self.active.clear();
            self.active.push(id);
        }
    }

    fn discard_active_object(&mut self) {
        self.active.clear();
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }

    fn set_free_drawing(&mut self, enabled: bool) {
        self.free_drawing = enabled;
    }

    fn set_brush(&mut self, color: Color, width: f64) {
        self.brush_color = color;
        self.brush_width = width;
    }

    fn to_json(&self) -> Result<String, CanvasError> {
        Ok(serde_json::to_string(&self.document)?)
    }

    fn load_json(&mut self, json: &str) -> Result<(), CanvasError> {
        if json.trim().is_empty() {
            return Ok(());
        }
        self.document = serde_json::from_str(json)?;
        self.active.clear();
        self.renders += 1;
        Ok(())
    }

    fn set_background_image(&mut self, url: &str) -> Result<(), CanvasError> {
        self.document.background_image = Some(url.to_string());
        self.renders += 1;
        Ok(())
    }

    fn to_data_url(&self) -> Result<String, CanvasError> {
        let svg = emitter::emit_svg(
            &self.document.objects,
            self.width,
            self.height,
            self.background_image(),
        );
        Ok(emitter::to_data_url(&svg))
    }

    fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn load_svg(&self, svg: &str) -> SvgParts {
        let parts = parse_svg(svg).map_err(CanvasError::SvgParse).map(|shapes| {
            shapes
                .into_iter()
                .map(|shape| {
                    let origin = shape.bounds().origin();
                    DrawableObject::new(ObjectKind::Svg { shape }, origin.x, origin.y)
                })
                .collect()
        });
        Box::pin(future::ready(parts))
    }

    fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyleOptions;

    fn rect(left: f64, top: f64) -> DrawableObject {
        DrawableObject::new(
            ObjectKind::Rect {
                width: 20.0,
                height: 20.0,
            },
            left,
            top,
        )
        .with_style(&StyleOptions::default())
    }

    #[test]
    fn free_draw_only_when_enabled() {
        let mut scene = Scene::default();
        assert!(scene.draw_path(&[(0.0, 0.0), (5.0, 5.0)]).is_none());

        scene.set_free_drawing(true);
        scene.set_brush(Color::from_hex("#FF0000").unwrap(), 4.0);
        let id = scene.draw_path(&[(3.0, 7.0), (5.0, 5.0)]).unwrap();
        let path = scene.get(id).unwrap();
        assert_eq!((path.left, path.top), (3.0, 5.0));
        assert_eq!(path.stroke_width, Some(4.0));
        assert_eq!(scene.take_events(), vec![CanvasEvent::PathCreated(id)]);
        assert!(scene.take_events().is_empty());
    }

    #[test]
    fn pointer_down_selects_only_selectable_objects() {
        let mut scene = Scene::default();
        let locked = rect(0.0, 0.0);
        scene.add(locked.clone());
        scene.pointer_down(Point::new(10.0, 10.0));
        assert!(scene.active_objects().is_empty());

        scene.set_selectable(locked.id, true);
        scene.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(scene.active_objects(), vec![locked.id]);
    }

    #[test]
    fn moving_selection_raises_change_events() {
        let mut scene = Scene::default();
        let obj = rect(0.0, 0.0);
        scene.add(obj.clone());
        scene.set_active_object(obj.id);
        scene.move_active(5.0, -2.0);
        assert_eq!(scene.get(obj.id).map(|o| (o.left, o.top)), Some((5.0, -2.0)));
        assert_eq!(
            scene.take_events(),
            vec![CanvasEvent::ObjectChanged {
                id: Some(obj.id),
                change: ObjectChange::Moved
            }]
        );
    }

    #[test]
    fn remove_clears_selection() {
        let mut scene = Scene::default();
        let obj = rect(0.0, 0.0);
        scene.add(obj.clone());
        scene.set_active_object(obj.id);
        assert!(scene.remove(obj.id));
        assert!(!scene.remove(obj.id));
        assert!(scene.active_objects().is_empty());
    }

    #[test]
    fn svg_parts_resolve_immediately() {
        let scene = Scene::default();
        let parts = futures::executor::block_on(
            scene.load_svg(r#"<svg><rect x="4" y="6" width="10" height="10"/><circle r="3"/></svg>"#),
        )
        .unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[0].left, parts[0].top), (4.0, 6.0));

        let bad = futures::executor::block_on(scene.load_svg("<svg><g></svg>"));
        assert!(matches!(bad, Err(CanvasError::SvgParse(_))));
    }
}
