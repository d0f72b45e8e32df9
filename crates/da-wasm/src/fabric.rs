//! `SceneCanvas` backed by the page's fabric.js engine.
//!
//! fabric is loaded by the host page as a global script, so nothing here
//! links against it: the bindings below are resolved at call time and a
//! missing engine is reported as [`CanvasError::EngineUnavailable`].
//!
//! Objects are identified by a `daId` property set on each fabric object.
//! Objects the engine creates on its own (free-draw paths, loaded scenes)
//! get an id the first time the controller sees them.

use da_core::model::{DrawableObject, ObjectKind};
use da_core::{CanvasError, CanvasEvent, ObjectChange, ObjectId, Point, SceneCanvas, SvgParts, SvgShape};
use futures::channel::oneshot;
use futures::future;
use js_sys::{Array, Function, JSON, Reflect};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

const ID_KEY: &str = "daId";

#[wasm_bindgen(js_namespace = fabric)]
extern "C" {
    #[derive(Debug, Clone)]
    type Canvas;

    #[wasm_bindgen(constructor, catch)]
    fn new(element: &HtmlCanvasElement) -> Result<Canvas, JsValue>;

    #[wasm_bindgen(method)]
    fn add(this: &Canvas, object: &JsValue);

    #[wasm_bindgen(method)]
    fn remove(this: &Canvas, object: &JsValue);

    #[wasm_bindgen(method, js_name = getObjects)]
    fn get_objects(this: &Canvas) -> Array;

    #[wasm_bindgen(method, js_name = getActiveObjects)]
    fn get_active_objects(this: &Canvas) -> Array;

    #[wasm_bindgen(method, js_name = setActiveObject)]
    fn set_active_object(this: &Canvas, object: &JsValue);

    #[wasm_bindgen(method, js_name = discardActiveObject)]
    fn discard_active_object(this: &Canvas);

    #[wasm_bindgen(method, js_name = requestRenderAll)]
    fn request_render_all(this: &Canvas);

    #[wasm_bindgen(method, setter = isDrawingMode)]
    fn set_is_drawing_mode(this: &Canvas, enabled: bool);

    #[wasm_bindgen(method, getter = freeDrawingBrush)]
    fn free_drawing_brush(this: &Canvas) -> JsValue;

    #[wasm_bindgen(method, js_name = toJSON)]
    fn to_object(this: &Canvas, extra_properties: &Array) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = loadFromJSON)]
    fn load_from_json(this: &Canvas, json: &str, callback: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setBackgroundImage)]
    fn set_background_image(this: &Canvas, url: &str, callback: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = toDataURL)]
    fn to_data_url(this: &Canvas) -> Result<String, JsValue>;

    #[wasm_bindgen(method, js_name = setDimensions)]
    fn set_dimensions(this: &Canvas, dimensions: &JsValue);

    #[wasm_bindgen(method)]
    fn on(this: &Canvas, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &Canvas, event: &str, handler: &Function);

    #[wasm_bindgen(catch, js_name = loadSVGFromString)]
    fn load_svg_from_string(svg: &str, callback: &JsValue) -> Result<(), JsValue>;
}

// ─── JS helpers ──────────────────────────────────────────────────────────

fn fabric_loaded() -> bool {
    Reflect::get(&js_sys::global(), &JsValue::from_str("fabric"))
        .map(|f| f.is_object())
        .unwrap_or(false)
}

/// Human-readable form of a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

fn engine_err(err: JsValue) -> CanvasError {
    CanvasError::Engine(describe(&err))
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn set(target: &JsValue, key: &str, value: &JsValue) {
    if let Err(e) = Reflect::set(target, &JsValue::from_str(key), value) {
        log::warn!("failed to set `{key}`: {}", describe(&e));
    }
}

fn number(target: &JsValue, key: &str) -> Option<f64> {
    get(target, key).and_then(|v| v.as_f64())
}

/// JSON value → plain JS object.
fn to_js(value: &Value) -> Result<JsValue, CanvasError> {
    JSON::parse(&value.to_string()).map_err(engine_err)
}

/// Record the ids of a saved scene as taken before the engine finishes
/// loading it, so nothing generated meanwhile reuses them.
fn reserve_ids(scene: &Value) -> usize {
    scene
        .get("objects")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|object| object.get(ID_KEY).and_then(Value::as_str))
        .map(ObjectId::intern)
        .count()
}

/// The object's id, assigning a fresh one if it has none yet.
fn object_id(object: &JsValue) -> ObjectId {
    if let Some(id) = get(object, ID_KEY).and_then(|v| v.as_string()) {
        return ObjectId::intern(&id);
    }
    let kind = get(object, "type")
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "object".into());
    let id = ObjectId::with_prefix(&kind);
    set(object, ID_KEY, &JsValue::from_str(id.as_str()));
    id
}

fn pointer(options: &JsValue) -> Option<Point> {
    let p = get(options, "pointer")?;
    Some(Point::new(number(&p, "x")?, number(&p, "y")?))
}

fn construct(class: &str, args: &Array) -> Result<JsValue, CanvasError> {
    let fabric = get(&js_sys::global(), "fabric")
        .ok_or_else(|| CanvasError::EngineUnavailable("fabric is not loaded".into()))?;
    let constructor = get(&fabric, class)
        .and_then(|c| c.dyn_into::<Function>().ok())
        .ok_or_else(|| CanvasError::Engine(format!("fabric.{class} is not a constructor")))?;
    Reflect::construct(&constructor, args).map_err(engine_err)
}

fn path_data(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| format!("{} {x} {y}", if i == 0 { 'M' } else { 'L' }))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the fabric object for a drawable.
fn to_fabric(object: &DrawableObject) -> Result<JsValue, CanvasError> {
    let mut options = json!({
        "left": object.left,
        "top": object.top,
        "originX": object.origin_x,
        "originY": object.origin_y,
        "selectable": object.selectable,
        ID_KEY: object.id,
    });
    if let Some(fill) = object.fill {
        options["fill"] = json!(fill);
    }
    if let Some(stroke) = object.stroke {
        options["stroke"] = json!(stroke);
    }
    if let Some(width) = object.stroke_width {
        options["strokeWidth"] = json!(width);
    }

    let (class, first_arg): (&str, Option<JsValue>) = match &object.kind {
        ObjectKind::Text {
            text,
            width,
            height,
            font,
        } => {
            if let (Value::Object(map), Ok(Value::Object(font))) =
                (&mut options, serde_json::to_value(font))
            {
                map.extend(font);
            }
            options["width"] = json!(width);
            options["height"] = json!(height);
            ("IText", Some(JsValue::from_str(text)))
        }
        ObjectKind::Line { x1, y1, x2, y2 } => {
            ("Line", Some(to_js(&json!([x1, y1, x2, y2]))?))
        }
        ObjectKind::Circle { radius } => {
            options["radius"] = json!(radius);
            ("Circle", None)
        }
        ObjectKind::Ellipse { rx, ry } => {
            options["rx"] = json!(rx);
            options["ry"] = json!(ry);
            ("Ellipse", None)
        }
        ObjectKind::Rect { width, height } => {
            options["width"] = json!(width);
            options["height"] = json!(height);
            ("Rect", None)
        }
        ObjectKind::Triangle { width, height } => {
            options["width"] = json!(width);
            options["height"] = json!(height);
            ("Triangle", None)
        }
        ObjectKind::Path { points } => ("Path", Some(JsValue::from_str(&path_data(points)))),
        ObjectKind::Svg { .. } => {
            return Err(CanvasError::Engine(format!(
                "stamp part {} was not produced by this engine",
                object.id
            )));
        }
    };

    let args = Array::new();
    if let Some(arg) = first_arg {
        args.push(&arg);
    }
    args.push(&to_js(&options)?);
    construct(class, &args)
}

/// Describe a parsed fabric SVG element as a stamp part.
fn svg_part(element: &JsValue) -> DrawableObject {
    let id = object_id(element);
    let tag = get(element, "type")
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "path".into());
    let (left, top) = (
        number(element, "left").unwrap_or(0.0),
        number(element, "top").unwrap_or(0.0),
    );
    let attributes = [
        ("x", left),
        ("y", top),
        ("width", number(element, "width").unwrap_or(0.0)),
        ("height", number(element, "height").unwrap_or(0.0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut part = DrawableObject::new(
        ObjectKind::Svg {
            shape: SvgShape {
                tag,
                attributes,
                content: None,
            },
        },
        left,
        top,
    );
    part.id = id;
    part
}

// ─── Canvas ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct FabricState {
    events: Vec<CanvasEvent>,
    /// Stamp parts parsed by the engine, waiting to be added.
    pending_parts: HashMap<ObjectId, JsValue>,
    /// Called after an engine event has been queued.
    notify: Option<Rc<dyn Fn()>>,
}

pub struct FabricCanvas {
    canvas: Canvas,
    state: Rc<RefCell<FabricState>>,
    handlers: Vec<(&'static str, Closure<dyn FnMut(JsValue)>)>,
}

impl FabricCanvas {
    /// Create the engine canvas on `element` and start listening to it.
    pub fn new(element: &HtmlCanvasElement) -> Result<Self, CanvasError> {
        if !fabric_loaded() {
            return Err(CanvasError::EngineUnavailable(
                "fabric is not loaded on this page".into(),
            ));
        }
        let canvas = Canvas::new(element)
            .map_err(|e| CanvasError::EngineUnavailable(describe(&e)))?;

        let mut this = Self {
            canvas,
            state: Rc::new(RefCell::new(FabricState::default())),
            handlers: Vec::new(),
        };
        this.listen("mouse:down", |o| pointer(o).map(CanvasEvent::PointerDown));
        this.listen("mouse:up", |o| pointer(o).map(CanvasEvent::PointerUp));
        this.listen("path:created", |o| {
            get(o, "path").map(|path| CanvasEvent::PathCreated(object_id(&path)))
        });
        for name in ObjectChange::EVENT_NAMES {
            if let Some(change) = ObjectChange::from_event_name(name) {
                this.listen(name, move |o| {
                    Some(CanvasEvent::ObjectChanged {
                        id: get(o, "target").map(|t| object_id(&t)),
                        change,
                    })
                });
            }
        }
        Ok(this)
    }

    /// Register the callback run after each queued engine event.
    pub fn set_notify(&self, notify: impl Fn() + 'static) {
        self.state.borrow_mut().notify = Some(Rc::new(notify));
    }

    fn listen(
        &mut self,
        name: &'static str,
        map: impl Fn(&JsValue) -> Option<CanvasEvent> + 'static,
    ) {
        let state = Rc::clone(&self.state);
        let handler = Closure::<dyn FnMut(JsValue)>::new(move |options: JsValue| {
            let Some(event) = map(&options) else {
                return;
            };
            let notify = {
                let mut state = state.borrow_mut();
                state.events.push(event);
                state.notify.clone()
            };
            if let Some(notify) = notify {
                notify();
            }
        });
        self.canvas.on(name, handler.as_ref().unchecked_ref());
        self.handlers.push((name, handler));
    }

    fn find(&self, id: ObjectId) -> Option<JsValue> {
        self.canvas
            .get_objects()
            .iter()
            .find(|o| get(o, ID_KEY).and_then(|v| v.as_string()).as_deref() == Some(id.as_str()))
    }

    /// Callback that redraws once the engine finishes an async load.
    fn render_when_done(&self, lock_objects: bool) -> JsValue {
        let canvas = self.canvas.clone();
        Closure::once_into_js(move || {
            if lock_objects {
                for object in canvas.get_objects().iter() {
                    set(&object, "selectable", &JsValue::FALSE);
                }
            }
            canvas.request_render_all();
        })
    }
}

impl Drop for FabricCanvas {
    fn drop(&mut self) {
        for (name, handler) in &self.handlers {
            self.canvas.off(name, handler.as_ref().unchecked_ref());
        }
    }
}

impl SceneCanvas for FabricCanvas {
    fn add(&mut self, object: DrawableObject) {
        let pending = self.state.borrow_mut().pending_parts.remove(&object.id);
        let js = match pending {
            Some(part) => {
                // Parts keep the paint they were parsed with.
                set(&part, "left", &object.left.into());
                set(&part, "top", &object.top.into());
                set(&part, "originX", &json!(object.origin_x).as_str().unwrap_or("left").into());
                set(&part, "originY", &json!(object.origin_y).as_str().unwrap_or("top").into());
                set(&part, "selectable", &object.selectable.into());
                part
            }
            None => match to_fabric(&object) {
                Ok(js) => js,
                Err(e) => {
                    log::error!("cannot add {:?}: {e}", object.id);
                    return;
                }
            },
        };
        self.canvas.add(&js);
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        match self.find(id) {
            Some(object) => {
                self.canvas.remove(&object);
                true
            }
            None => false,
        }
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.canvas.get_objects().iter().map(|o| object_id(&o)).collect()
    }

    fn set_selectable(&mut self, id: ObjectId, selectable: bool) {
        if let Some(object) = self.find(id) {
            set(&object, "selectable", &selectable.into());
        }
    }

    fn active_objects(&self) -> Vec<ObjectId> {
        self.canvas
            .get_active_objects()
            .iter()
            .map(|o| object_id(&o))
            .collect()
    }

    fn set_active_object(&mut self, id: ObjectId) {
        if let Some(object) = self.find(id) {
            self.canvas.set_active_object(&object);
        }
    }

    fn discard_active_object(&mut self) {
        self.canvas.discard_active_object();
    }

    fn request_render(&mut self) {
        self.canvas.request_render_all();
    }

    fn set_free_drawing(&mut self, enabled: bool) {
        self.canvas.set_is_drawing_mode(enabled);
    }

    fn set_brush(&mut self, color: da_core::Color, width: f64) {
        let brush = self.canvas.free_drawing_brush();
        if brush.is_object() {
            set(&brush, "color", &JsValue::from_str(&color.to_hex()));
            set(&brush, "width", &width.into());
        }
    }

    fn to_json(&self) -> Result<String, CanvasError> {
        let object = self
            .canvas
            .to_object(&Array::of1(&JsValue::from_str(ID_KEY)));
        JSON::stringify(&object)
            .map_err(engine_err)?
            .as_string()
            .ok_or_else(|| CanvasError::Engine("scene did not serialize to a string".into()))
    }

    fn load_json(&mut self, json: &str) -> Result<(), CanvasError> {
        if json.trim().is_empty() {
            return Ok(());
        }
        // Reject malformed values before the engine half-loads them.
        let value: Value = serde_json::from_str(json)?;
        reserve_ids(&value);
        let done = self.render_when_done(true);
        self.canvas.load_from_json(json, &done).map_err(engine_err)
    }

    fn set_background_image(&mut self, url: &str) -> Result<(), CanvasError> {
        let done = self.render_when_done(false);
        self.canvas
            .set_background_image(url, &done)
            .map_err(engine_err)
    }

    fn to_data_url(&self) -> Result<String, CanvasError> {
        self.canvas.to_data_url().map_err(engine_err)
    }

    fn set_dimensions(&mut self, width: f64, height: f64) {
        match to_js(&json!({ "width": width, "height": height })) {
            Ok(dimensions) => self.canvas.set_dimensions(&dimensions),
            Err(e) => log::error!("cannot resize canvas: {e}"),
        }
    }

    fn load_svg(&self, svg: &str) -> SvgParts {
        let (tx, rx) = oneshot::channel();
        let state = Rc::clone(&self.state);
        let callback = Closure::once_into_js(move |elements: JsValue, _options: JsValue| {
            let parts: Vec<DrawableObject> = Array::from(&elements)
                .iter()
                .map(|element| {
                    let part = svg_part(&element);
                    state.borrow_mut().pending_parts.insert(part.id, element);
                    part
                })
                .collect();
            let _ = tx.send(parts);
        });

        if let Err(e) = load_svg_from_string(svg, &callback) {
            return Box::pin(future::ready(Err(CanvasError::SvgParse(describe(&e)))));
        }
        Box::pin(async move {
            rx.await
                .map_err(|_| CanvasError::Engine("SVG load was dropped by the engine".into()))
        })
    }

    fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}
