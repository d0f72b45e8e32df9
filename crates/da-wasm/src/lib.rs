//! WASM bridge for Draw Annotation, binding the canvas controller to the
//! page's fabric engine.
//!
//! Compiled via `wasm-pack build --target web`. The host page loads fabric
//! first, then constructs a [`DrawAnnotation`] and attaches it to a canvas
//! element. Host signals (save, autosave, captured image) are delivered to
//! the callback registered with [`DrawAnnotation::set_signal_handler`] as
//! `(eventName, payload)`.

mod console;
mod fabric;
mod resize;

use da_core::model::FONT_FAMILIES;
use da_core::Point;
use da_editor::menu::MenuEntry;
use da_editor::{
    CanvasController, MenuKind, PendingStamp, Toolbar, WidgetConfig, parse_stamp_records,
};
use fabric::FabricCanvas;
use gloo_timers::callback::Timeout;
use js_sys::{Date, Function};
use resize::ResizeSubscription;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlCanvasElement, HtmlElement};

struct Widget {
    controller: CanvasController<FabricCanvas>,
    on_signal: Option<Function>,
    save_timer: Option<SaveTimer>,
}

/// Pending image-capture timer. Dropping it cancels the timeout.
struct SaveTimer {
    deadline: f64,
    handle: Timeout,
}

type SharedWidget = Rc<RefCell<Widget>>;

/// The annotation widget as seen from JavaScript.
///
/// Engine callbacks, stamp loads and the save timer all reach the
/// controller through the same shared cell, so every entry point finishes
/// by pumping queued engine events and flushing host signals.
#[wasm_bindgen]
pub struct DrawAnnotation {
    widget: SharedWidget,
    container: Option<HtmlElement>,
    resize: Option<ResizeSubscription>,
}

#[wasm_bindgen]
impl DrawAnnotation {
    /// Create a widget from the host's JSON configuration. Missing or
    /// invalid settings fall back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console::init(log::Level::Info);
        let config = WidgetConfig::from_json(config_json);
        Self {
            widget: Rc::new(RefCell::new(Widget {
                controller: CanvasController::new(config),
                on_signal: None,
                save_timer: None,
            })),
            container: None,
            resize: None,
        }
    }

    /// Create the engine canvas on `element`. Returns `false` when fabric
    /// is not available; the widget then stays detached.
    pub fn attach(&mut self, element: HtmlCanvasElement, container: Option<HtmlElement>) -> bool {
        let canvas = match FabricCanvas::new(&element) {
            Ok(canvas) => canvas,
            Err(e) => {
                log::error!("cannot attach canvas: {e}");
                return false;
            }
        };
        let weak = Rc::downgrade(&self.widget);
        canvas.set_notify(move || {
            if let Some(widget) = weak.upgrade() {
                pump(&widget);
            }
        });
        self.with(|c| c.attach(canvas));

        self.container = container;
        let allow_resize = self.widget.borrow().controller.config().allow_canvas_resize;
        self.set_allow_canvas_resize(allow_resize);
        true
    }

    /// Tear down the engine canvas and the resize subscription.
    pub fn detach(&mut self) {
        self.resize = None;
        // Dropping the canvas unregisters its engine handlers.
        drop(self.widget.borrow_mut().controller.detach());
    }

    pub fn is_attached(&self) -> bool {
        self.widget.borrow().controller.is_attached()
    }

    /// Register `callback(eventName, payload)` for host signals.
    pub fn set_signal_handler(&mut self, callback: Function) {
        self.widget.borrow_mut().on_signal = Some(callback);
        flush(&self.widget);
    }

    // ─── Value & background ──────────────────────────────────────────────

    pub fn set_canvas_value(&mut self, json: &str) {
        self.with(|c| c.set_canvas_value(json));
    }

    pub fn canvas_value(&self) -> String {
        self.widget.borrow().controller.canvas_value()
    }

    /// PNG data URL of the current canvas, if attached.
    pub fn canvas_png(&self) -> Option<String> {
        self.widget.borrow().controller.canvas_png()
    }

    pub fn set_background_image(&mut self, url: &str) {
        self.with(|c| c.set_background_image(url));
    }

    pub fn background_image(&self) -> Option<String> {
        self.widget
            .borrow()
            .controller
            .background_image()
            .map(str::to_string)
    }

    // ─── Modes & toolbar ─────────────────────────────────────────────────

    /// Switch to `full`, `stamping` or `drawing`. Unknown names mean `full`.
    pub fn set_interaction_mode(&mut self, name: &str, reset_menu_items: bool) {
        self.with(|c| c.set_interaction_mode_named(name, reset_menu_items));
    }

    pub fn interaction_mode(&self) -> String {
        self.widget.borrow().controller.mode().name().to_string()
    }

    pub fn is_toolbar_hidden(&self) -> bool {
        self.widget.borrow().controller.toolbar_hidden()
    }

    /// Flags for the five toolbars as
    /// `{"selection":bool,"drawing":bool,"shapes":bool,"text":bool,"stamps":bool}`.
    pub fn get_toolbar_state(&self) -> String {
        let flags = self.widget.borrow().controller.flags();
        let state: serde_json::Map<String, serde_json::Value> = Toolbar::ALL
            .iter()
            .map(|t| (toolbar_name(*t).to_string(), json!(flags.is_selected(*t))))
            .collect();
        serde_json::Value::Object(state).to_string()
    }

    pub fn select_selection_tool(&mut self) {
        self.with(|c| c.select_selection_tool());
    }

    pub fn select_drawing_tool(&mut self) {
        self.with(|c| c.select_drawing_tool());
    }

    pub fn select_text_tool(&mut self) {
        self.with(|c| c.select_text_tool());
    }

    // ─── Menus ───────────────────────────────────────────────────────────

    pub fn click_shape(&mut self, label: &str) {
        self.with(|c| c.resolve_menu_item_click(label, MenuKind::Shapes));
    }

    pub fn click_stamp(&mut self, label: &str) {
        self.with(|c| c.resolve_menu_item_click(label, MenuKind::Stamps));
    }

    pub fn add_stamp_option(&mut self, label: &str, svg: &str) {
        self.with(|c| c.add_stamp_option(label, svg));
    }

    /// Load stamp records from the host's catalog JSON. Returns the number
    /// of stamps added.
    pub fn load_stamp_catalog(&mut self, json: &str) -> u32 {
        let records = match parse_stamp_records(json) {
            Ok(records) => records,
            Err(e) => {
                log::error!("invalid stamp catalog: {e}");
                return 0;
            }
        };
        self.with(|c| c.load_stamp_catalog(&records)) as u32
    }

    pub fn get_shapes_json(&self) -> String {
        menu_json(self.widget.borrow().controller.shapes())
    }

    pub fn get_stamps_json(&self) -> String {
        menu_json(self.widget.borrow().controller.stamps())
    }

    pub fn has_stamps(&self) -> bool {
        self.widget.borrow().controller.has_stamps()
    }

    // ─── Style ───────────────────────────────────────────────────────────

    pub fn set_fill_color(&mut self, hex: &str) {
        self.with(|c| c.set_fill_color(hex));
    }

    pub fn set_line_color(&mut self, hex: &str) {
        self.with(|c| c.set_line_color(hex));
    }

    pub fn set_line_width(&mut self, input: &str) {
        self.with(|c| c.set_line_width(input));
    }

    pub fn set_font_size(&mut self, input: &str) {
        self.with(|c| c.set_font_size(input));
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.with(|c| c.set_font_family(family));
    }

    /// Current style options as JSON.
    pub fn get_style_json(&self) -> String {
        serde_json::to_string(self.widget.borrow().controller.style())
            .unwrap_or_else(|_| "{}".to_string())
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Pointer press outside the engine's own event stream.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.with(|c| c.on_pointer_down(Point::new(x, y)));
    }

    /// Pointer release outside the engine's own event stream.
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        let pending = self.with(|c| c.on_pointer_up(Point::new(x, y)));
        if let Some(stamp) = pending {
            spawn_stamp(&self.widget, stamp);
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Delete the active selection. Returns the number of objects removed.
    pub fn delete_selected(&mut self) -> u32 {
        self.with(|c| c.delete_selected()) as u32
    }

    /// Manual save: emits the value now and, when enabled, the image after
    /// the engine has settled.
    pub fn save(&mut self) {
        self.with(|c| c.request_save(Date::now()));
    }

    /// Acquire or drop the window resize subscription.
    pub fn set_allow_canvas_resize(&mut self, allow: bool) {
        self.resize = None;
        if !allow {
            return;
        }
        let (Some(window), Some(container)) = (web_sys::window(), self.container.clone()) else {
            log::warn!("canvas resize needs a window and a container element");
            return;
        };

        let weak = Rc::downgrade(&self.widget);
        let on_resize = move |width, height| {
            let Some(widget) = weak.upgrade() else {
                return;
            };
            if let Ok(mut w) = widget.try_borrow_mut() {
                w.controller.resize_to_container(width, height);
            }
            pump(&widget);
        };
        let (width, height) = resize::container_size(&container);
        self.with(|c| c.resize_to_container(width, height));

        match ResizeSubscription::new(window, container, on_resize) {
            Ok(subscription) => self.resize = Some(subscription),
            Err(e) => log::error!("cannot subscribe to resize: {}", fabric::describe(&e)),
        }
    }
}

impl DrawAnnotation {
    /// Run `f` against the controller, then pump engine events.
    fn with<R>(&self, f: impl FnOnce(&mut CanvasController<FabricCanvas>) -> R) -> R {
        let result = f(&mut self.widget.borrow_mut().controller);
        pump(&self.widget);
        result
    }
}

impl Drop for DrawAnnotation {
    fn drop(&mut self) {
        self.detach();
    }
}

// ─── Event pump ──────────────────────────────────────────────────────────

/// Handle queued engine events, start any stamp loads they produced and
/// flush signals. A re-entrant call returns at once; the outer caller
/// drains the queue.
fn pump(widget: &SharedWidget) {
    let pending = match widget.try_borrow_mut() {
        Ok(mut w) => w.controller.process_events(),
        Err(_) => return,
    };
    for stamp in pending {
        spawn_stamp(widget, stamp);
    }
    flush(widget);
}

fn spawn_stamp(widget: &SharedWidget, stamp: PendingStamp) {
    let widget = Rc::clone(widget);
    spawn_local(async move {
        let ready = stamp.ready().await;
        let added = widget.borrow_mut().controller.finish_stamp(ready);
        log::debug!("stamp inserted with {added} parts");
        pump(&widget);
    });
}

/// Deliver signals to the host callback and keep the save timer in line
/// with the controller's next deadline.
fn flush(widget: &SharedWidget) {
    let (signals, callback) = {
        let Ok(mut w) = widget.try_borrow_mut() else {
            return;
        };
        let armed = w.save_timer.as_ref().map(|t| t.deadline);
        let next = w.controller.next_deadline();
        if let Some(deadline) = next.filter(|_| needs_rearm(armed, next, Date::now())) {
            w.save_timer = Some(arm_save_timer(widget, deadline));
        }
        (w.controller.drain_signals(), w.on_signal.clone())
    };

    match callback {
        Some(callback) => {
            for signal in signals {
                let name = JsValue::from_str(signal.event_name());
                let payload = JsValue::from_str(signal.payload());
                if let Err(e) = callback.call2(&JsValue::NULL, &name, &payload) {
                    log::error!("signal handler threw: {}", fabric::describe(&e));
                }
            }
        }
        None if !signals.is_empty() => {
            log::debug!("dropping {} signals: no handler registered", signals.len());
        }
        None => {}
    }
}

/// Whether the save timer has to be (re)armed for `next`. A timer whose
/// deadline has passed without capturing counts as spent.
fn needs_rearm(armed: Option<f64>, next: Option<f64>, now_ms: f64) -> bool {
    match (armed, next) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(armed), Some(next)) => armed != next || armed <= now_ms,
    }
}

fn arm_save_timer(widget: &SharedWidget, deadline: f64) -> SaveTimer {
    let shared = Rc::clone(widget);
    let delay = (deadline - Date::now()).max(0.0).ceil() as u32;
    let handle = Timeout::new(delay, move || {
        if let Ok(mut w) = shared.try_borrow_mut() {
            // This callback is still running; leak the spent handle rather
            // than free it mid-call.
            if let Some(fired) = w.save_timer.take() {
                let _ = fired.handle.forget();
            }
            w.controller.tick(Date::now());
        }
        pump(&shared);
    });
    SaveTimer { deadline, handle }
}

// ─── JSON views ──────────────────────────────────────────────────────────

fn toolbar_name(toolbar: Toolbar) -> &'static str {
    match toolbar {
        Toolbar::Selection => "selection",
        Toolbar::Drawing => "drawing",
        Toolbar::Shapes => "shapes",
        Toolbar::Text => "text",
        Toolbar::Stamps => "stamps",
    }
}

fn menu_json(entries: &[MenuEntry]) -> String {
    let items: Vec<_> = entries
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "label": e.label,
                "class": e.class,
                "checked": e.checked,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Font family picker options as `[{"label":..,"value":..}]`.
#[wasm_bindgen]
pub fn font_families_json() -> String {
    let options: Vec<_> = FONT_FAMILIES
        .iter()
        .map(|(label, value)| json!({ "label": label, "value": value }))
        .collect();
    serde_json::Value::Array(options).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use da_editor::menu::ShapeKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_json_lists_entries_in_order() {
        let entries = [
            MenuEntry::shape(ShapeKind::Line),
            MenuEntry::stamp("Sign Here", "<svg/>"),
        ];
        let parsed: serde_json::Value = serde_json::from_str(&menu_json(&entries)).unwrap();
        assert_eq!(parsed[0]["label"], "Line");
        assert_eq!(parsed[0]["id"], "shapeLine");
        assert_eq!(parsed[1]["id"], "stampsign-here");
        assert_eq!(parsed[1]["checked"], false);
    }

    #[test]
    fn save_timer_follows_the_next_deadline() {
        assert!(!needs_rearm(None, None, 0.0));
        assert!(needs_rearm(None, Some(500.0), 0.0));
        assert!(!needs_rearm(Some(500.0), Some(500.0), 100.0));
        assert!(needs_rearm(Some(500.0), Some(900.0), 100.0));
        // Fired without capturing: arm again instead of waiting forever.
        assert!(needs_rearm(Some(500.0), Some(500.0), 700.0));
        assert!(!needs_rearm(Some(500.0), None, 700.0));
    }

    #[test]
    fn font_families_are_label_value_pairs() {
        let parsed: serde_json::Value = serde_json::from_str(&font_families_json()).unwrap();
        assert_eq!(parsed[0], json!({ "label": "Serif", "value": "serif" }));
    }
}
