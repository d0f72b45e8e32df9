//! Integration tests: autosave, manual save, delayed image capture and the
//! loading guard.

use da_core::model::*;
use da_core::{
    CanvasError, CanvasEvent, ObjectChange, ObjectId, Point, Scene, SceneCanvas, SvgParts,
};
use da_editor::{CanvasController, HostSignal, IMAGE_SETTLE_DELAY_MS, WidgetConfig};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn config(fire_auto_save: bool, capture_image: bool) -> WidgetConfig {
    WidgetConfig {
        fire_auto_save,
        capture_image,
        ..WidgetConfig::default()
    }
}

fn attached(config: WidgetConfig) -> CanvasController<Scene> {
    let mut controller = CanvasController::new(config);
    controller.attach(Scene::default());
    controller
}

fn draw_rectangle<C: SceneCanvas>(controller: &mut CanvasController<C>) {
    controller.click_shape("Rectangle");
    controller.on_pointer_down(Point::new(10.0, 10.0));
    controller.on_pointer_up(Point::new(60.0, 40.0));
}

fn autosaves(signals: &[HostSignal]) -> usize {
    signals
        .iter()
        .filter(|s| matches!(s, HostSignal::AutoSave { .. }))
        .count()
}

/// A scene that raises mutation events whenever something is loaded into
/// it, the way a real engine fires `object:modified` while rebuilding.
struct NoisyScene(Scene);

impl NoisyScene {
    fn make_noise(&mut self) {
        self.0.push_event(CanvasEvent::ObjectChanged {
            id: None,
            change: ObjectChange::Modified,
        });
        self.0
            .push_event(CanvasEvent::PathCreated(ObjectId::intern("loaded_path")));
    }
}

impl SceneCanvas for NoisyScene {
    fn add(&mut self, object: DrawableObject) {
        self.0.add(object)
    }
    fn remove(&mut self, id: ObjectId) -> bool {
        self.0.remove(id)
    }
    fn object_ids(&self) -> Vec<ObjectId> {
        self.0.object_ids()
    }
    fn set_selectable(&mut self, id: ObjectId, selectable: bool) {
        self.0.set_selectable(id, selectable)
    }
    fn active_objects(&self) -> Vec<ObjectId> {
        self.0.active_objects()
    }
    fn set_active_object(&mut self, id: ObjectId) {
        self.0.set_active_object(id)
    }
    fn discard_active_object(&mut self) {
        self.0.discard_active_object()
    }
    fn request_render(&mut self) {
        self.0.request_render()
    }
    fn set_free_drawing(&mut self, enabled: bool) {
        self.0.set_free_drawing(enabled)
    }
    fn set_brush(&mut self, color: Color, width: f64) {
        self.0.set_brush(color, width)
    }
    fn to_json(&self) -> Result<String, CanvasError> {
        self.0.to_json()
    }
    fn load_json(&mut self, json: &str) -> Result<(), CanvasError> {
        self.make_noise();
        self.0.load_json(json)
    }
    fn set_background_image(&mut self, url: &str) -> Result<(), CanvasError> {
        self.make_noise();
        self.0.set_background_image(url)
    }
    fn to_data_url(&self) -> Result<String, CanvasError> {
        self.0.to_data_url()
    }
    fn set_dimensions(&mut self, width: f64, height: f64) {
        self.0.set_dimensions(width, height)
    }
    fn load_svg(&self, svg: &str) -> SvgParts {
        self.0.load_svg(svg)
    }
    fn take_events(&mut self) -> Vec<CanvasEvent> {
        self.0.take_events()
    }
}

/// Serialized scene holding one selectable rectangle.
fn saved_value() -> String {
    let mut scene = Scene::default();
    let mut rect = DrawableObject::new(
        ObjectKind::Rect {
            width: 40.0,
            height: 40.0,
        },
        5.0,
        5.0,
    )
    .with_style(&StyleOptions::default());
    rect.selectable = true;
    scene.add(rect);
    scene.to_json().unwrap()
}

// ─── Autosave ────────────────────────────────────────────────────────────

#[test]
fn no_autosave_unless_enabled() {
    let mut controller = attached(config(false, false));
    draw_rectangle(&mut controller);
    assert!(controller.drain_signals().is_empty());
}

#[test]
fn generated_object_autosaves_the_live_value() {
    let mut controller = attached(config(true, false));
    draw_rectangle(&mut controller);
    let signals = controller.drain_signals();
    assert_eq!(
        signals,
        vec![HostSignal::AutoSave {
            value: controller.canvas_value()
        }]
    );
}

#[test]
fn each_stamp_part_autosaves() {
    let mut controller = attached(config(true, false));
    controller.add_stamp_option(
        "Pair",
        r#"<svg><rect width="4" height="4"/><circle r="2"/></svg>"#,
    );
    controller.click_stamp("Pair");
    controller.on_pointer_down(Point::new(0.0, 0.0));
    let pending = controller.on_pointer_up(Point::new(8.0, 8.0)).unwrap();
    controller.finish_stamp(futures::executor::block_on(pending.ready()));
    assert_eq!(autosaves(&controller.drain_signals()), 2);
}

#[test]
fn native_changes_autosave() {
    let mut controller = attached(config(true, false));
    draw_rectangle(&mut controller);
    controller.select_selection_tool();
    controller.drain_signals();

    let canvas = controller.canvas_mut().unwrap();
    canvas.pointer_down(Point::new(20.0, 20.0));
    canvas.move_active(5.0, 5.0);
    canvas.pointer_up(Point::new(25.0, 25.0));
    controller.process_events();
    assert_eq!(autosaves(&controller.drain_signals()), 1);

    controller.select_drawing_tool();
    controller
        .canvas_mut()
        .unwrap()
        .draw_path(&[(0.0, 0.0), (3.0, 3.0)]);
    controller.process_events();
    assert_eq!(autosaves(&controller.drain_signals()), 1);
}

#[test]
fn deleting_the_selection_autosaves_once() {
    let mut controller = attached(config(true, false));
    draw_rectangle(&mut controller);
    assert_eq!(controller.delete_selected(), 0);

    controller.select_selection_tool();
    controller.drain_signals();
    controller
        .canvas_mut()
        .unwrap()
        .pointer_down(Point::new(20.0, 20.0));
    assert_eq!(controller.delete_selected(), 1);

    assert!(controller.canvas().unwrap().objects().is_empty());
    assert_eq!(autosaves(&controller.drain_signals()), 1);
}

// ─── Loading guard ───────────────────────────────────────────────────────

#[test]
fn loading_never_autosaves_even_when_the_engine_is_noisy() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut controller = CanvasController::new(WidgetConfig {
        background_image: Some("form.png".into()),
        ..config(true, false)
    });
    controller.set_canvas_value(&saved_value());
    controller.attach(NoisyScene(Scene::default()));
    assert!(controller.drain_signals().is_empty());

    controller.set_canvas_value(&saved_value());
    controller.set_background_image("other.png");
    assert!(controller.drain_signals().is_empty());
    assert!(!controller.is_loading());

    // Outside a load, the same events autosave.
    controller.canvas_mut().unwrap().make_noise();
    controller.process_events();
    assert_eq!(autosaves(&controller.drain_signals()), 2);
}

#[test]
fn loaded_objects_are_locked() {
    let mut controller = attached(config(false, false));
    controller.set_canvas_value(&saved_value());
    let scene = controller.canvas().unwrap();
    assert_eq!(scene.objects().len(), 1);
    assert!(scene.objects().iter().all(|o| !o.selectable));
}

#[test]
fn value_round_trips_through_the_controller() {
    let mut controller = attached(config(false, false));
    draw_rectangle(&mut controller);
    let value = controller.canvas_value();

    let mut other = attached(config(false, false));
    other.set_canvas_value(&value);
    assert_eq!(other.canvas_value(), value);
}

#[test]
fn background_is_applied_on_attach() {
    let mut controller: CanvasController<Scene> = CanvasController::new(config(false, false));
    controller.set_background_image("https://example.com/bg.png");
    assert_eq!(controller.background_image(), Some("https://example.com/bg.png"));

    controller.attach(Scene::default());
    assert_eq!(
        controller.canvas().unwrap().background_image(),
        Some("https://example.com/bg.png")
    );
}

// ─── Manual save & image capture ─────────────────────────────────────────

#[test]
fn manual_save_emits_value_now_and_image_after_delay() {
    let mut controller = attached(config(false, true));
    draw_rectangle(&mut controller);
    let value = controller.canvas_value();

    controller.request_save(1_000.0);
    assert_eq!(
        controller.drain_signals(),
        vec![HostSignal::SaveRequested { value }]
    );
    assert_eq!(
        controller.next_deadline(),
        Some(1_000.0 + IMAGE_SETTLE_DELAY_MS)
    );

    controller.tick(1_000.0 + IMAGE_SETTLE_DELAY_MS - 1.0);
    assert!(controller.drain_signals().is_empty());

    controller.tick(1_000.0 + IMAGE_SETTLE_DELAY_MS);
    let signals = controller.drain_signals();
    assert_eq!(signals.len(), 1);
    match &signals[0] {
        HostSignal::ImageCaptured { data_url } => {
            assert!(data_url.starts_with("data:image/svg+xml"));
            assert_eq!(controller.canvas_png().as_ref(), Some(data_url));
        }
        other => panic!("expected image capture, got {other:?}"),
    }
    assert_eq!(controller.next_deadline(), None);
}

#[test]
fn manual_save_without_capture_emits_no_image() {
    let mut controller = attached(config(true, false));
    controller.request_save(0.0);
    controller.tick(10_000.0);
    let signals = controller.drain_signals();
    assert_eq!(signals.len(), 1);
    assert!(matches!(signals[0], HostSignal::SaveRequested { .. }));
}

#[test]
fn detached_controller_saves_the_stored_value() {
    let mut controller: CanvasController<Scene> = CanvasController::new(config(true, true));
    controller.set_canvas_value("{\"objects\":[]}");
    assert_eq!(controller.canvas_value(), "{\"objects\":[]}");
    assert_eq!(controller.canvas_png(), None);

    controller.request_save(0.0);
    controller.tick(IMAGE_SETTLE_DELAY_MS);
    assert_eq!(
        controller.drain_signals(),
        vec![HostSignal::SaveRequested {
            value: "{\"objects\":[]}".into()
        }]
    );
}

// ─── Sizing ──────────────────────────────────────────────────────────────

#[test]
fn container_resize_never_exceeds_configured_size() {
    let mut controller = attached(WidgetConfig {
        canvas_width: 800.0,
        canvas_height: 300.0,
        ..WidgetConfig::default()
    });
    controller.resize_to_container(640.0, 900.0);
    assert_eq!(controller.canvas().unwrap().dimensions(), (640.0, 300.0));
    controller.resize_to_container(2000.0, 100.0);
    assert_eq!(controller.canvas().unwrap().dimensions(), (800.0, 100.0));
}
