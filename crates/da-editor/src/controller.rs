//! Canvas interaction controller.
//!
//! Owns the toolbar state machine, the menus, the live gesture and the save
//! policy, and drives a [`SceneCanvas`] through them. The canvas is optional:
//! until [`CanvasController::attach`] runs, state changes are recorded and
//! every canvas side effect is skipped.
//!
//! Engine events are pulled, not pushed: after forwarding user input to the
//! engine, the host calls [`CanvasController::process_events`], which drains
//! the engine's queue and reacts to each event in order.

use crate::catalog::StampRecord;
use crate::config::WidgetConfig;
use crate::generate::{
    GenerationRequest, Generated, PendingStamp, ReadyStamp, generate, place_stamp_part,
};
use crate::gesture::Gesture;
use crate::menu::{Menu, MenuEntry, MenuItem, MenuKind};
use crate::mode::{InteractionMode, Toolbar, ToolbarFlags};
use crate::save::{HostSignal, SavePolicy};
use da_core::model::{Color, DrawableObject, StyleOptions};
use da_core::{CanvasEvent, Point, SceneCanvas};

pub struct CanvasController<C: SceneCanvas> {
    canvas: Option<C>,
    config: WidgetConfig,
    mode: InteractionMode,
    flags: ToolbarFlags,
    shapes: Menu,
    stamps: Menu,
    menu_item: Option<MenuItem>,
    gesture: Gesture,
    style: StyleOptions,
    save: SavePolicy,
    /// Set while a value or background is being loaded; suppresses autosave.
    loading: bool,
    value: String,
    background_image: Option<String>,
    last_image: Option<String>,
}

impl<C: SceneCanvas> CanvasController<C> {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            canvas: None,
            mode: InteractionMode::from_name(&config.interaction_mode),
            flags: ToolbarFlags::default(),
            shapes: Menu::shapes(),
            stamps: Menu::default(),
            menu_item: None,
            gesture: Gesture::new(),
            style: config.style.clone(),
            save: SavePolicy::new(config.fire_auto_save, config.capture_image),
            loading: false,
            value: String::new(),
            background_image: config.background_image.clone(),
            last_image: None,
            config,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Install the engine, then bring it in line with the recorded state:
    /// dimensions, initial toolbar, stored value and background.
    pub fn attach(&mut self, mut canvas: C) {
        canvas.set_dimensions(self.config.canvas_width, self.config.canvas_height);
        self.canvas = Some(canvas);
        log::debug!("canvas attached in {} mode", self.mode.name());

        match self.mode {
            InteractionMode::Stamping => {
                if let Some(label) = self.stamps.last().map(|e| e.label.clone()) {
                    self.resolve_menu_item_click(&label, MenuKind::Stamps);
                }
                self.set_toolbar(Toolbar::Stamps, false);
            }
            InteractionMode::Drawing => self.set_toolbar(Toolbar::Drawing, false),
            InteractionMode::Full => self.set_toolbar(Toolbar::Selection, false),
        }

        self.load_value();
        self.apply_background();
    }

    /// Remove the engine. The controller keeps its state and goes back to
    /// recording only.
    pub fn detach(&mut self) -> Option<C> {
        self.canvas.take()
    }

    pub fn is_attached(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut C> {
        self.canvas.as_mut()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // ─── Canvas value & background ───────────────────────────────────────

    pub fn set_canvas_value(&mut self, json: &str) {
        self.value = json.to_string();
        self.load_value();
    }

    /// The live serialized scene, or the stored value when detached.
    pub fn canvas_value(&self) -> String {
        match &self.canvas {
            Some(canvas) => canvas.to_json().unwrap_or_else(|e| {
                log::error!("failed to serialize canvas: {e}");
                self.value.clone()
            }),
            None => self.value.clone(),
        }
    }

    /// Image snapshot: from the engine when attached, else the last capture.
    pub fn canvas_png(&self) -> Option<String> {
        match &self.canvas {
            Some(canvas) => match canvas.to_data_url() {
                Ok(url) => Some(url),
                Err(e) => {
                    log::error!("failed to capture canvas image: {e}");
                    self.last_image.clone()
                }
            },
            None => self.last_image.clone(),
        }
    }

    pub fn set_background_image(&mut self, url: &str) {
        self.background_image = Some(url.to_string());
        self.apply_background();
    }

    pub fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    fn load_value(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.loading = true;
        if let Err(e) = canvas.load_json(&self.value) {
            log::error!("failed to load canvas value: {e}");
        }
        for id in canvas.object_ids() {
            canvas.set_selectable(id, false);
        }
        canvas.request_render();
        self.drain_while_loading();
        self.loading = false;
    }

    fn apply_background(&mut self) {
        let Some(url) = self.background_image.clone().filter(|u| !u.is_empty()) else {
            return;
        };
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.loading = true;
        if let Err(e) = canvas.set_background_image(&url) {
            log::error!("failed to set background image: {e}");
        }
        self.drain_while_loading();
        self.loading = false;
    }

    /// Handle whatever the engine raised during a load while the guard is
    /// still up, so none of it autosaves.
    fn drain_while_loading(&mut self) {
        let events = match self.canvas.as_mut() {
            Some(canvas) => canvas.take_events(),
            None => return,
        };
        for event in events {
            if event.is_mutation() {
                self.handle_event(event);
            }
        }
    }

    // ─── Mode & toolbar ──────────────────────────────────────────────────

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode, reset_menu_items: bool) {
        log::debug!("interaction mode → {}", mode.name());
        self.mode = mode;
        self.set_toolbar(mode.default_toolbar(), reset_menu_items);
    }

    pub fn set_interaction_mode_named(&mut self, name: &str, reset_menu_items: bool) {
        self.set_interaction_mode(InteractionMode::from_name(name), reset_menu_items);
    }

    pub fn is_full_mode(&self) -> bool {
        self.mode == InteractionMode::Full
    }

    pub fn is_stamping_mode(&self) -> bool {
        self.mode == InteractionMode::Stamping
    }

    pub fn is_drawing_mode(&self) -> bool {
        self.mode == InteractionMode::Drawing
    }

    pub fn toolbar_hidden(&self) -> bool {
        !self.is_full_mode()
    }

    /// The active toolbar; `None` before the first transition.
    pub fn toolbar(&self) -> Option<Toolbar> {
        self.flags.current()
    }

    pub fn flags(&self) -> ToolbarFlags {
        self.flags
    }

    pub fn set_toolbar(&mut self, toolbar: Toolbar, reset_menu_items: bool) {
        if reset_menu_items {
            self.shapes.clear_checked();
            self.stamps.clear_checked();
        }
        self.flags.set_only(toolbar);
        log::debug!("toolbar → {toolbar:?}");

        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let selectable = toolbar == Toolbar::Selection;
        for id in canvas.object_ids() {
            canvas.set_selectable(id, selectable);
        }
        canvas.discard_active_object();
        canvas.request_render();

        let drawing = toolbar == Toolbar::Drawing;
        canvas.set_free_drawing(drawing);
        if drawing {
            canvas.set_brush(self.style.stroke, self.style.stroke_width);
        }
    }

    fn reapply_toolbar(&mut self) {
        if let Some(toolbar) = self.flags.current() {
            self.set_toolbar(toolbar, false);
        }
    }

    pub fn select_selection_tool(&mut self) {
        self.set_toolbar(Toolbar::Selection, true);
    }

    pub fn select_drawing_tool(&mut self) {
        self.set_toolbar(Toolbar::Drawing, true);
    }

    pub fn select_text_tool(&mut self) {
        self.set_toolbar(Toolbar::Text, true);
    }

    // ─── Menus ───────────────────────────────────────────────────────────

    pub fn shapes(&self) -> &[MenuEntry] {
        self.shapes.entries()
    }

    pub fn stamps(&self) -> &[MenuEntry] {
        self.stamps.entries()
    }

    pub fn has_stamps(&self) -> bool {
        !self.stamps.is_empty()
    }

    pub fn menu_item(&self) -> Option<&MenuItem> {
        self.menu_item.as_ref()
    }

    /// Check the clicked entry of `menu`, remember its item and switch to
    /// the toolbar it belongs to.
    pub fn resolve_menu_item_click(&mut self, label: &str, menu: MenuKind) {
        let entries = match menu {
            MenuKind::Shapes => &mut self.shapes,
            MenuKind::Stamps => &mut self.stamps,
        };
        if let Some(item) = entries.resolve_click(label) {
            let toolbar = item.toolbar();
            self.menu_item = Some(item);
            self.set_toolbar(toolbar, false);
        }
    }

    pub fn click_shape(&mut self, label: &str) {
        self.resolve_menu_item_click(label, MenuKind::Shapes);
    }

    pub fn click_stamp(&mut self, label: &str) {
        self.resolve_menu_item_click(label, MenuKind::Stamps);
    }

    /// Append a stamp. In Stamping mode the new stamp becomes the selection.
    pub fn add_stamp_option(&mut self, label: &str, svg: &str) {
        self.stamps.push(MenuEntry::stamp(label, svg));
        if self.is_stamping_mode() {
            self.resolve_menu_item_click(label, MenuKind::Stamps);
        }
    }

    /// Add every usable record. Returns how many stamps were added.
    pub fn load_stamp_catalog(&mut self, records: &[StampRecord]) -> usize {
        let mut added = 0;
        for record in records {
            if record.label.trim().is_empty() {
                log::warn!("skipping stamp record without a label");
                continue;
            }
            let Some(svg) = record.svg() else {
                log::warn!("skipping stamp {:?}: no SVG source", record.label);
                continue;
            };
            self.add_stamp_option(&record.label, svg);
            added += 1;
        }
        if added > 0 && self.is_stamping_mode() {
            self.set_interaction_mode(InteractionMode::Stamping, false);
        }
        added
    }

    // ─── Style controls ──────────────────────────────────────────────────

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    pub fn set_fill_color(&mut self, hex: &str) {
        match Color::from_hex(hex) {
            Some(color) => self.style.fill = color,
            None => log::warn!("ignoring invalid fill color {hex:?}"),
        }
        self.reapply_toolbar();
    }

    pub fn set_line_color(&mut self, hex: &str) {
        match Color::from_hex(hex) {
            Some(color) => self.style.stroke = color,
            None => log::warn!("ignoring invalid line color {hex:?}"),
        }
        self.reapply_toolbar();
    }

    pub fn set_line_width(&mut self, input: &str) {
        if let Some(width) = leading_integer(input) {
            self.style.stroke_width = width;
        }
        self.reapply_toolbar();
    }

    pub fn set_font_size(&mut self, input: &str) {
        if let Some(size) = leading_integer(input) {
            self.style.font.font_size = size;
        }
        self.reapply_toolbar();
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.style.font.font_family = family.to_string();
        self.reapply_toolbar();
    }

    // ─── Pointer input & generation ──────────────────────────────────────

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn on_pointer_down(&mut self, point: Point) {
        self.gesture.press(point);
    }

    /// Finish the gesture and generate on the Text, Shapes and Stamps
    /// toolbars. A stamp comes back pending: drive its future, then hand the
    /// result to [`CanvasController::finish_stamp`].
    pub fn on_pointer_up(&mut self, point: Point) -> Option<PendingStamp> {
        self.gesture.release(point);
        let toolbar = self.flags.current()?;
        if !toolbar.generates_objects() {
            return None;
        }

        let request = GenerationRequest {
            toolbar,
            menu_item: self.menu_item.clone(),
            gesture: self.gesture,
            style: self.style.clone(),
        };
        match generate(&request, &self.stamps) {
            Generated::Nothing => None,
            Generated::Object { object, select } => {
                self.insert_generated(object, select);
                None
            }
            Generated::Stamp(placement) => {
                let canvas = self.canvas.as_ref()?;
                Some(PendingStamp {
                    parts: canvas.load_svg(&placement.svg),
                    key: placement.key,
                    center: placement.center,
                })
            }
        }
    }

    fn insert_generated(&mut self, object: DrawableObject, select: bool) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        log::trace!("generated {:?} ({})", object.id, object.kind.name());
        let id = object.id;
        canvas.add(object);
        canvas.request_render();
        if select {
            self.set_toolbar(Toolbar::Selection, true);
            if let Some(canvas) = self.canvas.as_mut() {
                canvas.set_active_object(id);
                canvas.request_render();
            }
        }
        self.autosave();
    }

    /// Insert a parsed stamp, one part at a time. Returns the number of parts.
    pub fn finish_stamp(&mut self, stamp: ReadyStamp) -> usize {
        let parts = match stamp.parts {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("failed to load stamp {:?}: {e}", stamp.key);
                return 0;
            }
        };
        let count = parts.len();
        for part in parts {
            self.insert_generated(place_stamp_part(part, stamp.center), false);
        }
        count
    }

    // ─── Engine events ───────────────────────────────────────────────────

    /// Drain and handle queued engine events. Returns stamps started by
    /// pointer releases among them.
    pub fn process_events(&mut self) -> Vec<PendingStamp> {
        let events = match self.canvas.as_mut() {
            Some(canvas) => canvas.take_events(),
            None => return Vec::new(),
        };
        events
            .into_iter()
            .filter_map(|event| self.handle_event(event))
            .collect()
    }

    fn handle_event(&mut self, event: CanvasEvent) -> Option<PendingStamp> {
        match event {
            CanvasEvent::PointerDown(point) => {
                self.on_pointer_down(point);
                None
            }
            CanvasEvent::PointerUp(point) => self.on_pointer_up(point),
            CanvasEvent::PathCreated(id) => {
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.set_selectable(id, false);
                }
                self.autosave();
                None
            }
            CanvasEvent::ObjectChanged { id, change } => {
                log::trace!("object {id:?} {change:?}");
                self.autosave();
                None
            }
        }
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    fn autosave(&mut self) {
        if self.save.should_autosave(self.loading) {
            let value = self.canvas_value();
            self.save.autosave(value);
        }
    }

    /// Remove the active selection from the scene.
    pub fn delete_selected(&mut self) -> usize {
        let Some(canvas) = self.canvas.as_mut() else {
            return 0;
        };
        let removed = canvas
            .active_objects()
            .into_iter()
            .filter(|id| canvas.remove(*id))
            .count();
        if removed > 0 {
            canvas.discard_active_object();
            canvas.request_render();
            self.autosave();
        }
        removed
    }

    /// Emit the serialized scene now; schedule an image capture if enabled.
    pub fn request_save(&mut self, now_ms: f64) {
        let value = self.canvas_value();
        self.save.manual_save(value, now_ms);
    }

    /// Fire image captures that have come due.
    pub fn tick(&mut self, now_ms: f64) {
        for _ in 0..self.save.take_due_images(now_ms) {
            let Some(canvas) = self.canvas.as_ref() else {
                log::warn!("image capture skipped: no canvas attached");
                continue;
            };
            match canvas.to_data_url() {
                Ok(data_url) => {
                    self.last_image = Some(data_url.clone());
                    self.save.push(HostSignal::ImageCaptured { data_url });
                }
                Err(e) => log::error!("image capture failed: {e}"),
            }
        }
    }

    /// Earliest pending image capture, for hosts that arm a timer.
    pub fn next_deadline(&self) -> Option<f64> {
        self.save.next_deadline()
    }

    pub fn drain_signals(&mut self) -> Vec<HostSignal> {
        self.save.drain()
    }

    // ─── Sizing ──────────────────────────────────────────────────────────

    /// Fit the canvas to its container, never exceeding the configured size.
    pub fn resize_to_container(&mut self, width: f64, height: f64) {
        let (w, h) = (
            width.min(self.config.canvas_width),
            height.min(self.config.canvas_height),
        );
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_dimensions(w, h);
            canvas.request_render();
        }
    }
}

/// Integer prefix of a form input (`"12px"` → 12), like the browser's
/// `parseInt`. `None` when there is no leading integer.
fn leading_integer(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<f64>().ok().map(|v| sign * v)
}
