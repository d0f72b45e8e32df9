//! Window-driven canvas sizing.
//!
//! While subscribed, every window `load` and `resize` measures the container
//! and hands its size to the callback. Dropping the subscription removes
//! both listeners.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, Window};

const EVENTS: [&str; 2] = ["resize", "load"];

pub struct ResizeSubscription {
    window: Window,
    handler: Closure<dyn FnMut()>,
}

impl ResizeSubscription {
    pub fn new(
        window: Window,
        container: HtmlElement,
        mut on_resize: impl FnMut(f64, f64) + 'static,
    ) -> Result<Self, JsValue> {
        let handler = Closure::<dyn FnMut()>::new(move || {
            let (width, height) = container_size(&container);
            on_resize(width, height);
        });
        let subscription = Self { window, handler };
        let callback = subscription.handler.as_ref().unchecked_ref();
        subscribe_all(
            &EVENTS,
            |event| {
                subscription
                    .window
                    .add_event_listener_with_callback(event, callback)
            },
            |event| subscription.remove(event),
        )?;
        Ok(subscription)
    }

    fn remove(&self, event: &str) {
        let _ = self
            .window
            .remove_event_listener_with_callback(event, self.handler.as_ref().unchecked_ref());
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        for event in EVENTS {
            self.remove(event);
        }
    }
}

/// Register every event, or none: on the first failure the ones already
/// registered are removed again before the error is returned.
fn subscribe_all<E>(
    events: &[&'static str],
    mut add: impl FnMut(&'static str) -> Result<(), E>,
    mut remove: impl FnMut(&'static str),
) -> Result<(), E> {
    for (i, event) in events.iter().enumerate() {
        if let Err(e) = add(*event) {
            events[..i].iter().for_each(|done| remove(*done));
            return Err(e);
        }
    }
    Ok(())
}

pub fn container_size(container: &HtmlElement) -> (f64, f64) {
    (
        f64::from(container.offset_width()),
        f64::from(container.offset_height()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn failed_registration_removes_earlier_listeners() {
        let registered = RefCell::new(Vec::new());
        let result = subscribe_all(
            &EVENTS,
            |event| match event {
                "load" => Err("blocked"),
                _ => {
                    registered.borrow_mut().push(event);
                    Ok(())
                }
            },
            |event| registered.borrow_mut().retain(|e| *e != event),
        );
        assert_eq!(result, Err("blocked"));
        assert!(registered.borrow().is_empty());
    }

    #[test]
    fn all_listeners_registered_in_order() {
        let mut registered = Vec::new();
        let result: Result<(), ()> = subscribe_all(
            &EVENTS,
            |event| {
                registered.push(event);
                Ok(())
            },
            |_| unreachable!(),
        );
        assert_eq!(result, Ok(()));
        assert_eq!(registered, vec!["resize", "load"]);
    }
}
