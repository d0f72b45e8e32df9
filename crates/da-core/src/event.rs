//! Events raised by the scene engine.
//!
//! Engines queue these as they happen (pointer presses, native free-draw
//! strokes, transforms applied by the user through selection handles); the
//! controller drains the queue after each operation.

use crate::id::ObjectId;
use kurbo::Point;

/// How an existing object was changed by a native interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectChange {
    Moved,
    Scaled,
    Rotated,
    Skewed,
    Modified,
}

impl ObjectChange {
    /// Engine event names that map to an object change.
    pub const EVENT_NAMES: [&'static str; 5] = [
        "object:moved",
        "object:scaled",
        "object:rotated",
        "object:skewed",
        "object:modified",
    ];

    /// Map an engine event name (`object:moved`, ...) to a change kind.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "object:moved" => Some(Self::Moved),
            "object:scaled" => Some(Self::Scaled),
            "object:rotated" => Some(Self::Rotated),
            "object:skewed" => Some(Self::Skewed),
            "object:modified" => Some(Self::Modified),
            _ => None,
        }
    }
}

/// A native event from the canvas, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    PointerDown(Point),
    PointerUp(Point),
    /// A free-draw stroke was committed as a new path object.
    PathCreated(ObjectId),
    /// An existing object was transformed. `id` is absent when the engine
    /// reports a change without a resolvable target.
    ObjectChanged {
        id: Option<ObjectId>,
        change: ObjectChange,
    },
}

impl CanvasEvent {
    /// Whether this event changes the scene and should count toward autosave.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            CanvasEvent::PathCreated(_) | CanvasEvent::ObjectChanged { .. }
        )
    }
}
