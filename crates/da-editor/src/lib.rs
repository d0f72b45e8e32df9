//! Interaction controller for the annotation canvas.
//!
//! Everything here is engine-agnostic: the controller drives any
//! [`da_core::SceneCanvas`], which keeps it testable against the in-memory
//! [`da_core::Scene`].

pub mod catalog;
pub mod config;
pub mod controller;
pub mod generate;
pub mod gesture;
pub mod menu;
pub mod mode;
pub mod save;

pub use catalog::{StampRecord, parse_stamp_records};
pub use config::WidgetConfig;
pub use controller::CanvasController;
pub use generate::{PendingStamp, ReadyStamp};
pub use menu::{MenuItem, MenuKind, ShapeKind};
pub use mode::{InteractionMode, Toolbar};
pub use save::{HostSignal, IMAGE_SETTLE_DELAY_MS};
