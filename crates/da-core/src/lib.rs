pub mod emitter;
pub mod error;
pub mod event;
pub mod hit;
pub mod id;
pub mod model;
pub mod parser;
pub mod scene;

pub use error::CanvasError;
pub use event::{CanvasEvent, ObjectChange};
pub use id::ObjectId;
pub use model::*;
pub use parser::{SvgShape, parse_svg};
pub use scene::{Scene, SceneCanvas, SvgParts};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Vec2};
