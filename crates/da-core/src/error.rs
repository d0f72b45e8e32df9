use thiserror::Error;

/// Failures reported by a scene engine or by scene/SVG decoding.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The rendering engine failed to load or is not present on the page.
    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("invalid scene JSON: {0}")]
    InvalidScene(#[from] serde_json::Error),

    #[error("SVG parse error: {0}")]
    SvgParse(String),

    /// A call into the engine threw or returned something unusable.
    #[error("engine call failed: {0}")]
    Engine(String),
}
