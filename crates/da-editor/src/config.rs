//! Widget configuration as set by the host page.

use da_core::model::StyleOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    /// Maximum canvas size; responsive resizing never exceeds it.
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub allow_canvas_resize: bool,
    pub fire_auto_save: bool,
    /// Capture an image snapshot after each manual save.
    pub capture_image: bool,
    pub interaction_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub style: StyleOptions,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1000.0,
            canvas_height: 400.0,
            allow_canvas_resize: false,
            fire_auto_save: false,
            capture_image: false,
            interaction_mode: "full".into(),
            background_image: None,
            style: StyleOptions::default(),
        }
    }
}

impl WidgetConfig {
    /// Parse host JSON. Invalid input falls back to defaults.
    pub fn from_json(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("invalid widget config, using defaults: {e}");
            Self::default()
        })
    }
}
