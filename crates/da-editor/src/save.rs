//! Save policy: manual saves, autosave gating and the delayed image capture.
//!
//! Outgoing notifications are queued as [`HostSignal`]s and drained by the
//! host. Time is passed in by the caller (`now_ms`); nothing here reads a
//! clock.

use serde::Serialize;
use smallvec::SmallVec;

/// Delay between a manual save and the image capture, letting the engine
/// finish rendering first.
pub const IMAGE_SETTLE_DELAY_MS: f64 = 500.0;

/// Notification for the host page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostSignal {
    SaveRequested { value: String },
    AutoSave { value: String },
    ImageCaptured { data_url: String },
}

impl HostSignal {
    /// DOM event name the widget dispatches for this signal.
    pub fn event_name(&self) -> &'static str {
        match self {
            HostSignal::SaveRequested { .. } => "savecanvas",
            HostSignal::AutoSave { .. } => "autosavecanvas",
            HostSignal::ImageCaptured { .. } => "imagecaptured",
        }
    }

    /// The signal's payload: serialized scene or image data URL.
    pub fn payload(&self) -> &str {
        match self {
            HostSignal::SaveRequested { value } | HostSignal::AutoSave { value } => value,
            HostSignal::ImageCaptured { data_url } => data_url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SavePolicy {
    pub fire_auto_save: bool,
    pub capture_image: bool,
    /// Deadlines (ms) of scheduled image captures, one per manual save.
    pending_images: SmallVec<[f64; 2]>,
    signals: Vec<HostSignal>,
}

impl SavePolicy {
    pub fn new(fire_auto_save: bool, capture_image: bool) -> Self {
        Self {
            fire_auto_save,
            capture_image,
            ..Self::default()
        }
    }

    /// Queue a manual save and, if enabled, schedule an image capture.
    pub fn manual_save(&mut self, value: String, now_ms: f64) {
        self.signals.push(HostSignal::SaveRequested { value });
        if self.capture_image {
            self.pending_images.push(now_ms + IMAGE_SETTLE_DELAY_MS);
        }
    }

    /// Whether a mutation should autosave right now.
    pub fn should_autosave(&self, loading: bool) -> bool {
        self.fire_auto_save && !loading
    }

    pub fn autosave(&mut self, value: String) {
        self.signals.push(HostSignal::AutoSave { value });
    }

    /// Number of image captures that have come due by `now_ms`. Due
    /// captures are removed from the schedule.
    pub fn take_due_images(&mut self, now_ms: f64) -> usize {
        let before = self.pending_images.len();
        self.pending_images.retain(|at| *at > now_ms);
        before - self.pending_images.len()
    }

    /// Earliest scheduled capture, for hosts that arm a timer.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending_images.iter().copied().reduce(f64::min)
    }

    pub fn push(&mut self, signal: HostSignal) {
        self.signals.push(signal);
    }

    pub fn drain(&mut self) -> Vec<HostSignal> {
        std::mem::take(&mut self.signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_save_schedules_capture_only_when_enabled() {
        let mut off = SavePolicy::new(false, false);
        off.manual_save("{}".into(), 0.0);
        assert_eq!(off.next_deadline(), None);
        assert_eq!(off.drain().len(), 1);

        let mut on = SavePolicy::new(false, true);
        on.manual_save("{}".into(), 1000.0);
        assert_eq!(on.next_deadline(), Some(1500.0));
        assert_eq!(on.take_due_images(1499.0), 0);
        assert_eq!(on.take_due_images(1500.0), 1);
        assert_eq!(on.next_deadline(), None);
    }

    #[test]
    fn autosave_is_gated_by_flag_and_loading() {
        assert!(!SavePolicy::new(false, false).should_autosave(false));
        assert!(SavePolicy::new(true, false).should_autosave(false));
        assert!(!SavePolicy::new(true, false).should_autosave(true));
    }

    #[test]
    fn signal_names_and_payloads() {
        let s = HostSignal::ImageCaptured {
            data_url: "data:x".into(),
        };
        assert_eq!(s.event_name(), "imagecaptured");
        assert_eq!(s.payload(), "data:x");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "imageCaptured");
        assert_eq!(json["data_url"], "data:x");
    }
}
