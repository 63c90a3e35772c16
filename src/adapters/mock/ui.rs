//! Recording UI doubles.
//!
//! [`RecordingControls`] keeps the current control state plus an ordered
//! event log. [`RecordingPreviewHost`] hands out numbered handles and tracks
//! which are still live.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::api::ImageFile;
use crate::traits::{Controls, PreviewHandle, PreviewHost};

/// One call made on [`Controls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    InputsEnabled(bool),
    SpinnerVisible(bool),
    Status(String),
    Alert(String),
}

#[derive(Debug)]
struct ControlState {
    inputs_enabled: bool,
    spinner_visible: bool,
    status: String,
    events: Vec<ControlEvent>,
}

/// [`Controls`] that records every call.
#[derive(Debug)]
pub struct RecordingControls {
    state: Mutex<ControlState>,
}

impl RecordingControls {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControlState {
                inputs_enabled: true,
                spinner_visible: false,
                status: String::new(),
                events: Vec::new(),
            }),
        }
    }

    pub fn inputs_enabled(&self) -> bool {
        self.state.lock().unwrap().inputs_enabled
    }

    pub fn spinner_visible(&self) -> bool {
        self.state.lock().unwrap().spinner_visible
    }

    /// Current status line text.
    pub fn status(&self) -> String {
        self.state.lock().unwrap().status.clone()
    }

    pub fn events(&self) -> Vec<ControlEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Every status text set so far, in order.
    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ControlEvent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ControlEvent::Alert(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ControlEvent) {
        let mut state = self.state.lock().unwrap();
        match &event {
            ControlEvent::InputsEnabled(enabled) => state.inputs_enabled = *enabled,
            ControlEvent::SpinnerVisible(visible) => state.spinner_visible = *visible,
            ControlEvent::Status(text) => state.status = text.clone(),
            ControlEvent::Alert(_) => {}
        }
        state.events.push(event);
    }
}

impl Default for RecordingControls {
    fn default() -> Self {
        Self::new()
    }
}

impl Controls for RecordingControls {
    fn set_inputs_enabled(&self, enabled: bool) {
        self.record(ControlEvent::InputsEnabled(enabled));
    }

    fn set_spinner_visible(&self, visible: bool) {
        self.record(ControlEvent::SpinnerVisible(visible));
    }

    fn set_status(&self, text: &str) {
        self.record(ControlEvent::Status(text.to_string()));
    }

    fn alert(&self, message: &str) {
        self.record(ControlEvent::Alert(message.to_string()));
    }
}

/// [`PreviewHost`] that tracks live handles.
#[derive(Debug, Default)]
pub struct RecordingPreviewHost {
    next_id: AtomicU64,
    live: Mutex<BTreeSet<u64>>,
    released: Mutex<Vec<u64>>,
}

impl RecordingPreviewHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn created_count(&self) -> usize {
        self.next_id.load(Ordering::SeqCst) as usize
    }

    /// Released handle ids, in release order.
    pub fn released_ids(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }
}

impl PreviewHost for RecordingPreviewHost {
    fn create(&self, file: &ImageFile) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live.lock().unwrap().insert(id);
        PreviewHandle {
            id,
            url: format!("preview://{}/{}", id, file.name),
        }
    }

    fn release(&self, handle: PreviewHandle) {
        if self.live.lock().unwrap().remove(&handle.id) {
            self.released.lock().unwrap().push(handle.id);
        } else {
            tracing::warn!("Preview {} released twice", handle.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_track_state_and_log() {
        let controls = RecordingControls::new();
        assert!(controls.inputs_enabled());

        controls.set_inputs_enabled(false);
        controls.set_spinner_visible(true);
        controls.set_status("Working");
        controls.alert("Please choose an image first.");

        assert!(!controls.inputs_enabled());
        assert!(controls.spinner_visible());
        assert_eq!(controls.status(), "Working");
        assert_eq!(controls.statuses(), vec!["Working"]);
        assert_eq!(controls.alerts(), vec!["Please choose an image first."]);
        assert_eq!(controls.events().len(), 4);
    }

    #[test]
    fn test_preview_host_handles() {
        let host = RecordingPreviewHost::new();
        let file = ImageFile::new("cat.png", vec![0u8]);

        let a = host.create(&file);
        let b = host.create(&file);
        assert_ne!(a.id, b.id);
        assert!(a.url.ends_with("cat.png"));
        assert_eq!(host.live_count(), 2);

        host.release(a.clone());
        host.release(a);
        assert_eq!(host.live_count(), 1);
        assert_eq!(host.released_ids(), vec![0]);
    }
}
