//! UI boundary traits.
//!
//! The orchestration core never touches a concrete UI. It talks to these
//! traits instead: [`Controls`] for inputs, spinner and status line,
//! [`Surface`] for the answer area, [`PreviewHost`] for image previews.

use crate::api::ImageFile;

/// Input widgets, spinner and status line.
pub trait Controls: Send + Sync {
    /// Enable or disable every action-triggering input.
    fn set_inputs_enabled(&self, enabled: bool);

    /// Show or hide the loading spinner.
    fn set_spinner_visible(&self, visible: bool);

    /// Replace the status line text. An empty string clears it.
    fn set_status(&self, text: &str);

    /// Tell the user something that needs their attention.
    fn alert(&self, message: &str);
}

/// The answer area. Each paint replaces the previous content.
pub trait Surface: Send + Sync {
    fn paint(&self, html: &str);
}

/// Opaque handle to a live image preview (an object URL in a browser).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    pub id: u64,
    pub url: String,
}

/// Owner of preview resources. Every created handle must be released.
pub trait PreviewHost: Send + Sync {
    fn create(&self, file: &ImageFile) -> PreviewHandle;

    fn release(&self, handle: PreviewHandle);
}
