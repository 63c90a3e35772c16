//! Image preview handles.

use std::sync::Arc;

use crate::api::ImageFile;
use crate::traits::{PreviewHandle, PreviewHost};

/// At most this many previews are shown for a selection.
pub const MAX_PREVIEWS: usize = 5;

/// Live preview handles for the current file selection.
///
/// Every handle is released before a new set is created, on clear, and on
/// drop.
pub struct ImagePreviews {
    host: Arc<dyn PreviewHost>,
    handles: Vec<PreviewHandle>,
}

impl ImagePreviews {
    pub fn new(host: Arc<dyn PreviewHost>) -> Self {
        Self {
            host,
            handles: Vec::new(),
        }
    }

    /// Replace the previews with ones for the first [`MAX_PREVIEWS`] files.
    pub fn refresh(&mut self, files: &[ImageFile]) {
        self.clear();
        self.handles = files
            .iter()
            .take(MAX_PREVIEWS)
            .map(|file| self.host.create(file))
            .collect();
        tracing::debug!("Created {} image previews", self.handles.len());
    }

    /// Release every live handle.
    pub fn clear(&mut self) {
        for handle in self.handles.drain(..) {
            self.host.release(handle);
        }
    }

    pub fn handles(&self) -> &[PreviewHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for ImagePreviews {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ImagePreviews {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePreviews")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}
