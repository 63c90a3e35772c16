//! Surface implementations.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::traits::Surface;

/// Keeps every painted HTML string in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    paints: Mutex<Vec<String>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently painted HTML.
    pub fn latest(&self) -> Option<String> {
        self.paints.lock().unwrap().last().cloned()
    }

    pub fn paint_count(&self) -> usize {
        self.paints.lock().unwrap().len()
    }

    pub fn history(&self) -> Vec<String> {
        self.paints.lock().unwrap().clone()
    }
}

impl Surface for MemorySurface {
    fn paint(&self, html: &str) {
        self.paints.lock().unwrap().push(html.to_string());
    }
}

/// Rewrites a file on every paint and remembers the latest HTML.
///
/// Write failures are logged; painting never fails.
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    latest: Mutex<Option<String>>,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latest: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn latest(&self) -> Option<String> {
        self.latest.lock().unwrap().clone()
    }
}

impl Surface for FileSurface {
    fn paint(&self, html: &str) {
        if let Err(e) = std::fs::write(&self.path, html) {
            tracing::warn!("Failed to write {}: {}", self.path.display(), e);
        }
        *self.latest.lock().unwrap() = Some(html.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_surface_records_paints() {
        let surface = MemorySurface::new();
        assert_eq!(surface.latest(), None);

        surface.paint("<p>a</p>");
        surface.paint("<p>ab</p>");

        assert_eq!(surface.paint_count(), 2);
        assert_eq!(surface.latest().as_deref(), Some("<p>ab</p>"));
        assert_eq!(surface.history(), vec!["<p>a</p>", "<p>ab</p>"]);
    }

    #[test]
    fn test_file_surface_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answer.html");
        let surface = FileSurface::new(&path);

        surface.paint("<p>first</p>");
        surface.paint("<p>second</p>");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>second</p>");
        assert_eq!(surface.latest().as_deref(), Some("<p>second</p>"));
        assert_eq!(surface.path(), path.as_path());
    }

    #[test]
    fn test_file_surface_write_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let surface = FileSurface::new(dir.path().join("missing").join("answer.html"));
        surface.paint("<p>x</p>");
        assert_eq!(surface.latest().as_deref(), Some("<p>x</p>"));
    }
}
