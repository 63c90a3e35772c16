//! Terminal-side UI adapters for the CLI.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::api::ImageFile;
use crate::traits::{Controls, PreviewHandle, PreviewHost};

#[derive(Debug, Default)]
struct LineState {
    spinner: bool,
    status: String,
    /// Width of the last line drawn, for clearing
    drawn: usize,
}

/// Status line on stderr.
///
/// On a terminal the line is redrawn in place. Otherwise each status change
/// is printed on its own line.
#[derive(Debug)]
pub struct TerminalControls {
    interactive: bool,
    line: Mutex<LineState>,
}

impl TerminalControls {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stderr().is_terminal(),
            line: Mutex::new(LineState::default()),
        }
    }

    fn compose(state: &LineState) -> String {
        match (state.spinner, state.status.is_empty()) {
            (true, true) => "…".to_string(),
            (true, false) => format!("… {}", state.status),
            (false, _) => state.status.clone(),
        }
    }

    fn redraw(&self, state: &mut LineState) {
        let text = Self::compose(state);
        let mut err = std::io::stderr().lock();
        if self.interactive {
            let pad = state.drawn.saturating_sub(text.chars().count());
            let _ = write!(err, "\r{}{}\r{}", text, " ".repeat(pad), text);
            let _ = err.flush();
            state.drawn = text.chars().count();
        } else if !text.is_empty() {
            let _ = writeln!(err, "{}", text);
        }
    }
}

impl Default for TerminalControls {
    fn default() -> Self {
        Self::new()
    }
}

impl Controls for TerminalControls {
    fn set_inputs_enabled(&self, enabled: bool) {
        tracing::debug!("Inputs {}", if enabled { "enabled" } else { "disabled" });
    }

    fn set_spinner_visible(&self, visible: bool) {
        let mut state = self.line.lock().unwrap();
        if state.spinner != visible {
            state.spinner = visible;
            self.redraw(&mut state);
        }
    }

    fn set_status(&self, text: &str) {
        let mut state = self.line.lock().unwrap();
        if state.status != text {
            state.status = text.to_string();
            self.redraw(&mut state);
        }
    }

    fn alert(&self, message: &str) {
        let mut state = self.line.lock().unwrap();
        let mut err = std::io::stderr().lock();
        if self.interactive && state.drawn > 0 {
            let _ = write!(err, "\r{}\r", " ".repeat(state.drawn));
            state.drawn = 0;
        }
        let _ = writeln!(err, "! {}", message);
    }
}

/// Preview host for environments that cannot show images.
///
/// Handles are numbered and logged; nothing is displayed.
#[derive(Debug, Default)]
pub struct LoggingPreviewHost {
    next_id: AtomicU64,
}

impl LoggingPreviewHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewHost for LoggingPreviewHost {
    fn create(&self, file: &ImageFile) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Preview {} for {} ({} bytes)", id, file.name, file.len());
        PreviewHandle {
            id,
            url: format!("preview://{}/{}", id, file.name),
        }
    }

    fn release(&self, handle: PreviewHandle) {
        tracing::debug!("Released preview {}", handle.id);
    }
}
