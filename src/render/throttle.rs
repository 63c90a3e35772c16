//! Coalescing renderer.
//!
//! While fragments stream in, every update stores the latest Markdown in a
//! single pending slot. The first update of a quiet period arms a timer;
//! when it fires, only the latest pending text is rendered. A flush renders
//! immediately and disarms the timer.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::html::render_html;
use crate::traits::Surface;

/// Default throttle window.
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 80;

#[derive(Default)]
struct ThrottleState {
    /// Latest text waiting for the timer (last-write-wins)
    pending: Option<String>,
    /// Armed timer task, if any
    timer: Option<JoinHandle<()>>,
    /// Bumped on flush/cancel; a timer only paints if its generation is current
    generation: u64,
    /// Paints performed so far
    renders: u64,
}

/// Throttled Markdown renderer over a [`Surface`].
///
/// Cloning shares the pending slot and timer.
#[derive(Clone)]
pub struct ThrottledRenderer {
    surface: Arc<dyn Surface>,
    interval: Duration,
    state: Arc<StdMutex<ThrottleState>>,
}

impl ThrottledRenderer {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            interval: Duration::from_millis(DEFAULT_RENDER_INTERVAL_MS),
            state: Arc::new(StdMutex::new(ThrottleState::default())),
        }
    }

    /// Set a custom throttle window.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Request a render of `markdown` within the throttle window.
    ///
    /// Without a tokio runtime there is no timer to arm, so this renders
    /// immediately.
    pub fn schedule(&self, markdown: impl Into<String>) {
        let markdown = markdown.into();

        if tokio::runtime::Handle::try_current().is_err() {
            self.flush(&markdown);
            return;
        }

        let mut state = self.state.lock().unwrap();
        state.pending = Some(markdown);
        if state.timer.is_some() {
            return;
        }

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let surface = Arc::clone(&self.surface);
        let interval = self.interval;

        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;

            let mut state = shared.lock().unwrap();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            if let Some(text) = state.pending.take() {
                surface.paint(&render_html(&text));
                state.renders += 1;
            }
        }));
    }

    /// Render `markdown` now, exactly once, discarding any pending update.
    pub fn flush(&self, markdown: &str) {
        let mut state = self.state.lock().unwrap();
        Self::disarm(&mut state);
        self.surface.paint(&render_html(markdown));
        state.renders += 1;
    }

    /// Drop any pending update without rendering.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        Self::disarm(&mut state);
    }

    fn disarm(state: &mut ThrottleState) {
        state.generation = state.generation.wrapping_add(1);
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Whether a timer is armed.
    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().timer.is_some()
    }

    /// Number of paints performed.
    pub fn render_count(&self) -> u64 {
        self.state.lock().unwrap().renders
    }
}

impl std::fmt::Debug for ThrottledRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledRenderer")
            .field("interval", &self.interval)
            .field("renders", &self.render_count())
            .finish_non_exhaustive()
    }
}
