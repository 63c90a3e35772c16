//! The busy controller.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::previews::ImagePreviews;
use crate::api::ImageFile;
use crate::config::ClientConfig;
use crate::traits::{Controls, PreviewHost};

/// Status line text for a base label after `secs` elapsed seconds.
pub fn format_status(base: &str, secs: u64) -> String {
    if secs > 0 {
        format!("{} ({}s)", base, secs)
    } else {
        base.to_string()
    }
}

/// Busy axis of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
}

#[derive(Default)]
struct SpinnerState {
    active: bool,
    shown_at: Option<Instant>,
    hide_timer: Option<JoinHandle<()>>,
    /// Bumped whenever a pending hide is cancelled; a timer only hides if
    /// its generation is still current
    generation: u64,
}

impl SpinnerState {
    fn cancel_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.hide_timer.take() {
            timer.abort();
        }
    }
}

struct SessionState {
    phase: Phase,
    status_base: String,
    ticker_started: Option<Instant>,
    ticker: Option<JoinHandle<()>>,
    spinner: SpinnerState,
    prompt: String,
    files: Vec<ImageFile>,
    previews: ImagePreviews,
}

impl SessionState {
    fn clear_status_if_idle(&self, controls: &dyn Controls) {
        if self.phase == Phase::Idle && !self.spinner.active {
            controls.set_status("");
        }
    }

    fn elapsed_secs(&self) -> u64 {
        self.ticker_started
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }
}

/// UI session shared by every orchestrator.
///
/// Cloning shares the same state. Locks are held only for short synchronous
/// sections and never across an `.await`.
#[derive(Clone)]
pub struct Session {
    controls: Arc<dyn Controls>,
    state: Arc<StdMutex<SessionState>>,
    spinner_min_visible: Duration,
    ticker_interval: Duration,
}

impl Session {
    pub fn new(
        controls: Arc<dyn Controls>,
        previews: Arc<dyn PreviewHost>,
        config: &ClientConfig,
    ) -> Self {
        let state = SessionState {
            phase: Phase::Idle,
            status_base: String::new(),
            ticker_started: None,
            ticker: None,
            spinner: SpinnerState::default(),
            prompt: String::new(),
            files: Vec::new(),
            previews: ImagePreviews::new(previews),
        };
        Self {
            controls,
            state: Arc::new(StdMutex::new(state)),
            spinner_min_visible: config.spinner_min_visible,
            ticker_interval: config.ticker_interval,
        }
    }

    /// Enter the busy phase with a status label.
    ///
    /// Returns `None` without touching the UI when an action is already
    /// running.
    pub fn try_begin(&self, label: &str) -> Option<BusyGuard> {
        {
            let mut state = self.state.lock().unwrap();
            if state.phase == Phase::Busy {
                tracing::debug!("Ignoring '{}': another action is running", label);
                return None;
            }

            state.phase = Phase::Busy;
            state.status_base = label.to_string();
            state.ticker_started = Some(Instant::now());
            self.controls.set_inputs_enabled(false);
            self.controls.set_status(label);
            self.show_spinner_locked(&mut state);
            state.ticker = self.spawn_ticker();
        }

        tracing::debug!("Session busy: {}", label);
        Some(BusyGuard {
            session: self.clone(),
        })
    }

    fn end(&self) {
        let mut state = self.state.lock().unwrap();
        state.phase = Phase::Idle;
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        state.ticker_started = None;
        self.controls.set_inputs_enabled(true);
        self.hide_spinner_locked(&mut state);
        state.clear_status_if_idle(self.controls.as_ref());
        tracing::debug!("Session idle");
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().unwrap().phase == Phase::Busy
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap().phase
    }

    /// Change the status label while busy and repaint the status line.
    pub fn set_status_base(&self, label: &str) {
        let mut state = self.state.lock().unwrap();
        state.status_base = label.to_string();
        if state.phase == Phase::Busy {
            let text = format_status(label, state.elapsed_secs());
            self.controls.set_status(&text);
        }
    }

    pub fn status_base(&self) -> String {
        self.state.lock().unwrap().status_base.clone()
    }

    pub fn show_spinner(&self) {
        let mut state = self.state.lock().unwrap();
        self.show_spinner_locked(&mut state);
    }

    /// Hide the spinner, honouring the minimum visible time.
    pub fn hide_spinner(&self) {
        let mut state = self.state.lock().unwrap();
        self.hide_spinner_locked(&mut state);
    }

    /// Whether the spinner is shown or waiting out its minimum time.
    pub fn spinner_active(&self) -> bool {
        self.state.lock().unwrap().spinner.active
    }

    fn show_spinner_locked(&self, state: &mut SessionState) {
        state.spinner.cancel_timer();
        state.spinner.shown_at = Some(Instant::now());
        state.spinner.active = true;
        self.controls.set_spinner_visible(true);
    }

    fn hide_spinner_locked(&self, state: &mut SessionState) {
        state.spinner.cancel_timer();
        if !state.spinner.active {
            return;
        }

        let elapsed = state
            .spinner
            .shown_at
            .map(|shown| shown.elapsed())
            .unwrap_or(self.spinner_min_visible);
        let remaining = self.spinner_min_visible.saturating_sub(elapsed);

        if remaining.is_zero() || tokio::runtime::Handle::try_current().is_err() {
            state.spinner.active = false;
            self.controls.set_spinner_visible(false);
            return;
        }

        let shared = Arc::clone(&self.state);
        let controls = Arc::clone(&self.controls);
        let generation = state.spinner.generation;
        state.spinner.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut state = shared.lock().unwrap();
            if state.spinner.generation != generation {
                return;
            }
            state.spinner.hide_timer = None;
            state.spinner.active = false;
            controls.set_spinner_visible(false);
            state.clear_status_if_idle(controls.as_ref());
        }));
    }

    fn spawn_ticker(&self) -> Option<JoinHandle<()>> {
        tokio::runtime::Handle::try_current().ok()?;

        let shared = Arc::clone(&self.state);
        let controls = Arc::clone(&self.controls);
        let period = self.ticker_interval;

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let state = shared.lock().unwrap();
                if state.phase != Phase::Busy {
                    break;
                }
                let text = format_status(&state.status_base, state.elapsed_secs());
                controls.set_status(&text);
            }
        }))
    }

    /// Show a message that needs the user's attention.
    pub fn alert(&self, message: &str) {
        self.controls.alert(message);
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.state.lock().unwrap().prompt = prompt.into();
    }

    pub fn prompt(&self) -> String {
        self.state.lock().unwrap().prompt.clone()
    }

    /// Replace the file selection and refresh its previews.
    pub fn select_files(&self, files: Vec<ImageFile>) {
        let mut state = self.state.lock().unwrap();
        state.previews.refresh(&files);
        state.files = files;
    }

    pub fn selected_files(&self) -> Vec<ImageFile> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn preview_count(&self) -> usize {
        self.state.lock().unwrap().previews.len()
    }

    /// Clear the prompt, the file selection and its previews.
    pub fn clear_inputs(&self) {
        let mut state = self.state.lock().unwrap();
        state.prompt.clear();
        state.files.clear();
        state.previews.clear();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Session")
            .field("phase", &state.phase)
            .field("status_base", &state.status_base)
            .field("spinner_active", &state.spinner.active)
            .field("files", &state.files.len())
            .finish_non_exhaustive()
    }
}

/// Held for the duration of one top-level action.
///
/// Dropping it re-enables inputs, stops the ticker, hides the spinner and
/// clears the status once the spinner is gone.
#[must_use = "the session returns to idle when the guard is dropped"]
pub struct BusyGuard {
    session: Session,
}

impl BusyGuard {
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{RecordingControls, RecordingPreviewHost};

    fn session() -> (Session, Arc<RecordingControls>, Arc<RecordingPreviewHost>) {
        let controls = Arc::new(RecordingControls::new());
        let host = Arc::new(RecordingPreviewHost::new());
        let session = Session::new(controls.clone(), host.clone(), &ClientConfig::default());
        (session, controls, host)
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status("Generating", 0), "Generating");
        assert_eq!(format_status("Generating", 3), "Generating (3s)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_disables_inputs_and_shows_spinner() {
        let (session, controls, _) = session();

        let guard = session.try_begin("Generating");
        assert!(guard.is_some());
        assert!(session.is_busy());
        assert!(!controls.inputs_enabled());
        assert!(controls.spinner_visible());
        assert_eq!(controls.status(), "Generating");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_begin_is_noop() {
        let (session, controls, _) = session();

        let _guard = session.try_begin("First").unwrap();
        let events_before = controls.events().len();

        assert!(session.try_begin("Second").is_none());
        assert_eq!(controls.events().len(), events_before);
        assert_eq!(session.status_base(), "First");
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_drop_restores_idle() {
        let (session, controls, _) = session();

        let guard = session.try_begin("Working").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        drop(guard);

        assert!(!session.is_busy());
        assert!(controls.inputs_enabled());
        assert!(!controls.spinner_visible());
        assert_eq!(controls.status(), "");
        assert!(session.try_begin("Again").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spinner_stays_for_minimum_time() {
        let (session, controls, _) = session();

        let guard = session.try_begin("Quick").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);

        assert!(controls.inputs_enabled());
        assert!(controls.spinner_visible());
        assert_eq!(controls.status(), "Quick");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(controls.spinner_visible());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!controls.spinner_visible());
        assert_eq!(controls.status(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spinner_hides_immediately_after_minimum() {
        let (session, controls, _) = session();

        let guard = session.try_begin("Slow").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        drop(guard);

        assert!(!controls.spinner_visible());
        assert!(!session.spinner_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_cancels_pending_hide() {
        let (session, controls, _) = session();

        session.show_spinner();
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.hide_spinner();
        session.show_spinner();
        tokio::time::sleep(Duration::from_millis(450)).await;

        assert!(controls.spinner_visible());
        assert!(session.spinner_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stale_hide_timer_leaves_new_spinner_visible() {
        let controls = Arc::new(RecordingControls::new());
        let host = Arc::new(RecordingPreviewHost::new());
        let config = ClientConfig::default().with_spinner_min_visible(Duration::from_millis(20));
        let session = Session::new(controls.clone(), host, &config);

        session.show_spinner();
        session.hide_spinner();
        {
            // The timer wakes while the lock is held and waits on it, past
            // the point where aborting it has any effect.
            let mut state = session.state.lock().unwrap();
            std::thread::sleep(Duration::from_millis(100));
            session.show_spinner_locked(&mut state);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(controls.spinner_visible());
        assert!(session.spinner_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_spinner_early_keeps_ticker_running() {
        let (session, controls, _) = session();

        let _guard = session.try_begin("Generating").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.hide_spinner();
        assert!(!controls.spinner_visible());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(session.is_busy());
        assert_eq!(controls.status(), "Generating (2s)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_appends_elapsed_seconds() {
        let (session, controls, _) = session();

        let _guard = session.try_begin("Generating").unwrap();
        tokio::time::sleep(Duration::from_millis(520)).await;
        assert_eq!(controls.status(), "Generating");

        tokio::time::sleep(Duration::from_millis(520)).await;
        assert_eq!(controls.status(), "Generating (1s)");

        session.set_status_base("Describing image 2/3: b.png");
        assert_eq!(controls.status(), "Describing image 2/3: b.png (1s)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_after_release() {
        let (session, controls, _) = session();

        let guard = session.try_begin("Working").unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        drop(guard);
        let statuses_after_release = controls.statuses().len();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(controls.statuses().len(), statuses_after_release);
        assert_eq!(controls.status(), "");
    }

    #[test]
    fn test_form_state_and_previews() {
        let (session, _, host) = session();

        session.set_prompt("What is this?");
        session.select_files(vec![
            ImageFile::new("a.png", vec![1]),
            ImageFile::new("b.png", vec![2]),
        ]);
        assert_eq!(session.prompt(), "What is this?");
        assert_eq!(session.selected_files().len(), 2);
        assert_eq!(session.preview_count(), 2);
        assert_eq!(host.live_count(), 2);

        session.clear_inputs();
        assert_eq!(session.prompt(), "");
        assert!(session.selected_files().is_empty());
        assert_eq!(host.live_count(), 0);
    }
}
