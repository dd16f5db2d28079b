//! Main application state and logic

use crate::config::Config;
use crate::engine::{BindingSlot, Engine, Humanize, Notice, Status};
use crate::error::ListenerError;
use crate::input::InputListener;
use crate::measure::{self, TestProgress, TestResult};
use crate::report::RateReport;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay before a requested capture is armed, so the UI key itself is not
/// taken as the new binding
pub const CAPTURE_ARM_DELAY: Duration = Duration::from_millis(150);

/// Quiet period before settings changes are written
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(280);

/// Jitter step for the `[` / `]` keys
pub const JITTER_STEP: f64 = 0.02;

/// Current view/tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Clicker,
    RateTest,
    Help,
}

impl AppView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clicker => "Clicker",
            Self::RateTest => "Rate Test",
            Self::Help => "Help",
        }
    }

    pub fn all() -> &'static [AppView] {
        &[Self::Clicker, Self::RateTest, Self::Help]
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Clicker => 0,
            Self::RateTest => 1,
            Self::Help => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Clicker,
            1 => Self::RateTest,
            _ => Self::Help,
        }
    }
}

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    /// Typing a free-entry rate
    EnteringRate,
    Quitting,
}

/// Main application
pub struct App {
    /// Current view
    pub view: AppView,
    /// Application state
    pub state: AppState,
    /// Settings snapshot; engine state is folded in on save
    pub config: Config,
    pub engine: Arc<Engine>,
    listener: InputListener,
    /// Set once the listener has started; cleared when it is seen dead
    listener_active: bool,
    notices: Receiver<Notice>,
    /// Where settings are saved; `None` disables persistence
    save_path: Option<PathBuf>,
    pending_save: Option<Instant>,
    pending_capture: Option<(BindingSlot, Instant)>,
    /// Digits typed in rate entry
    pub rate_entry: String,
    /// Last measurement tick
    pub progress: TestProgress,
    /// Application start time
    pub start_time: Instant,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl App {
    pub fn new(
        engine: Arc<Engine>,
        listener: InputListener,
        config: Config,
        save_path: Option<PathBuf>,
    ) -> Self {
        let notices = engine.subscribe();
        Self {
            view: AppView::Clicker,
            state: AppState::Running,
            config,
            engine,
            listener,
            listener_active: false,
            notices,
            save_path,
            pending_save: None,
            pending_capture: None,
            rate_entry: String::new(),
            progress: TestProgress::Inactive,
            start_time: Instant::now(),
            status_message: None,
            status_time: None,
        }
    }

    /// Start the global listener, reporting failure as a blocked status
    pub fn start_listener(&mut self) {
        match self.listener.start() {
            Ok(()) => {
                self.listener_active = true;
                self.engine.listener_started();
                self.set_status("Listener started".to_string());
            }
            Err(e) => {
                self.listener_active = false;
                self.engine.listener_failed(&e);
                self.set_status(format!("Listener blocked: {}", e));
            }
        }
    }

    /// Retry after a blocked listener; no-op while it is running
    pub fn retry_listener(&mut self) {
        match self.listener.restart() {
            Ok(()) => {
                self.listener_active = true;
                self.engine.listener_started();
                self.set_status("Listener running".to_string());
            }
            Err(e) => {
                self.listener_active = false;
                self.engine.listener_failed(&e);
                self.set_status(format!("Listener blocked: {}", e));
            }
        }
    }

    /// Periodic work: listener health, deferred capture, measurement tick,
    /// notices and saves
    pub fn tick(&mut self, now: Instant) {
        if self.listener_active && !self.listener.is_running() {
            self.listener_active = false;
            self.engine.listener_failed(&ListenerError::Stopped);
            self.set_status("Listener stopped, press r to retry".to_string());
        }

        if let Some((slot, at)) = self.pending_capture {
            if now >= at {
                self.pending_capture = None;
                self.engine.begin_capture(slot);
            }
        }

        self.progress = self.engine.tick_rate_test(now);

        while let Ok(notice) = self.notices.try_recv() {
            match notice {
                Notice::BindingChanged { slot, display } => {
                    self.set_status(format!("{} set to {}", slot.name(), display));
                    if self.engine.self_trigger_risk() {
                        self.set_status("Warning: hotkey and output are the same key".to_string());
                    }
                    self.schedule_save(now);
                }
                Notice::ModeChanged(_) | Notice::CadenceChanged(_) => self.schedule_save(now),
                Notice::TestFinished(result) => {
                    self.set_status(format!(
                        "Rate test done: {:.1}/s, stability {}",
                        result.average_rate,
                        result.stability_display()
                    ));
                }
            }
        }

        if let Some(at) = self.pending_save {
            if now >= at {
                self.pending_save = None;
                self.save_now();
            }
        }
    }

    fn schedule_save(&mut self, now: Instant) {
        self.pending_save = Some(now + SAVE_DEBOUNCE);
    }

    /// Whether a debounced save is waiting
    pub fn save_pending(&self) -> bool {
        self.pending_save.is_some()
    }

    fn save_now(&mut self) {
        self.config = self.engine.snapshot_config(&self.config);
        if let Some(path) = &self.save_path {
            if let Err(e) = self.config.save_to(path) {
                log::warn!("settings not saved: {}", e);
            }
        }
    }

    /// Arm capture for `slot` after [`CAPTURE_ARM_DELAY`]
    pub fn request_capture(&mut self, slot: BindingSlot) {
        self.engine.stop();
        self.pending_capture = Some((slot, Instant::now() + CAPTURE_ARM_DELAY));
        self.set_status(format!("Press the new {}", slot.name()));
    }

    pub fn cancel_capture(&mut self) {
        self.pending_capture = None;
        self.engine.cancel_capture();
    }

    pub fn toggle_mode(&mut self) {
        self.engine.set_mode(self.engine.mode().toggled());
    }

    /// Step the rate through the suggested values
    pub fn step_rate(&mut self, up: bool) {
        let cadence = self.engine.cadence();
        let rate = if up {
            cadence.step_up()
        } else {
            cadence.step_down()
        };
        self.engine.set_rate(rate);
    }

    pub fn begin_rate_entry(&mut self) {
        self.rate_entry.clear();
        self.state = AppState::EnteringRate;
    }

    pub fn push_rate_char(&mut self, c: char) {
        if c.is_ascii_digit() && self.rate_entry.len() < 6 {
            self.rate_entry.push(c);
        }
    }

    pub fn pop_rate_char(&mut self) {
        self.rate_entry.pop();
    }

    /// Apply the typed rate; an empty entry leaves the rate unchanged
    pub fn commit_rate_entry(&mut self) {
        if self.rate_entry.is_empty() {
            self.cancel_rate_entry();
            return;
        }
        let rate = self.engine.set_rate_text(&self.rate_entry);
        self.set_status(format!("Rate set to {}/s", rate));
        self.rate_entry.clear();
        self.state = AppState::Running;
    }

    pub fn cancel_rate_entry(&mut self) {
        self.rate_entry.clear();
        self.state = AppState::Running;
    }

    fn update_humanize(&mut self, change: impl FnOnce(&mut Humanize)) {
        let mut humanize = self.engine.cadence().humanize;
        change(&mut humanize);
        self.engine.set_humanize(humanize);
    }

    pub fn toggle_humanize(&mut self) {
        self.update_humanize(|h| h.enabled = !h.enabled);
    }

    pub fn toggle_micro_pause(&mut self) {
        self.update_humanize(|h| h.micro_pause = !h.micro_pause);
    }

    pub fn adjust_jitter(&mut self, delta: f64) {
        // round to the step so repeated presses don't drift
        self.update_humanize(|h| h.jitter = ((h.jitter + delta) * 100.0).round() / 100.0);
    }

    pub fn cycle_duration(&mut self) {
        self.config.measure.duration_secs = measure::next_duration(self.config.measure.duration_secs);
        self.set_status(format!("Test duration {}s", self.config.measure.duration_secs));
        self.schedule_save(Instant::now());
    }

    /// Open a measurement window with the configured duration
    pub fn start_test(&mut self) {
        self.pending_capture = None;
        let now = Instant::now();
        self.engine.start_rate_test(
            self.config.measure.duration(),
            self.config.measure.bin_width(),
            now,
        );
        self.progress = self.engine.tick_rate_test(now);
        self.view = AppView::RateTest;
        self.set_status(format!(
            "Rate test running for {}s, press the hotkey",
            self.config.measure.duration_secs
        ));
    }

    /// Export the last finished test to `dir`
    pub fn export_report(&mut self, dir: &Path) -> Option<PathBuf> {
        let report = match RateReport::from_engine(&self.engine) {
            Ok(report) => report,
            Err(e) => {
                self.set_status(format!("Export failed: {}", e));
                return None;
            }
        };
        let path = dir.join(RateReport::default_file_name(Utc::now()));
        match report.export_json(&path) {
            Ok(()) => {
                self.set_status(format!("Exported to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                self.set_status(format!("Export failed: {}", e));
                None
            }
        }
    }

    /// Whether UI command keys are honoured
    ///
    /// Keystrokes injected by the clicker reach the terminal like any other
    /// key, so commands are ignored while emitting or while a rate test is
    /// open.
    pub fn accepts_commands(&self) -> bool {
        !self.engine.is_running() && !self.engine.rate_test().is_running()
    }

    /// Run the command bound to `c`; returns false if it was ignored
    pub fn handle_char(&mut self, c: char) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        match c {
            'q' => self.quit(),
            '?' => self.view = AppView::Help,
            'h' => self.request_capture(BindingSlot::Hotkey),
            'o' => self.request_capture(BindingSlot::Output),
            'm' => self.toggle_mode(),
            '+' | '=' => self.step_rate(true),
            '-' => self.step_rate(false),
            'c' => self.begin_rate_entry(),
            'j' => self.toggle_humanize(),
            'p' => self.toggle_micro_pause(),
            '[' => self.adjust_jitter(-JITTER_STEP),
            ']' => self.adjust_jitter(JITTER_STEP),
            'd' => self.cycle_duration(),
            't' => self.start_test(),
            'r' => self.retry_listener(),
            'e' => {
                let _ = self.export_report(Path::new("."));
            }
            _ => return false,
        }
        true
    }

    /// Esc: cancel a pending capture, or an open rate test once emission
    /// has stopped
    pub fn escape(&mut self) {
        if self.engine.is_running() {
            return;
        }
        if self.engine.cancel_rate_test() {
            self.progress = TestProgress::Inactive;
            self.set_status("Rate test cancelled".to_string());
        } else {
            self.cancel_capture();
        }
    }

    /// Switch to the next view
    pub fn next_view(&mut self) {
        let next = (self.view.index() + 1) % AppView::all().len();
        self.view = AppView::from_index(next);
    }

    /// Switch to the previous view
    pub fn prev_view(&mut self) {
        let current = self.view.index();
        let prev = if current == 0 {
            AppView::all().len() - 1
        } else {
            current - 1
        };
        self.view = AppView::from_index(prev);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Stop the listener and flush any pending save
    pub fn shutdown(&mut self) {
        self.listener_active = false;
        self.engine.stop();
        self.listener.stop();
        if self.pending_save.take().is_some() {
            self.save_now();
        }
    }

    /// Set a status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still valid (within 3 seconds)
    pub fn get_status(&self) -> Option<&str> {
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed().as_secs() < 3 => Some(msg),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        self.engine.status()
    }

    /// Get results for current view
    pub fn current_results(&self) -> Vec<TestResult> {
        match self.view {
            AppView::Clicker => self.clicker_results(),
            AppView::RateTest => self.test_results(),
            AppView::Help => Vec::new(),
        }
    }

    fn clicker_results(&self) -> Vec<TestResult> {
        let cadence = self.engine.cadence();
        let humanize = cadence.humanize;
        let mut results = vec![
            TestResult::info("Hotkey", self.engine.hotkey_display()),
            TestResult::info("Output", self.engine.output_display()),
            TestResult::info("Mode", self.engine.mode().name()),
            TestResult::info("Rate", format!("{}/s", cadence.rate())),
            TestResult::info("Humanize", if humanize.enabled { "on" } else { "off" }),
            TestResult::info("Jitter", format!("{:.0}%", humanize.jitter * 100.0)),
            TestResult::info("Micro pause", if humanize.micro_pause { "on" } else { "off" }),
        ];

        if self.state == AppState::EnteringRate {
            results.push(TestResult::warning("New rate", format!("{}_", self.rate_entry)));
        }
        if self.engine.self_trigger_risk() {
            results.push(TestResult::warning("Self-trigger", "hotkey equals output"));
        }
        if let Some(e) = self.engine.listener_error() {
            results.push(TestResult::error("Listener", e));
        }
        if let Some(e) = self.engine.output_error() {
            results.push(TestResult::error("Output", e));
        }
        results
    }

    fn test_results(&self) -> Vec<TestResult> {
        let mut results = vec![TestResult::info(
            "Duration",
            format!("{}s", self.config.measure.duration_secs),
        )];
        match &self.progress {
            TestProgress::Inactive => match self.engine.last_result() {
                Some(result) => {
                    results.extend(measure::result_rows(&result, self.engine.cadence().rate()))
                }
                None => results.extend(measure::progress_rows(&self.progress)),
            },
            TestProgress::Finished(result) => {
                results.extend(measure::result_rows(result, self.engine.cadence().rate()))
            }
            running => results.extend(measure::progress_rows(running)),
        }
        results
    }

    /// Fraction of the running window elapsed
    pub fn test_fraction(&self) -> f64 {
        self.progress
            .fraction(self.config.measure.duration_secs as f64)
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{:02}:{:02}", mins, secs)
    }
}
