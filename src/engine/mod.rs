//! Clicker engine
//!
//! [`Engine`] owns every piece of mutable state shared between the
//! listener thread, the emission scheduler and the UI: the run flag, the
//! bindings, capture and trigger state, the cadence and the rate test.
//! It is built once and shared behind an `Arc`.

pub mod binding;
pub mod capture;
pub mod scheduler;
pub mod status;
pub mod trigger;

pub use binding::{Binding, BindingSlot, BindingStore};
pub use capture::{CaptureOutcome, CaptureState};
pub use scheduler::{Cadence, DelayPlanner, Humanize, Scheduler};
pub use status::Status;
pub use trigger::{Mode, TriggerLock, TriggerState};

use crate::config::Config;
use crate::error::{InjectError, ListenerError};
use crate::input::{resolve_with, InputCapabilities, InputEvent, InputIdentifier, InputSink, MouseButton};
use crate::measure::{MeasurementResult, RateTest, TestProgress};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Change notifications for observers (UI labels, settings persistence)
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    BindingChanged { slot: BindingSlot, display: String },
    ModeChanged(Mode),
    CadenceChanged(Cadence),
    TestFinished(MeasurementResult),
}

/// State guarded by one lock so capture and trigger see a consistent view
#[derive(Debug)]
struct Core {
    bindings: BindingStore,
    mode: Mode,
    capture: CaptureState,
    trigger: TriggerState,
    listener_error: Option<String>,
    output_error: Option<String>,
    fallback: MouseButton,
}

/// Shared clicker state
pub struct Engine {
    run: AtomicBool,
    core: Mutex<Core>,
    cadence: Mutex<Cadence>,
    rate_test: RateTest,
    notices: Mutex<Vec<Sender<Notice>>>,
    caps: InputCapabilities,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl Engine {
    /// Engine for the current platform
    pub fn new(config: &Config) -> Self {
        Self::with_capabilities(config, InputCapabilities::current())
    }

    pub fn with_capabilities(config: &Config, caps: InputCapabilities) -> Self {
        let config = config.clone().sanitized();
        let fallback = caps.normalize(
            MouseButton::parse_or_left(&config.clicker.mouse_fallback),
            MouseButton::Left,
        );
        let hotkey = resolve_with(&config.clicker.hotkey, fallback, caps);
        let output = resolve_with(&config.clicker.output, fallback, caps);

        let engine = Self {
            run: AtomicBool::new(false),
            core: Mutex::new(Core {
                bindings: BindingStore::new(hotkey, output),
                mode: config.clicker.mode,
                capture: CaptureState::default(),
                trigger: TriggerState::new(),
                listener_error: None,
                output_error: None,
                fallback,
            }),
            cadence: Mutex::new(Cadence::new(config.clicker.rate, config.humanize)),
            rate_test: RateTest::new(),
            notices: Mutex::new(Vec::new()),
            caps,
        };
        engine.warn_self_trigger();
        engine
    }

    /// Receive [`Notice`]s from now on
    pub fn subscribe(&self) -> Receiver<Notice> {
        let (tx, rx) = mpsc::channel();
        lock(&self.notices).push(tx);
        rx
    }

    fn notify(&self, notice: Notice) {
        lock(&self.notices).retain(|tx| tx.send(notice.clone()).is_ok());
    }

    fn halt(&self, core: &mut Core) {
        self.run.store(false, Ordering::Release);
        core.trigger.clear();
    }

    fn warn_self_trigger(&self) {
        if self.self_trigger_risk() {
            log::warn!("hotkey and output are the same key; emission may retrigger itself");
        }
    }

    // ---- bindings -------------------------------------------------------

    /// Store a binding; always stops emission
    pub fn set_binding(&self, binding: Binding) {
        let display = {
            let mut core = lock(&self.core);
            self.apply_binding(&mut core, binding)
        };
        self.warn_self_trigger();
        self.notify(Notice::BindingChanged {
            slot: binding.slot,
            display,
        });
    }

    fn apply_binding(&self, core: &mut Core, binding: Binding) -> String {
        let input = match binding.input {
            InputIdentifier::Mouse(button) => {
                InputIdentifier::Mouse(self.caps.normalize(button, core.fallback))
            }
            other => other,
        };
        core.bindings.set(Binding {
            slot: binding.slot,
            input,
        });
        core.capture.cancel();
        self.halt(core);
        if binding.slot == BindingSlot::Output {
            core.output_error = None;
        }
        log::info!("{} set to {}", binding.slot.name(), input);
        input.display()
    }

    pub fn set_hotkey(&self, input: InputIdentifier) {
        self.set_binding(Binding::hotkey(input));
    }

    pub fn set_output(&self, input: InputIdentifier) {
        self.set_binding(Binding::output(input));
    }

    /// Resolve a token (with extended-button fallback) and bind it as hotkey
    pub fn set_hotkey_token(&self, token: &str) {
        let input = self.resolve(token);
        self.set_hotkey(input);
    }

    pub fn set_output_token(&self, token: &str) {
        let input = self.resolve(token);
        self.set_output(input);
    }

    fn resolve(&self, token: &str) -> InputIdentifier {
        let fallback = lock(&self.core).fallback;
        resolve_with(token, fallback, self.caps)
    }

    /// (hotkey, output)
    pub fn bindings(&self) -> (Binding, Binding) {
        lock(&self.core).bindings.get()
    }

    pub fn hotkey_display(&self) -> String {
        lock(&self.core).bindings.hotkey().display()
    }

    pub fn output_display(&self) -> String {
        lock(&self.core).bindings.output().display()
    }

    /// Hotkey and output are the same keyboard key
    pub fn self_trigger_risk(&self) -> bool {
        lock(&self.core).bindings.self_trigger_risk()
    }

    // ---- mode and capture -----------------------------------------------

    pub fn set_mode(&self, mode: Mode) {
        {
            let mut core = lock(&self.core);
            core.mode = mode;
            self.halt(&mut core);
        }
        log::info!("mode set to {}", mode.name());
        self.notify(Notice::ModeChanged(mode));
    }

    pub fn mode(&self) -> Mode {
        lock(&self.core).mode
    }

    /// Arm capture for `slot`; the next press is bound instead of acted on
    pub fn begin_capture(&self, slot: BindingSlot) {
        let mut core = lock(&self.core);
        self.halt(&mut core);
        core.capture.arm(slot);
        log::debug!("capturing {}", slot.name());
    }

    pub fn cancel_capture(&self) {
        let mut core = lock(&self.core);
        if core.capture.is_capturing() {
            core.capture.cancel();
            log::debug!("capture cancelled");
        }
    }

    pub fn capture_state(&self) -> CaptureState {
        lock(&self.core).capture
    }

    // ---- input ----------------------------------------------------------

    /// Route one listener event through capture, then the trigger
    pub fn handle_input(&self, event: &InputEvent) {
        let captured = {
            let mut core = lock(&self.core);
            match core.capture.offer(event) {
                CaptureOutcome::Captured(binding) => {
                    let display = self.apply_binding(&mut core, binding);
                    Some((binding.slot, display))
                }
                CaptureOutcome::Swallowed => None,
                CaptureOutcome::Pass => {
                    let hotkey = core.bindings.hotkey();
                    let mode = core.mode;
                    let running = self.is_running();
                    if let Some(next) = core.trigger.on_event(mode, &hotkey, event, running) {
                        if next != running {
                            log::debug!("run flag -> {}", next);
                        }
                        self.run.store(next, Ordering::Release);
                    }
                    None
                }
            }
        };

        if let Some((slot, display)) = captured {
            self.warn_self_trigger();
            self.notify(Notice::BindingChanged { slot, display });
        }
    }

    // ---- run flag and cadence -------------------------------------------

    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Acquire)
    }

    /// Stop emission and drop trigger locks
    pub fn stop(&self) {
        let mut core = lock(&self.core);
        self.halt(&mut core);
    }

    pub fn set_rate(&self, rate: u32) {
        let humanize = self.cadence().humanize;
        self.set_cadence(Cadence::new(rate, humanize));
    }

    /// Free-entry rate text; bad input falls back to the default rate
    pub fn set_rate_text(&self, text: &str) -> u32 {
        let rate = scheduler::parse_rate(text);
        self.set_rate(rate);
        rate
    }

    pub fn set_humanize(&self, humanize: Humanize) {
        let rate = self.cadence().rate();
        self.set_cadence(Cadence::new(rate, humanize));
    }

    fn set_cadence(&self, cadence: Cadence) {
        *lock(&self.cadence) = cadence;
        self.stop();
        log::info!(
            "rate {}/s, humanize {} (jitter {:.2}, micro pause {})",
            cadence.rate(),
            cadence.humanize.enabled,
            cadence.humanize.jitter,
            cadence.humanize.micro_pause
        );
        self.notify(Notice::CadenceChanged(cadence));
    }

    pub fn cadence(&self) -> Cadence {
        *lock(&self.cadence)
    }

    /// Re-apply a whole settings snapshot
    pub fn apply_config(&self, config: &Config) {
        let config = config.clone().sanitized();
        let (hotkey_display, output_display) = {
            let mut core = lock(&self.core);
            core.fallback = self.caps.normalize(
                MouseButton::parse_or_left(&config.clicker.mouse_fallback),
                MouseButton::Left,
            );
            let hotkey = resolve_with(&config.clicker.hotkey, core.fallback, self.caps);
            let output = resolve_with(&config.clicker.output, core.fallback, self.caps);
            core.bindings = BindingStore::new(hotkey, output);
            core.mode = config.clicker.mode;
            core.capture.cancel();
            core.output_error = None;
            self.halt(&mut core);
            (hotkey.display(), output.display())
        };
        let cadence = Cadence::new(config.clicker.rate, config.humanize);
        *lock(&self.cadence) = cadence;
        log::info!("settings applied");
        self.warn_self_trigger();

        self.notify(Notice::BindingChanged {
            slot: BindingSlot::Hotkey,
            display: hotkey_display,
        });
        self.notify(Notice::BindingChanged {
            slot: BindingSlot::Output,
            display: output_display,
        });
        self.notify(Notice::ModeChanged(config.clicker.mode));
        self.notify(Notice::CadenceChanged(cadence));
    }

    /// `base` with the engine's current bindings, mode and cadence
    pub fn snapshot_config(&self, base: &Config) -> Config {
        let mut config = base.clone();
        {
            let core = lock(&self.core);
            config.clicker.hotkey = core.bindings.hotkey().display();
            config.clicker.output = core.bindings.output().display();
            config.clicker.mode = core.mode;
            config.clicker.mouse_fallback = core.fallback.short_name().to_string();
        }
        let cadence = self.cadence();
        config.clicker.rate = cadence.rate();
        config.humanize = cadence.humanize;
        config
    }

    // ---- status ---------------------------------------------------------

    pub fn status(&self) -> Status {
        let core = lock(&self.core);
        if core.listener_error.is_some() {
            Status::ListenerBlocked
        } else if core.output_error.is_some() {
            Status::OutputBlocked
        } else if let CaptureState::Capturing(slot) = core.capture {
            match slot {
                BindingSlot::Hotkey => Status::CapturingHotkey,
                BindingSlot::Output => Status::CapturingOutput,
            }
        } else if self.is_running() {
            Status::Running
        } else {
            Status::Idle
        }
    }

    pub fn listener_started(&self) {
        lock(&self.core).listener_error = None;
    }

    pub fn listener_failed(&self, error: &ListenerError) {
        let mut core = lock(&self.core);
        self.halt(&mut core);
        core.listener_error = Some(error.to_string());
        log::warn!("input listener unavailable: {}", error);
    }

    pub fn listener_error(&self) -> Option<String> {
        lock(&self.core).listener_error.clone()
    }

    pub fn output_error(&self) -> Option<String> {
        lock(&self.core).output_error.clone()
    }

    // ---- scheduler hooks ------------------------------------------------

    /// What to emit next, or `None` while stopped
    pub(crate) fn emission_plan(&self) -> Option<(InputIdentifier, Cadence)> {
        if !self.is_running() {
            return None;
        }
        let output = lock(&self.core).bindings.output();
        Some((output, self.cadence()))
    }

    pub(crate) fn emission_succeeded(&self, now: Instant) {
        self.rate_test.record(now);
        let mut core = lock(&self.core);
        if core.output_error.take().is_some() {
            log::info!("output injection recovered");
        }
    }

    pub(crate) fn emission_failed(&self, error: &InjectError) {
        self.run.store(false, Ordering::Release);
        let mut core = lock(&self.core);
        if core.output_error.is_none() {
            log::error!("{}", error);
        }
        core.output_error = Some(error.to_string());
    }

    // ---- rate test ------------------------------------------------------

    /// Open a measurement window; stops emission and cancels capture
    pub fn start_rate_test(&self, duration: Duration, bin_width: Duration, now: Instant) {
        {
            let mut core = lock(&self.core);
            core.capture.cancel();
            self.halt(&mut core);
        }
        self.rate_test.start(duration, bin_width, now);
    }

    /// Advance the window; a finished window always leaves emission stopped
    pub fn tick_rate_test(&self, now: Instant) -> TestProgress {
        let progress = self.rate_test.tick(now);
        if let TestProgress::Finished(result) = &progress {
            self.stop();
            self.notify(Notice::TestFinished(result.clone()));
        }
        progress
    }

    /// Drop a running window without a result
    pub fn cancel_rate_test(&self) -> bool {
        self.rate_test.cancel()
    }

    pub fn rate_test(&self) -> &RateTest {
        &self.rate_test
    }

    pub fn last_result(&self) -> Option<MeasurementResult> {
        self.rate_test.last_result()
    }
}

impl InputSink for Engine {
    fn on_input(&self, event: &InputEvent) {
        self.handle_input(event);
    }
}
