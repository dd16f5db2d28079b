//! Shared event builders for engine tests
//!
//! Provides helpers for creating press/release events and a recording
//! injector that never touches the OS.

use super::{InputAction, InputEvent, InputIdentifier, Injector, MouseButton, SpecialKey};
use crate::error::InjectError;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Default hotkey used in tests
pub const HOTKEY: InputIdentifier = InputIdentifier::Special(SpecialKey::F1);

/// Default mouse hotkey used in tests
pub const MOUSE_HOTKEY: InputIdentifier = InputIdentifier::Mouse(MouseButton::X1);

/// Creates an event with full control over all parameters.
pub fn make_event(input: InputIdentifier, action: InputAction, timestamp: Instant) -> InputEvent {
    InputEvent {
        input,
        action,
        timestamp,
    }
}

/// Creates a press event stamped with `Instant::now()`.
pub fn press(input: InputIdentifier) -> InputEvent {
    make_event(input, InputAction::Press, Instant::now())
}

/// Creates a release event stamped with `Instant::now()`.
pub fn release(input: InputIdentifier) -> InputEvent {
    make_event(input, InputAction::Release, Instant::now())
}

/// Injector that records every emission and can be switched to fail
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    emitted: Arc<Mutex<Vec<InputIdentifier>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent emissions fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|p| p.into_inner()) = failing;
    }

    /// Everything emitted so far
    pub fn emitted(&self) -> Vec<InputIdentifier> {
        self.emitted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Injector for RecordingInjector {
    fn emit(&mut self, output: &InputIdentifier) -> Result<(), InjectError> {
        if *self.failing.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(InjectError::Send("synthetic input denied".to_string()));
        }
        self.emitted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(*output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_creates_press_event() {
        let event = press(HOTKEY);
        assert_eq!(event.input, HOTKEY);
        assert!(event.is_press());
    }

    #[test]
    fn release_creates_release_event() {
        let event = release(MOUSE_HOTKEY);
        assert_eq!(event.input, MOUSE_HOTKEY);
        assert!(event.is_release());
    }

    #[test]
    fn recording_injector_shares_log_between_clones() {
        let recorder = RecordingInjector::new();
        let mut injector = recorder.clone();
        injector.emit(&HOTKEY).unwrap();
        recorder.set_failing(true);
        assert!(injector.emit(&HOTKEY).is_err());
        assert_eq!(recorder.emitted(), vec![HOTKEY]);
    }
}
