//! Trigger state machine
//!
//! Maps hotkey press/release events to run-flag changes. A small lock set
//! makes repeated presses (OS key repeat) no-ops until the matching
//! release arrives.

use crate::input::{InputEvent, InputIdentifier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How the hotkey drives emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Each press flips emission on/off
    #[default]
    Toggle,
    /// Emission runs while the hotkey is held
    Hold,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "Toggle",
            Self::Hold => "Hold",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Toggle => Self::Hold,
            Self::Hold => Self::Toggle,
        }
    }
}

/// Repeat-suppression locks, one per hotkey flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerLock {
    KeyboardToggle,
    KeyboardHold,
    MouseToggle,
}

/// Lock set plus the transition function
#[derive(Debug, Clone, Default)]
pub struct TriggerState {
    locks: HashSet<TriggerLock>,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, lock: TriggerLock) -> bool {
        self.locks.contains(&lock)
    }

    pub fn has_locks(&self) -> bool {
        !self.locks.is_empty()
    }

    /// Drop all latched locks
    pub fn clear(&mut self) {
        self.locks.clear();
    }

    /// Process one event against the hotkey
    ///
    /// Returns the new run-flag value when the event changes or assigns it.
    /// Events that don't match the hotkey (including every event of the
    /// other device kind) are ignored.
    pub fn on_event(
        &mut self,
        mode: Mode,
        hotkey: &InputIdentifier,
        event: &InputEvent,
        running: bool,
    ) -> Option<bool> {
        if event.input != *hotkey {
            return None;
        }

        let pressed = event.is_press();
        match (hotkey.is_mouse(), mode) {
            (false, Mode::Hold) => {
                if pressed {
                    self.latch(TriggerLock::KeyboardHold).then_some(true)
                } else {
                    self.locks.remove(&TriggerLock::KeyboardHold);
                    Some(false)
                }
            }
            (false, Mode::Toggle) => {
                if pressed {
                    self.latch(TriggerLock::KeyboardToggle).then_some(!running)
                } else {
                    self.locks.remove(&TriggerLock::KeyboardToggle);
                    None
                }
            }
            // Mouse buttons don't auto-repeat; hold mirrors the button
            (true, Mode::Hold) => Some(pressed),
            (true, Mode::Toggle) => {
                if pressed {
                    self.latch(TriggerLock::MouseToggle).then_some(!running)
                } else {
                    self.locks.remove(&TriggerLock::MouseToggle);
                    None
                }
            }
        }
    }

    /// Set a lock; false if it was already set
    fn latch(&mut self, lock: TriggerLock) -> bool {
        self.locks.insert(lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_helpers::{press, release, HOTKEY, MOUSE_HOTKEY};
    use crate::input::{InputEvent, InputIdentifier};

    /// Feed events and return the run flag after each one
    fn run(mode: Mode, hotkey: InputIdentifier, events: &[InputEvent]) -> Vec<bool> {
        let mut state = TriggerState::new();
        let mut running = false;
        events
            .iter()
            .map(|e| {
                if let Some(next) = state.on_event(mode, &hotkey, e, running) {
                    running = next;
                }
                running
            })
            .collect()
    }

    #[test]
    fn hold_mirrors_physical_key() {
        let flags = run(
            Mode::Hold,
            HOTKEY,
            &[press(HOTKEY), press(HOTKEY), press(HOTKEY), release(HOTKEY)],
        );
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn hold_repeat_presses_are_noops() {
        let mut state = TriggerState::new();
        assert_eq!(state.on_event(Mode::Hold, &HOTKEY, &press(HOTKEY), false), Some(true));
        assert!(state.is_locked(TriggerLock::KeyboardHold));
        assert_eq!(state.on_event(Mode::Hold, &HOTKEY, &press(HOTKEY), true), None);
        assert_eq!(state.on_event(Mode::Hold, &HOTKEY, &release(HOTKEY), true), Some(false));
        assert!(!state.has_locks());
    }

    #[test]
    fn toggle_flips_once_per_qualifying_press() {
        // press, repeat, release, press
        let flags = run(
            Mode::Toggle,
            HOTKEY,
            &[press(HOTKEY), press(HOTKEY), release(HOTKEY), press(HOTKEY)],
        );
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn toggle_release_leaves_flag_alone() {
        let flags = run(
            Mode::Toggle,
            HOTKEY,
            &[press(HOTKEY), release(HOTKEY), press(HOTKEY), release(HOTKEY)],
        );
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn other_keys_are_ignored() {
        let other = InputIdentifier::Char('x');
        let flags = run(Mode::Toggle, HOTKEY, &[press(other), release(other)]);
        assert_eq!(flags, vec![false, false]);
    }

    #[test]
    fn keyboard_events_ignored_for_mouse_hotkey() {
        let flags = run(Mode::Toggle, MOUSE_HOTKEY, &[press(HOTKEY), release(HOTKEY)]);
        assert_eq!(flags, vec![false, false]);
        let flags = run(Mode::Hold, HOTKEY, &[press(MOUSE_HOTKEY)]);
        assert_eq!(flags, vec![false]);
    }

    #[test]
    fn mouse_toggle_uses_lock() {
        let flags = run(
            Mode::Toggle,
            MOUSE_HOTKEY,
            &[
                press(MOUSE_HOTKEY),
                press(MOUSE_HOTKEY),
                release(MOUSE_HOTKEY),
                press(MOUSE_HOTKEY),
            ],
        );
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn mouse_hold_follows_button() {
        let flags = run(
            Mode::Hold,
            MOUSE_HOTKEY,
            &[press(MOUSE_HOTKEY), release(MOUSE_HOTKEY)],
        );
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn cleared_lock_allows_new_press() {
        let mut state = TriggerState::new();
        state.on_event(Mode::Toggle, &HOTKEY, &press(HOTKEY), false);
        state.clear();
        assert_eq!(state.on_event(Mode::Toggle, &HOTKEY, &press(HOTKEY), false), Some(true));
    }

    #[test]
    fn mode_toggles() {
        assert_eq!(Mode::Toggle.toggled(), Mode::Hold);
        assert_eq!(Mode::Hold.toggled(), Mode::Toggle);
    }
}
