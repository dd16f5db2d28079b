//! Capture state machine
//!
//! When armed, the next press of any key or mouse button becomes the new
//! binding for the armed slot. While armed, every event is consumed here
//! and never reaches the trigger machine.

use super::{Binding, BindingSlot};
use crate::input::InputEvent;

/// Capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing(BindingSlot),
}

/// Result of offering an event to the capture machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Not capturing; the event belongs to the trigger machine
    Pass,
    /// Capturing, but the event does not qualify (releases)
    Swallowed,
    /// Capture finished with this binding; state is back to idle
    Captured(Binding),
}

impl CaptureState {
    pub fn arm(&mut self, slot: BindingSlot) {
        *self = Self::Capturing(slot);
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing(_))
    }

    /// Offer an event; returns to idle in the same step a binding is produced
    pub fn offer(&mut self, event: &InputEvent) -> CaptureOutcome {
        let slot = match *self {
            Self::Idle => return CaptureOutcome::Pass,
            Self::Capturing(slot) => slot,
        };

        if !event.is_press() {
            return CaptureOutcome::Swallowed;
        }

        *self = Self::Idle;
        CaptureOutcome::Captured(Binding {
            slot,
            input: event.input,
        })
    }
}
