//! Normalized input events

use super::InputIdentifier;
use std::time::Instant;

/// Whether a key/button went down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Key pressed or mouse button clicked
    Press,
    /// Key released or mouse button let go
    Release,
}

/// A single press or release, as delivered by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// The key or button
    pub input: InputIdentifier,
    /// Press or release
    pub action: InputAction,
    /// When the listener observed the change
    pub timestamp: Instant,
}

impl InputEvent {
    pub fn new(input: InputIdentifier, action: InputAction, timestamp: Instant) -> Self {
        Self {
            input,
            action,
            timestamp,
        }
    }

    pub fn is_press(&self) -> bool {
        self.action == InputAction::Press
    }

    pub fn is_release(&self) -> bool {
        self.action == InputAction::Release
    }
}

/// Receiver of listener events
///
/// The listener thread calls this for every normalized event, so
/// implementations must be cheap and must not block.
pub trait InputSink: Send + Sync {
    fn on_input(&self, event: &InputEvent);
}
