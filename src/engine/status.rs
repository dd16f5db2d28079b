//! Engine status signal

/// What the engine is doing, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    CapturingHotkey,
    CapturingOutput,
    Running,
    /// Listener could not start; nothing is delivered until a retry works
    ListenerBlocked,
    /// The OS rejected synthetic output
    OutputBlocked,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::CapturingHotkey => "PRESS NEW HOTKEY",
            Self::CapturingOutput => "PRESS NEW OUTPUT",
            Self::Running => "RUNNING",
            Self::ListenerBlocked => "LISTENER BLOCKED",
            Self::OutputBlocked => "OUTPUT BLOCKED",
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::ListenerBlocked | Self::OutputBlocked)
    }
}
