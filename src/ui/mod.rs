//! Terminal User Interface components

mod app;
mod widgets;

pub use app::{App, AppState, AppView, CAPTURE_ARM_DELAY, JITTER_STEP, SAVE_DEBOUNCE};
pub use widgets::*;
