//! pulsekey - hotkey-driven input repeater with a built-in rate test
//!
//! A global hotkey starts and stops a stream of synthetic key presses or
//! mouse clicks at a configurable rate, optionally humanized with jitter
//! and micro-pauses. A measurement window times the actual emissions and
//! reports average rate, peak and stability.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod measure;
pub mod report;
pub mod ui;

pub use config::Config;
pub use engine::Engine;
