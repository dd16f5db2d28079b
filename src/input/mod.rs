//! Input identifiers, events, listening and injection

pub mod identifier;
mod event;
pub mod inject;
pub mod keymap;
pub mod listener;
pub mod test_helpers;

pub use event::{InputAction, InputEvent, InputSink};
pub use identifier::{
    display, resolve, resolve_with, InputCapabilities, InputIdentifier, InputKind, MouseButton,
    SpecialKey, DEFAULT_KEY,
};
pub use inject::{open_injector, Injector, UnavailableInjector};
pub use listener::InputListener;
