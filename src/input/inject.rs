//! Synthetic output injection
//!
//! The emission scheduler talks to an [`Injector`]. With the `inject`
//! feature the real backend is `enigo`; without it every emission fails
//! with [`InjectError::Unavailable`], which the engine surfaces as an
//! output-blocked status instead of crashing.

use super::InputIdentifier;
use crate::error::InjectError;

/// Sends one complete output action (press + release, or a full click)
pub trait Injector {
    fn emit(&mut self, output: &InputIdentifier) -> Result<(), InjectError>;
}

/// Injector used when no backend could be created
#[derive(Debug, Clone)]
pub struct UnavailableInjector {
    reason: String,
}

impl UnavailableInjector {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Injector for UnavailableInjector {
    fn emit(&mut self, _output: &InputIdentifier) -> Result<(), InjectError> {
        Err(InjectError::Unavailable(self.reason.clone()))
    }
}

/// Open the best injector for this build
///
/// Must be called on the thread that will use it.
pub fn open_injector() -> Box<dyn Injector> {
    #[cfg(feature = "inject")]
    {
        match enigo_backend::EnigoInjector::new() {
            Ok(injector) => Box::new(injector),
            Err(e) => {
                log::error!("output injection unavailable: {}", e);
                Box::new(UnavailableInjector::new(e.to_string()))
            }
        }
    }

    #[cfg(not(feature = "inject"))]
    {
        log::warn!("built without the `inject` feature, output is disabled");
        Box::new(UnavailableInjector::new("built without the `inject` feature"))
    }
}

#[cfg(feature = "inject")]
pub mod enigo_backend {
    use super::Injector;
    use crate::error::InjectError;
    use crate::input::{InputIdentifier, MouseButton, SpecialKey};
    use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};

    /// enigo-backed injector
    pub struct EnigoInjector {
        enigo: Enigo,
    }

    impl EnigoInjector {
        pub fn new() -> Result<Self, InjectError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| InjectError::Init(e.to_string()))?;
            Ok(Self { enigo })
        }

        fn key(key: SpecialKey) -> Key {
            match key {
                SpecialKey::F1 => Key::F1,
                SpecialKey::F2 => Key::F2,
                SpecialKey::F3 => Key::F3,
                SpecialKey::F4 => Key::F4,
                SpecialKey::F5 => Key::F5,
                SpecialKey::F6 => Key::F6,
                SpecialKey::F7 => Key::F7,
                SpecialKey::F8 => Key::F8,
                SpecialKey::F9 => Key::F9,
                SpecialKey::F10 => Key::F10,
                SpecialKey::F11 => Key::F11,
                SpecialKey::F12 => Key::F12,
                SpecialKey::Space => Key::Space,
                SpecialKey::Enter => Key::Return,
                SpecialKey::Tab => Key::Tab,
                SpecialKey::Escape => Key::Escape,
                SpecialKey::Backspace => Key::Backspace,
                SpecialKey::Shift => Key::Shift,
                SpecialKey::Ctrl => Key::Control,
                SpecialKey::Alt => Key::Alt,
            }
        }

        fn button(button: MouseButton) -> Button {
            match button {
                MouseButton::Left => Button::Left,
                MouseButton::Right => Button::Right,
                MouseButton::Middle => Button::Middle,
                #[cfg(not(target_os = "macos"))]
                MouseButton::X1 => Button::Back,
                #[cfg(not(target_os = "macos"))]
                MouseButton::X2 => Button::Forward,
                #[cfg(target_os = "macos")]
                MouseButton::X1 | MouseButton::X2 => Button::Left,
            }
        }

        fn tap(&mut self, key: Key) -> Result<(), InjectError> {
            self.enigo
                .key(key, Direction::Press)
                .map_err(|e| InjectError::Send(format!("press failed: {}", e)))?;
            self.enigo
                .key(key, Direction::Release)
                .map_err(|e| InjectError::Send(format!("release failed: {}", e)))
        }
    }

    impl Injector for EnigoInjector {
        fn emit(&mut self, output: &InputIdentifier) -> Result<(), InjectError> {
            match *output {
                InputIdentifier::Char(c) => self.tap(Key::Unicode(c)),
                InputIdentifier::Special(key) => self.tap(Self::key(key)),
                InputIdentifier::Mouse(button) => self
                    .enigo
                    .button(Self::button(button), Direction::Click)
                    .map_err(|e| InjectError::Send(format!("click failed: {}", e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_injector_always_fails() {
        let mut injector = UnavailableInjector::new("no backend");
        let err = injector.emit(&InputIdentifier::Char('f')).unwrap_err();
        assert!(matches!(err, InjectError::Unavailable(_)));
        assert!(err.to_string().contains("no backend"));
    }
}
