//! Canonical input identifiers and configuration token resolution
//!
//! Every key or button the engine deals with is an [`InputIdentifier`].
//! Configuration tokens ("a", "F1", "MOUSE_LEFT", "x2", ...) are resolved
//! case-insensitively and never fail: unknown tokens become the default
//! output key and extended mouse buttons the platform can't deliver are
//! replaced by a fallback button.

use std::fmt;

/// Key used when a token cannot be resolved at all
pub const DEFAULT_KEY: char = 'f';

/// Named non-character keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Shift,
    Ctrl,
    Alt,
}

impl SpecialKey {
    pub fn all() -> &'static [SpecialKey] {
        &[
            Self::F1,
            Self::F2,
            Self::F3,
            Self::F4,
            Self::F5,
            Self::F6,
            Self::F7,
            Self::F8,
            Self::F9,
            Self::F10,
            Self::F11,
            Self::F12,
            Self::Space,
            Self::Enter,
            Self::Tab,
            Self::Escape,
            Self::Backspace,
            Self::Shift,
            Self::Ctrl,
            Self::Alt,
        ]
    }

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::F4 => "F4",
            Self::F5 => "F5",
            Self::F6 => "F6",
            Self::F7 => "F7",
            Self::F8 => "F8",
            Self::F9 => "F9",
            Self::F10 => "F10",
            Self::F11 => "F11",
            Self::F12 => "F12",
            Self::Space => "SPACE",
            Self::Enter => "ENTER",
            Self::Tab => "TAB",
            Self::Escape => "ESC",
            Self::Backspace => "BACKSPACE",
            Self::Shift => "SHIFT",
            Self::Ctrl => "CTRL",
            Self::Alt => "ALT",
        }
    }

    /// Parse a lower-cased token, accepting a few common aliases
    fn from_token(token: &str) -> Option<Self> {
        let key = match token {
            "space" => Self::Space,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "esc" | "escape" => Self::Escape,
            "backspace" => Self::Backspace,
            "shift" => Self::Shift,
            "ctrl" | "control" => Self::Ctrl,
            "alt" => Self::Alt,
            _ => {
                return Self::all()
                    .iter()
                    .copied()
                    .find(|k| k.name().eq_ignore_ascii_case(token));
            }
        };
        Some(key)
    }
}

/// Mouse buttons, including the two side buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    pub fn is_extended(&self) -> bool {
        matches!(self, Self::X1 | Self::X2)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "MOUSE_LEFT",
            Self::Right => "MOUSE_RIGHT",
            Self::Middle => "MOUSE_MIDDLE",
            Self::X1 => "XBUTTON1",
            Self::X2 => "XBUTTON2",
        }
    }

    /// Short lower-case name used in config files
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
            Self::X1 => "x1",
            Self::X2 => "x2",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        let token = token.strip_prefix("mouse_").unwrap_or(token);
        match token {
            "left" | "lmb" => Some(Self::Left),
            "right" | "rmb" => Some(Self::Right),
            "middle" | "mmb" => Some(Self::Middle),
            "x1" | "xbutton1" | "back" => Some(Self::X1),
            "x2" | "xbutton2" | "forward" => Some(Self::X2),
            _ => None,
        }
    }

    /// Parse a fallback button name, defaulting to the left button
    pub fn parse_or_left(token: &str) -> Self {
        Self::from_token(&token.trim().to_ascii_lowercase()).unwrap_or(Self::Left)
    }
}

/// Coarse category of an input, used to pick trigger locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    KeyboardChar,
    KeyboardSpecial,
    Mouse,
}

impl InputKind {
    pub fn is_keyboard(&self) -> bool {
        !matches!(self, Self::Mouse)
    }
}

/// A single key or button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputIdentifier {
    /// Printable character key, stored lower-case
    Char(char),
    /// Named special key
    Special(SpecialKey),
    /// Mouse button
    Mouse(MouseButton),
}

impl InputIdentifier {
    /// Character key identifier; letters are folded to lower case
    pub fn char(c: char) -> Self {
        Self::Char(c.to_ascii_lowercase())
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Char(_) => InputKind::KeyboardChar,
            Self::Special(_) => InputKind::KeyboardSpecial,
            Self::Mouse(_) => InputKind::Mouse,
        }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self, Self::Mouse(_))
    }

    /// Canonical display text, itself a valid token
    pub fn display(&self) -> String {
        match self {
            Self::Char(c) => c.to_ascii_uppercase().to_string(),
            Self::Special(key) => key.name().to_string(),
            Self::Mouse(button) => button.name().to_string(),
        }
    }
}

impl Default for InputIdentifier {
    fn default() -> Self {
        Self::Char(DEFAULT_KEY)
    }
}

impl fmt::Display for InputIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// What the current platform's input backend can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCapabilities {
    /// Side buttons (XBUTTON1/XBUTTON2) are both observable and injectable
    pub extended_mouse_buttons: bool,
}

impl InputCapabilities {
    /// Capabilities of the backend compiled for this target
    pub fn current() -> Self {
        Self {
            extended_mouse_buttons: cfg!(target_os = "windows"),
        }
    }

    pub fn full() -> Self {
        Self {
            extended_mouse_buttons: true,
        }
    }

    pub fn basic() -> Self {
        Self {
            extended_mouse_buttons: false,
        }
    }

    /// Replace buttons the platform lacks with `fallback`
    pub fn normalize(&self, button: MouseButton, fallback: MouseButton) -> MouseButton {
        if button.is_extended() && !self.extended_mouse_buttons {
            if fallback.is_extended() {
                MouseButton::Left
            } else {
                fallback
            }
        } else {
            button
        }
    }
}

impl Default for InputCapabilities {
    fn default() -> Self {
        Self::current()
    }
}

/// Resolve a configuration token on the current platform
pub fn resolve(token: &str, fallback: MouseButton) -> InputIdentifier {
    resolve_with(token, fallback, InputCapabilities::current())
}

/// Resolve a configuration token against explicit capabilities
pub fn resolve_with(token: &str, fallback: MouseButton, caps: InputCapabilities) -> InputIdentifier {
    let trimmed = token.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some(button) = MouseButton::from_token(&lower) {
        return InputIdentifier::Mouse(caps.normalize(button, fallback));
    }

    if let Some(key) = SpecialKey::from_token(&lower) {
        return InputIdentifier::Special(key);
    }

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_graphic() {
            return InputIdentifier::char(c);
        }
    }

    log::warn!("unrecognised input token {:?}, using {:?}", token, DEFAULT_KEY);
    InputIdentifier::default()
}

/// Display text for a token, after resolution
pub fn display(token: &str, fallback: MouseButton) -> String {
    resolve(token, fallback).display()
}
