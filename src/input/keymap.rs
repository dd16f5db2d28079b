//! Platform keycode mapping
//!
//! Translates `device_query` keycodes and mouse button slots into
//! [`InputIdentifier`]s. Keys that have no identifier (numpad, arrows,
//! navigation cluster, ...) map to `None` and are never delivered.

use super::{InputIdentifier, MouseButton, SpecialKey};
use device_query::Keycode as DK;

/// Map a `device_query` keycode to an identifier
pub fn from_keycode(keycode: DK) -> Option<InputIdentifier> {
    let special = |key| Some(InputIdentifier::Special(key));
    let ch = |c| Some(InputIdentifier::Char(c));

    match keycode {
        DK::A => ch('a'),
        DK::B => ch('b'),
        DK::C => ch('c'),
        DK::D => ch('d'),
        DK::E => ch('e'),
        DK::F => ch('f'),
        DK::G => ch('g'),
        DK::H => ch('h'),
        DK::I => ch('i'),
        DK::J => ch('j'),
        DK::K => ch('k'),
        DK::L => ch('l'),
        DK::M => ch('m'),
        DK::N => ch('n'),
        DK::O => ch('o'),
        DK::P => ch('p'),
        DK::Q => ch('q'),
        DK::R => ch('r'),
        DK::S => ch('s'),
        DK::T => ch('t'),
        DK::U => ch('u'),
        DK::V => ch('v'),
        DK::W => ch('w'),
        DK::X => ch('x'),
        DK::Y => ch('y'),
        DK::Z => ch('z'),
        DK::Key0 => ch('0'),
        DK::Key1 => ch('1'),
        DK::Key2 => ch('2'),
        DK::Key3 => ch('3'),
        DK::Key4 => ch('4'),
        DK::Key5 => ch('5'),
        DK::Key6 => ch('6'),
        DK::Key7 => ch('7'),
        DK::Key8 => ch('8'),
        DK::Key9 => ch('9'),
        DK::Minus => ch('-'),
        DK::Equal => ch('='),
        DK::LeftBracket => ch('['),
        DK::RightBracket => ch(']'),
        DK::Semicolon => ch(';'),
        DK::Apostrophe => ch('\''),
        DK::Grave => ch('`'),
        DK::BackSlash => ch('\\'),
        DK::Comma => ch(','),
        DK::Dot => ch('.'),
        DK::Slash => ch('/'),
        DK::F1 => special(SpecialKey::F1),
        DK::F2 => special(SpecialKey::F2),
        DK::F3 => special(SpecialKey::F3),
        DK::F4 => special(SpecialKey::F4),
        DK::F5 => special(SpecialKey::F5),
        DK::F6 => special(SpecialKey::F6),
        DK::F7 => special(SpecialKey::F7),
        DK::F8 => special(SpecialKey::F8),
        DK::F9 => special(SpecialKey::F9),
        DK::F10 => special(SpecialKey::F10),
        DK::F11 => special(SpecialKey::F11),
        DK::F12 => special(SpecialKey::F12),
        DK::Space => special(SpecialKey::Space),
        DK::Enter => special(SpecialKey::Enter),
        DK::Tab => special(SpecialKey::Tab),
        DK::Escape => special(SpecialKey::Escape),
        DK::Backspace => special(SpecialKey::Backspace),
        DK::LShift | DK::RShift => special(SpecialKey::Shift),
        DK::LControl | DK::RControl => special(SpecialKey::Ctrl),
        DK::LAlt | DK::RAlt => special(SpecialKey::Alt),
        _ => None,
    }
}

/// Map a `MouseState::button_pressed` slot to a button
///
/// Slot 0 is unused. X11 reports middle as button 2 and has no side
/// buttons in its pointer mask.
#[cfg(target_os = "linux")]
pub fn mouse_button_at(slot: usize) -> Option<MouseButton> {
    match slot {
        1 => Some(MouseButton::Left),
        2 => Some(MouseButton::Middle),
        3 => Some(MouseButton::Right),
        _ => None,
    }
}

#[cfg(target_os = "windows")]
pub fn mouse_button_at(slot: usize) -> Option<MouseButton> {
    match slot {
        1 => Some(MouseButton::Left),
        2 => Some(MouseButton::Right),
        3 => Some(MouseButton::Middle),
        4 => Some(MouseButton::X1),
        5 => Some(MouseButton::X2),
        _ => None,
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub fn mouse_button_at(slot: usize) -> Option<MouseButton> {
    match slot {
        1 => Some(MouseButton::Left),
        2 => Some(MouseButton::Right),
        3 => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_lowercase_chars() {
        assert_eq!(from_keycode(DK::A), Some(InputIdentifier::Char('a')));
        assert_eq!(from_keycode(DK::Z), Some(InputIdentifier::Char('z')));
    }

    #[test]
    fn left_and_right_modifiers_collapse() {
        assert_eq!(from_keycode(DK::LShift), from_keycode(DK::RShift));
        assert_eq!(
            from_keycode(DK::RControl),
            Some(InputIdentifier::Special(SpecialKey::Ctrl))
        );
    }

    #[test]
    fn unmapped_keys_are_dropped() {
        assert_eq!(from_keycode(DK::Numpad5), None);
        assert_eq!(from_keycode(DK::Home), None);
    }

    #[test]
    fn mapped_keys_round_trip_through_display() {
        for code in [DK::Q, DK::Key4, DK::Slash, DK::F7, DK::Space, DK::LAlt] {
            let id = from_keycode(code).unwrap();
            let again = super::super::identifier::resolve_with(
                &id.display(),
                MouseButton::Left,
                super::super::InputCapabilities::full(),
            );
            assert_eq!(id, again);
        }
    }

    #[test]
    fn left_button_is_slot_one() {
        assert_eq!(mouse_button_at(1), Some(MouseButton::Left));
        assert_eq!(mouse_button_at(0), None);
    }
}
