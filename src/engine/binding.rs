//! Hotkey and output bindings

use crate::input::InputIdentifier;

/// Which of the two live bindings a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSlot {
    /// Starts, stops or toggles emission
    Hotkey,
    /// What gets emitted
    Output,
}

impl BindingSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hotkey => "hotkey",
            Self::Output => "output",
        }
    }
}

/// An input bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slot: BindingSlot,
    pub input: InputIdentifier,
}

impl Binding {
    pub fn hotkey(input: InputIdentifier) -> Self {
        Self {
            slot: BindingSlot::Hotkey,
            input,
        }
    }

    pub fn output(input: InputIdentifier) -> Self {
        Self {
            slot: BindingSlot::Output,
            input,
        }
    }

    pub fn display(&self) -> String {
        self.input.display()
    }
}

/// The current hotkey and output bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingStore {
    hotkey: InputIdentifier,
    output: InputIdentifier,
}

impl BindingStore {
    pub fn new(hotkey: InputIdentifier, output: InputIdentifier) -> Self {
        Self { hotkey, output }
    }

    /// Replace the binding in `binding.slot`, returning the previous input
    pub fn set(&mut self, binding: Binding) -> InputIdentifier {
        let target = match binding.slot {
            BindingSlot::Hotkey => &mut self.hotkey,
            BindingSlot::Output => &mut self.output,
        };
        std::mem::replace(target, binding.input)
    }

    pub fn get(&self) -> (Binding, Binding) {
        (Binding::hotkey(self.hotkey), Binding::output(self.output))
    }

    pub fn hotkey(&self) -> InputIdentifier {
        self.hotkey
    }

    pub fn output(&self) -> InputIdentifier {
        self.output
    }

    /// Hotkey and output are the same keyboard key
    ///
    /// Emitting the hotkey would feed back into the trigger. Advisory only.
    pub fn self_trigger_risk(&self) -> bool {
        self.hotkey == self.output && self.hotkey.kind().is_keyboard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, SpecialKey};

    #[test]
    fn set_replaces_only_its_slot() {
        let mut store = BindingStore::new(
            InputIdentifier::Special(SpecialKey::F1),
            InputIdentifier::Char('f'),
        );
        let prev = store.set(Binding::output(InputIdentifier::Mouse(MouseButton::Left)));
        assert_eq!(prev, InputIdentifier::Char('f'));
        assert_eq!(store.hotkey(), InputIdentifier::Special(SpecialKey::F1));
        assert_eq!(store.output(), InputIdentifier::Mouse(MouseButton::Left));

        let (hotkey, output) = store.get();
        assert_eq!(hotkey.slot, BindingSlot::Hotkey);
        assert_eq!(output.display(), "MOUSE_LEFT");
    }

    #[test]
    fn self_trigger_risk_for_same_keyboard_key() {
        let store = BindingStore::new(InputIdentifier::Char('q'), InputIdentifier::Char('q'));
        assert!(store.self_trigger_risk());

        let store = BindingStore::new(
            InputIdentifier::Special(SpecialKey::Space),
            InputIdentifier::Special(SpecialKey::Space),
        );
        assert!(store.self_trigger_risk());
    }

    #[test]
    fn no_self_trigger_risk_for_mouse_or_distinct_keys() {
        let left = InputIdentifier::Mouse(MouseButton::Left);
        assert!(!BindingStore::new(left, left).self_trigger_risk());
        assert!(
            !BindingStore::new(InputIdentifier::Char('q'), InputIdentifier::Char('e'))
                .self_trigger_risk()
        );
    }
}
