#![forbid(unsafe_code)]

//! Translation of `KeyboardEvent` fields into the core key model.

use sitewire_core::{KeyCode, KeyEvent, Modifiers};

/// Build a [`KeyEvent`] from the `key` string and modifier flags of a DOM
/// `KeyboardEvent`.
pub fn key_event(key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> KeyEvent {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, shift);
    modifiers.set(Modifiers::CTRL, ctrl);
    modifiers.set(Modifiers::ALT, alt);
    modifiers.set(Modifiers::META, meta);
    KeyEvent::new(KeyCode::from_dom_key(key)).with_modifiers(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shift_tab_keeps_shift() {
        let ev = key_event("Tab", true, false, false, false);
        assert_eq!(ev.code, KeyCode::Tab);
        assert!(ev.shift());
        assert_eq!(ev.modifiers, Modifiers::SHIFT);
    }

    #[test]
    fn legacy_names_normalize() {
        assert_eq!(key_event("Esc", false, false, false, false).code, KeyCode::Escape);
        assert_eq!(key_event("Right", false, false, false, false).code, KeyCode::ArrowRight);
    }

    #[test]
    fn all_modifiers_are_carried() {
        let ev = key_event("Unidentified", true, true, true, true);
        assert_eq!(ev.modifiers, Modifiers::all());
        assert_eq!(ev.code, KeyCode::Other("Unidentified".into()));
    }
}
