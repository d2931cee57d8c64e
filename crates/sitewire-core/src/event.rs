#![forbid(unsafe_code)]

//! Host-agnostic event model.
//!
//! Browser events are normalized into [`DomEvent`] before they reach the
//! event bus. Only the event kinds the controllers react to are modelled.
//!
//! # Invariants
//!
//! 1. `DomEvent::key` is `Some` exactly for [`EventKind::KeyDown`].
//! 2. Once `prevent_default` has been called it cannot be undone for the
//!    lifetime of the event.

use bitflags::bitflags;

use crate::dom::ElementId;

/// Kind of event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Window scrolled.
    Scroll,
    /// Window resized.
    Resize,
    /// Primary-button click.
    Click,
    /// Key pressed.
    KeyDown,
    /// Image finished loading.
    Load,
    /// Image failed to load.
    Error,
    /// An observed element changed size (resize-observer callback).
    ElementResize,
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The top-level window (scroll, resize).
    Window,
    /// The document node.
    Document,
    /// A single element.
    Element(ElementId),
}

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Logical key, parsed from the DOM `KeyboardEvent.key` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCode {
    Tab,
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
    /// Any other named key, kept verbatim.
    Other(String),
}

impl KeyCode {
    /// Parse a DOM `key` value.
    ///
    /// ```
    /// use sitewire_core::KeyCode;
    /// assert_eq!(KeyCode::from_dom_key("Escape"), KeyCode::Escape);
    /// assert_eq!(KeyCode::from_dom_key("Esc"), KeyCode::Escape);
    /// assert_eq!(KeyCode::from_dom_key("a"), KeyCode::Char('a'));
    /// ```
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other(other.to_owned()),
                }
            }
        }
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Key press without modifiers.
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Builder-style modifier setter.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// A normalized event travelling through the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    kind: EventKind,
    target: Target,
    key: Option<KeyEvent>,
    default_prevented: bool,
}

impl DomEvent {
    fn new(kind: EventKind, target: Target) -> Self {
        Self {
            kind,
            target,
            key: None,
            default_prevented: false,
        }
    }

    pub fn scroll() -> Self {
        Self::new(EventKind::Scroll, Target::Window)
    }

    pub fn resize() -> Self {
        Self::new(EventKind::Resize, Target::Window)
    }

    pub fn click(target: ElementId) -> Self {
        Self::new(EventKind::Click, Target::Element(target))
    }

    /// Key press dispatched at `target`, or at the document when nothing is
    /// focused.
    pub fn key_down(target: Option<ElementId>, key: KeyEvent) -> Self {
        let target = target.map_or(Target::Document, Target::Element);
        Self {
            key: Some(key),
            ..Self::new(EventKind::KeyDown, target)
        }
    }

    pub fn load(image: ElementId) -> Self {
        Self::new(EventKind::Load, Target::Element(image))
    }

    pub fn error(image: ElementId) -> Self {
        Self::new(EventKind::Error, Target::Element(image))
    }

    pub fn element_resize(element: ElementId) -> Self {
        Self::new(EventKind::ElementResize, Target::Element(element))
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    /// The target element, if the event was dispatched at one.
    pub fn target_element(&self) -> Option<ElementId> {
        match self.target {
            Target::Element(el) => Some(el),
            Target::Window | Target::Document => None,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<&KeyEvent> {
        self.key.as_ref()
    }

    /// Suppress the host's default action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[inline]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}
