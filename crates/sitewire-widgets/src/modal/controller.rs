#![forbid(unsafe_code)]

//! Page-wide modal controller.
//!
//! One [`ModalController`] owns the registry of dialogs found at install time
//! and every listener that drives them:
//!
//! - each opener's click opens the dialog its target attribute selects;
//! - a document-level click closes the enclosing open dialog when the click
//!   landed on a close control or the backdrop;
//! - a document-level Escape closes the first open dialog in document order;
//! - each open dialog carries its own keydown trap for Tab.
//!
//! A dialog whose markup already says `aria-hidden="false"` is registered as
//! open, with its trap installed and nothing to restore focus to.
//!
//! # Invariants
//!
//! 1. Only registered dialogs are ever opened or closed.
//! 2. A dialog has a trap subscription exactly while it is open.
//! 3. The restoration target is recorded once per open and consumed by the
//!    matching close.
//!
//! # Failure Modes
//!
//! - Opener selector that matches nothing, or matches an element outside
//!   the registry: the click does nothing.
//! - Restoration target removed from the document while the dialog was
//!   open: focus is left where it is.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sitewire_core::{ClassNames, Document, DomEvent, ElementId, EventKind, KeyCode, SiteConfig, Target};
use sitewire_runtime::{EventBus, Subscription, WeakEventBus};

use super::focus::{FocusReturn, focusable_elements, trap_tab};

struct DialogEntry {
    element: ElementId,
    open: bool,
    restore: FocusReturn,
    trap: Option<Subscription>,
}

struct Registry {
    dialogs: RefCell<Vec<DialogEntry>>,
    classes: ClassNames,
    bus: WeakEventBus,
}

impl Registry {
    fn is_registered(&self, element: ElementId) -> bool {
        self.dialogs.borrow().iter().any(|d| d.element == element)
    }

    fn is_open(&self, dialog: ElementId) -> bool {
        self.dialogs
            .borrow()
            .iter()
            .any(|d| d.element == dialog && d.open)
    }

    /// Nearest registered dialog that is `element` or one of its ancestors.
    fn dialog_containing(&self, doc: &dyn Document, element: ElementId) -> Option<ElementId> {
        let mut cursor = Some(element);
        while let Some(el) = cursor {
            if self.is_registered(el) {
                return Some(el);
            }
            cursor = doc.parent(el);
        }
        None
    }

    fn open(&self, doc: &mut dyn Document, dialog: ElementId) -> bool {
        let mut dialogs = self.dialogs.borrow_mut();
        let Some(entry) = dialogs.iter_mut().find(|d| d.element == dialog) else {
            tracing::debug!(dialog = dialog.raw(), "open ignored: not a registered dialog");
            return false;
        };
        if entry.open {
            return false;
        }

        entry.open = true;
        entry.restore = FocusReturn::record(&*doc);
        doc.set_attribute(dialog, "aria-hidden", "false");
        if let Some(body) = doc.body() {
            doc.toggle_class(body, &self.classes.modal_open_body, true);
        }
        let initial = focusable_elements(&*doc, dialog)
            .first()
            .copied()
            .unwrap_or(dialog);
        doc.focus(initial);

        entry.trap = self.bus.upgrade().map(|bus| install_trap(&bus, dialog));
        tracing::debug!(dialog = dialog.raw(), focused = initial.raw(), "dialog opened");
        true
    }

    fn close(&self, doc: &mut dyn Document, dialog: ElementId) -> bool {
        let (trap, restore) = {
            let mut dialogs = self.dialogs.borrow_mut();
            let Some(entry) = dialogs.iter_mut().find(|d| d.element == dialog && d.open) else {
                return false;
            };
            entry.open = false;
            (entry.trap.take(), std::mem::take(&mut entry.restore))
        };

        doc.set_attribute(dialog, "aria-hidden", "true");
        if let Some(body) = doc.body() {
            doc.toggle_class(body, &self.classes.modal_open_body, false);
        }
        drop(trap);
        let restored = restore.restore(doc);
        tracing::debug!(dialog = dialog.raw(), restored, "dialog closed");
        true
    }

    fn first_open(&self) -> Option<ElementId> {
        self.dialogs
            .borrow()
            .iter()
            .find(|d| d.open)
            .map(|d| d.element)
    }

    fn on_opener_click(&self, doc: &mut dyn Document, opener: ElementId) {
        let Some(selector) = doc.attribute(opener, &self.classes.modal_target_attr) else {
            return;
        };
        if let Some(dialog) = doc.query_selector(&selector) {
            self.open(doc, dialog);
        }
    }

    fn on_document_click(&self, doc: &mut dyn Document, target: ElementId) -> bool {
        let Some(dialog) = self.dialog_containing(&*doc, target) else {
            return false;
        };
        let dismiss = doc.has_attribute(target, &self.classes.modal_close_attr)
            || doc.has_class(target, &self.classes.modal_backdrop);
        dismiss && self.close(doc, dialog)
    }
}

fn install_trap(bus: &EventBus, dialog: ElementId) -> Subscription {
    bus.listen(Target::Element(dialog), EventKind::KeyDown, move |doc, ev| {
        on_trap_key(doc, ev, dialog)
    })
}

fn on_trap_key(doc: &mut dyn Document, ev: &mut DomEvent, dialog: ElementId) {
    let shift = match ev.key() {
        Some(key) if key.code == KeyCode::Tab => key.shift(),
        _ => return,
    };
    let focusables = focusable_elements(&*doc, dialog);
    if let Some(target) = trap_tab(&focusables, doc.active_element(), shift) {
        ev.prevent_default();
        doc.focus(target);
    }
}

/// The page's dialogs and the listeners that open and close them.
pub struct ModalController {
    registry: Rc<Registry>,
    openers: Vec<ElementId>,
    _subscriptions: Vec<Subscription>,
}

impl fmt::Debug for ModalController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalController")
            .field("dialogs", &self.dialogs())
            .field("open", &self.open_dialogs())
            .field("openers", &self.openers)
            .finish()
    }
}

impl ModalController {
    /// Register every dialog and wire the openers.
    ///
    /// Returns `None`, installing nothing, when the page has no openers.
    pub fn install(doc: &mut dyn Document, bus: &EventBus, config: &SiteConfig) -> Option<Self> {
        let openers = doc.query_selector_all(&config.selectors.modal_openers);
        if openers.is_empty() {
            tracing::debug!("no modal openers; modal controller not installed");
            return None;
        }
        let dialogs = doc
            .query_selector_all(&config.selectors.modal)
            .into_iter()
            .map(|element| {
                // Markup may ship a dialog already shown; it has no
                // restoration target but is trapped and dismissable.
                let open = doc.attribute(element, "aria-hidden").as_deref() == Some("false");
                DialogEntry {
                    element,
                    open,
                    restore: FocusReturn::default(),
                    trap: open.then(|| install_trap(bus, element)),
                }
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            dialogs = dialogs.len(),
            openers = openers.len(),
            "modal controller installed"
        );

        let registry = Rc::new(Registry {
            dialogs: RefCell::new(dialogs),
            classes: config.classes.clone(),
            bus: bus.downgrade(),
        });

        let mut subscriptions = Vec::with_capacity(openers.len() + 2);
        for &opener in &openers {
            let r = Rc::clone(&registry);
            subscriptions.push(bus.listen(
                Target::Element(opener),
                EventKind::Click,
                move |doc, _| r.on_opener_click(doc, opener),
            ));
        }

        let r = Rc::clone(&registry);
        subscriptions.push(bus.listen(Target::Document, EventKind::Click, move |doc, ev| {
            if let Some(target) = ev.target_element() {
                r.on_document_click(doc, target);
            }
        }));

        let r = Rc::clone(&registry);
        subscriptions.push(bus.listen(Target::Document, EventKind::KeyDown, move |doc, ev| {
            if ev.key().is_some_and(|k| k.code == KeyCode::Escape)
                && let Some(dialog) = r.first_open()
            {
                r.close(doc, dialog);
            }
        }));

        Some(Self {
            registry,
            openers,
            _subscriptions: subscriptions,
        })
    }

    /// Registered dialogs in document order.
    pub fn dialogs(&self) -> Vec<ElementId> {
        self.registry
            .dialogs
            .borrow()
            .iter()
            .map(|d| d.element)
            .collect()
    }

    pub fn openers(&self) -> &[ElementId] {
        &self.openers
    }

    pub fn is_open(&self, dialog: ElementId) -> bool {
        self.registry.is_open(dialog)
    }

    pub fn open_dialogs(&self) -> Vec<ElementId> {
        self.registry
            .dialogs
            .borrow()
            .iter()
            .filter(|d| d.open)
            .map(|d| d.element)
            .collect()
    }

    /// Registered dialog enclosing `element`, if any.
    pub fn dialog_containing(&self, doc: &dyn Document, element: ElementId) -> Option<ElementId> {
        self.registry.dialog_containing(doc, element)
    }

    /// Open a registered, closed dialog. Returns whether it opened.
    pub fn open(&self, doc: &mut dyn Document, dialog: ElementId) -> bool {
        self.registry.open(doc, dialog)
    }

    /// Close an open dialog. Returns whether it closed.
    pub fn close(&self, doc: &mut dyn Document, dialog: ElementId) -> bool {
        self.registry.close(doc, dialog)
    }

    /// Close the first open dialog in document order.
    pub fn close_first_open(&self, doc: &mut dyn Document) -> Option<ElementId> {
        let dialog = self.registry.first_open()?;
        self.registry.close(doc, dialog).then_some(dialog)
    }
}
