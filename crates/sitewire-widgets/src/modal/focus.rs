#![forbid(unsafe_code)]

//! Focus policy for dialogs: which elements are focusable, where Tab goes
//! at the edges, and how focus returns to the element that was focused
//! before a dialog opened.
//!
//! # Invariants
//!
//! 1. The focusable list is recomputed on every call; nothing is cached
//!    between keystrokes.
//! 2. [`trap_tab`] only redirects at the edges. Tab inside the list is left
//!    to the host's default order.
//! 3. [`FocusReturn`] never keeps an element alive and never focuses an
//!    element that has left the document.

use sitewire_core::{Document, ElementId};

/// Candidates for keyboard focus inside a dialog.
pub const FOCUSABLE_SELECTOR: &str =
    "a[href], button:not([disabled]), textarea, input, select, [tabindex]:not([tabindex=\"-1\"])";

/// Focusable descendants of `root` in document order.
///
/// Elements carrying `disabled`, or an `aria-hidden` attribute with a
/// non-empty value, are excluded.
pub fn focusable_elements(doc: &dyn Document, root: ElementId) -> Vec<ElementId> {
    doc.query_within(root, FOCUSABLE_SELECTOR)
        .into_iter()
        .filter(|&el| {
            !doc.has_attribute(el, "disabled")
                && doc.attribute(el, "aria-hidden").is_none_or(|v| v.is_empty())
        })
        .collect()
}

/// Where Tab should move focus instead of the default, if anywhere.
///
/// Tab on the last focusable wraps to the first; Shift+Tab on the first
/// wraps to the last. Returns `None` when the list is empty or focus is not
/// at the relevant edge.
pub fn trap_tab(
    focusables: &[ElementId],
    active: Option<ElementId>,
    shift: bool,
) -> Option<ElementId> {
    let (first, last) = (*focusables.first()?, *focusables.last()?);
    match (shift, active) {
        (true, Some(a)) if a == first => Some(last),
        (false, Some(a)) if a == last => Some(first),
        _ => None,
    }
}

/// Non-owning record of the element to refocus when a dialog closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusReturn {
    target: Option<ElementId>,
}

impl FocusReturn {
    /// Remember the currently focused element.
    pub fn record(doc: &dyn Document) -> Self {
        Self {
            target: doc.active_element(),
        }
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// Focus the recorded element if it is still inside `<body>`.
    ///
    /// Returns whether focus was moved. A missing or detached target is
    /// skipped silently.
    pub fn restore(self, doc: &mut dyn Document) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let attached = doc.body().is_some_and(|body| doc.contains(body, target));
        if attached {
            doc.focus(target);
        } else {
            tracing::debug!(target = target.raw(), "focus target detached; not restoring");
        }
        attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitewire_harness::FakeDocument;

    fn ids(raw: &[u64]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId::from_raw).collect()
    }

    #[test]
    fn trap_wraps_at_edges_only() {
        let list = ids(&[10, 11, 12]);
        assert_eq!(trap_tab(&list, Some(list[2]), false), Some(list[0]));
        assert_eq!(trap_tab(&list, Some(list[0]), true), Some(list[2]));
        assert_eq!(trap_tab(&list, Some(list[0]), false), None);
        assert_eq!(trap_tab(&list, Some(list[1]), false), None);
        assert_eq!(trap_tab(&list, Some(list[1]), true), None);
        assert_eq!(trap_tab(&list, Some(list[2]), true), None);
    }

    #[test]
    fn trap_with_focus_outside_list_does_nothing() {
        let list = ids(&[10, 11, 12]);
        assert_eq!(trap_tab(&list, Some(ElementId::from_raw(99)), false), None);
        assert_eq!(trap_tab(&list, None, true), None);
    }

    #[test]
    fn empty_list_never_traps() {
        assert_eq!(trap_tab(&[], Some(ElementId::from_raw(1)), false), None);
    }

    #[test]
    fn single_focusable_wraps_to_itself() {
        let list = ids(&[5]);
        assert_eq!(trap_tab(&list, Some(list[0]), false), Some(list[0]));
        assert_eq!(trap_tab(&list, Some(list[0]), true), Some(list[0]));
    }

    #[test]
    fn focusable_policy() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let root = doc.create(body, "div").done();
        let link = doc.create(root, "a").attr("href", "/x").done();
        let _bare_link = doc.create(root, "a").done();
        let button = doc.create(root, "button").done();
        let _disabled = doc.create(root, "button").attr("disabled", "").done();
        let _disabled_input = doc.create(root, "input").attr("disabled", "").done();
        let _hidden = doc.create(root, "input").attr("aria-hidden", "true").done();
        let blank_hidden = doc.create(root, "textarea").attr("aria-hidden", "").done();
        let select = doc.create(root, "select").done();
        let tabbable = doc.create(root, "div").attr("tabindex", "0").done();
        let _untabbable = doc.create(root, "div").attr("tabindex", "-1").done();

        assert_eq!(
            focusable_elements(&doc, root),
            vec![link, button, blank_hidden, select, tabbable]
        );
    }

    #[test]
    fn restore_focuses_attached_target() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let opener = doc.create(body, "button").done();
        doc.focus(opener);
        let ret = FocusReturn::record(&doc);
        let other = doc.create(body, "input").done();
        doc.focus(other);

        assert!(ret.restore(&mut doc));
        assert_eq!(doc.active_element(), Some(opener));
    }

    #[test]
    fn restore_skips_detached_target() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let opener = doc.create(body, "button").done();
        doc.focus(opener);
        let ret = FocusReturn::record(&doc);
        doc.remove(opener);

        assert!(!ret.restore(&mut doc));
        assert_eq!(doc.active_element(), Some(body));
    }

    #[test]
    fn restore_without_target_is_noop() {
        let mut doc = FakeDocument::new();
        assert!(!FocusReturn::default().restore(&mut doc));
        assert!(doc.focus_log().is_empty());
    }
}
