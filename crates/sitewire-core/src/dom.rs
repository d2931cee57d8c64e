#![forbid(unsafe_code)]

//! The host document abstraction.
//!
//! [`Document`] is the only seam between the controllers and the rendering
//! engine. It supplies geometry, attribute and class access, focus, and the
//! few capability probes the controllers need. Mutating methods are
//! infallible: a host that can fail (a JS exception in the browser) logs and
//! carries on, so no controller ever has to handle a DOM error.
//!
//! # Element handles
//!
//! [`ElementId`] is a plain `Copy` handle minted by the host. Holding one
//! does not keep the element alive or attached. Callers that keep a handle
//! across events (focus restoration) must check [`Document::is_connected`]
//! before acting on it.

use crate::geometry::{Rect, ViewportMetrics};

/// Opaque, host-minted handle to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a raw host id.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host document: the DOM and layout engine as seen by the controllers.
pub trait Document {
    // --- Discovery ---

    /// First element in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    /// All elements in document order matching `selector`.
    fn query_selector_all(&self, selector: &str) -> Vec<ElementId>;

    /// Descendants of `root` (excluding `root`) matching `selector`.
    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId>;

    /// First descendant of `root` matching `selector`.
    fn query_first_within(&self, root: ElementId, selector: &str) -> Option<ElementId> {
        self.query_within(root, selector).into_iter().next()
    }

    /// The `<body>` element, if the document has one.
    fn body(&self) -> Option<ElementId>;

    /// Parent element, or `None` at the root or for detached elements.
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// All descendants of `root` in document order, excluding `root`.
    fn descendants(&self, root: ElementId) -> Vec<ElementId>;

    /// Whether `element` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut cursor = Some(element);
        while let Some(el) = cursor {
            if el == ancestor {
                return true;
            }
            cursor = self.parent(el);
        }
        false
    }

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementId) -> bool;

    /// Lower-case tag name.
    fn tag_name(&self, element: ElementId) -> String;

    // --- Attributes, classes, styles ---

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        self.attribute(element, name).is_some()
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Add (`force == true`) or remove the class.
    fn toggle_class(&mut self, element: ElementId, class: &str, force: bool);

    /// Set an inline style property on the element.
    fn set_style(&mut self, element: ElementId, property: &str, value: &str);

    /// Computed value of a custom property on the document element.
    fn custom_property(&self, name: &str) -> Option<String>;

    /// Set a custom property inline on the document element.
    fn set_custom_property(&mut self, name: &str, value: &str);

    // --- Geometry ---

    fn bounding_rect(&self, element: ElementId) -> Rect;

    fn client_width(&self, element: ElementId) -> f64;

    fn offset_height(&self, element: ElementId) -> f64;

    fn viewport(&self) -> ViewportMetrics;

    // --- Focus ---

    fn active_element(&self) -> Option<ElementId>;

    fn focus(&mut self, element: ElementId);

    // --- Capabilities ---

    /// Whether an `<img>` has already reached a terminal load state.
    fn image_complete(&self, element: ElementId) -> bool;

    /// Whether the host can deliver [`EventKind::ElementResize`](crate::EventKind::ElementResize).
    fn supports_resize_observer(&self) -> bool;

    /// Start delivering `ElementResize` events for `element`.
    fn observe_resize(&mut self, element: ElementId);
}
