#![forbid(unsafe_code)]

//! [`Document`] over `web-sys`.
//!
//! Elements are interned in a slab the first time the controllers see them.
//! The slab index is written onto the JS element object under a per-instance
//! key, so looking up an element that has been seen before is one property
//! read. The slab holds each element through a `WeakRef`, so an element the
//! page has dropped can still be collected; its handle then resolves to
//! nothing and reads as disconnected. A handle stays bound to the same
//! element for as long as that element is alive, including across detach
//! and re-insertion.
//!
//! Every DOM call that can throw is logged at `warn` and otherwise ignored.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use js_sys::{Reflect, WeakRef};
use sitewire_core::{Document, ElementId, Rect, ViewportMetrics};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement, HtmlImageElement, NodeList, ResizeObserver, Window};

use crate::error::{WebError, describe_js};

static INSTANCES: AtomicU32 = AtomicU32::new(0);

/// The live page as a sitewire host document.
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    root: Element,
    slab: RefCell<Vec<WeakRef<Element>>>,
    tag_key: JsValue,
    observer: Option<ResizeObserver>,
}

impl WebDocument {
    /// Bind to the global window's document.
    pub fn new() -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        let document = window.document().ok_or(WebError::NoDocument)?;
        let root = document.document_element().ok_or(WebError::NoRootElement)?;
        let instance = INSTANCES.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            window,
            document,
            root,
            slab: RefCell::new(Vec::new()),
            tag_key: JsValue::from_str(&format!("__sitewire{instance}")),
            observer: None,
        })
    }

    /// Attach the observer that [`Document::observe_resize`] registers with.
    #[must_use]
    pub fn with_observer(mut self, observer: Option<ResizeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn dom(&self) -> &web_sys::Document {
        &self.document
    }

    /// Handle for `element`, interning it on first sight.
    pub fn id_of(&self, element: &Element) -> ElementId {
        let tagged = Reflect::get(element, &self.tag_key)
            .ok()
            .and_then(|value| value.as_f64());
        if let Some(raw) = tagged {
            return ElementId::from_raw(raw as u64);
        }
        let mut slab = self.slab.borrow_mut();
        let raw = slab.len() as u64;
        if let Err(err) = Reflect::set(element, &self.tag_key, &JsValue::from_f64(raw as f64)) {
            tracing::warn!(error = %describe_js(&err), "could not tag element");
        }
        slab.push(WeakRef::new(element));
        ElementId::from_raw(raw)
    }

    /// The element behind a handle minted by this document, while it is
    /// still alive.
    pub fn element(&self, id: ElementId) -> Option<Element> {
        let index = usize::try_from(id.raw()).ok()?;
        WeakRef::deref(self.slab.borrow().get(index)?)
    }

    /// Number of handles minted, including ones whose element is gone.
    pub fn interned(&self) -> usize {
        self.slab.borrow().len()
    }

    fn html(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn collect(&self, list: Result<NodeList, JsValue>, selector: &str) -> Vec<ElementId> {
        let list = match list {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(selector, error = %describe_js(&err), "selector rejected");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.id_of(&el))
            .collect()
    }

    fn warn_on_err(result: Result<(), JsValue>, what: &'static str) {
        if let Err(err) = result {
            tracing::warn!(error = %describe_js(&err), "{what} failed");
        }
    }
}

impl Drop for WebDocument {
    fn drop(&mut self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}

impl std::fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDocument")
            .field("interned", &self.interned())
            .field("resize_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Document for WebDocument {
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(|el| self.id_of(&el)),
            Err(err) => {
                tracing::warn!(selector, error = %describe_js(&err), "selector rejected");
                None
            }
        }
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        self.collect(self.document.query_selector_all(selector), selector)
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        match self.element(root) {
            Some(root) => self.collect(root.query_selector_all(selector), selector),
            None => Vec::new(),
        }
    }

    fn body(&self) -> Option<ElementId> {
        let body: Element = self.document.body()?.into();
        Some(self.id_of(&body))
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.element(element)?.parent_element()?;
        Some(self.id_of(&parent))
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        self.query_within(root, "*")
    }

    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        match (self.element(ancestor), self.element(element)) {
            (Some(ancestor), Some(element)) => ancestor.contains(Some(element.as_ref())),
            _ => false,
        }
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.element(element).is_some_and(|el| el.is_connected())
    }

    fn tag_name(&self, element: ElementId) -> String {
        self.element(element)
            .map(|el| el.tag_name().to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element)?.get_attribute(name)
    }

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        self.element(element).is_some_and(|el| el.has_attribute(name))
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(el) = self.element(element) {
            Self::warn_on_err(el.set_attribute(name, value), "setAttribute");
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn toggle_class(&mut self, element: ElementId, class: &str, force: bool) {
        if let Some(el) = self.element(element) {
            let result = el.class_list().toggle_with_force(class, force).map(drop);
            Self::warn_on_err(result, "classList.toggle");
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(el) = self.html(element) {
            Self::warn_on_err(el.style().set_property(property, value), "style.setProperty");
        }
    }

    fn custom_property(&self, name: &str) -> Option<String> {
        let style = self.window.get_computed_style(&self.root).ok().flatten()?;
        let value = style.get_property_value(name).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    }

    fn set_custom_property(&mut self, name: &str, value: &str) {
        if let Some(root) = self.root.dyn_ref::<HtmlElement>() {
            Self::warn_on_err(root.style().set_property(name, value), "style.setProperty");
        }
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        self.element(element).map_or_else(Rect::default, |el| {
            let r = el.get_bounding_client_rect();
            Rect::new(r.x(), r.y(), r.width(), r.height())
        })
    }

    fn client_width(&self, element: ElementId) -> f64 {
        self.element(element)
            .map_or(0.0, |el| f64::from(el.client_width()))
    }

    fn offset_height(&self, element: ElementId) -> f64 {
        self.html(element)
            .map_or(0.0, |el| f64::from(el.offset_height()))
    }

    fn viewport(&self) -> ViewportMetrics {
        ViewportMetrics {
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            inner_height: self
                .window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            scroll_height: f64::from(self.root.scroll_height()),
        }
    }

    fn active_element(&self) -> Option<ElementId> {
        let active = self.document.active_element()?;
        Some(self.id_of(&active))
    }

    fn focus(&mut self, element: ElementId) {
        if let Some(el) = self.html(element) {
            Self::warn_on_err(el.focus(), "focus");
        }
    }

    fn image_complete(&self, element: ElementId) -> bool {
        self.element(element).is_none_or(|el| {
            el.dyn_ref::<HtmlImageElement>()
                .is_none_or(HtmlImageElement::complete)
        })
    }

    fn supports_resize_observer(&self) -> bool {
        self.observer.is_some()
    }

    fn observe_resize(&mut self, element: ElementId) {
        if let (Some(observer), Some(el)) = (&self.observer, self.element(element)) {
            observer.observe(&el);
        }
    }
}
