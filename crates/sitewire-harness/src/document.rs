#![forbid(unsafe_code)]

//! In-memory [`Document`] implementation.
//!
//! Layout is explicit: every element carries a rectangle in *document*
//! coordinates, and [`Document::bounding_rect`] converts it to viewport
//! coordinates by subtracting the scroll offset (fixed elements are not
//! shifted). Nothing is computed from CSS; tests place elements where they
//! want them.
//!
//! # Invariants
//!
//! 1. Element ids are never reused, even after [`FakeDocument::remove`].
//! 2. A removed subtree reports `is_connected == false`, a zero bounding
//!    rect, and never matches document-level queries.
//! 3. `active_element` falls back to `<body>` when nothing is focused, like
//!    `document.activeElement`.

use ahash::AHashMap;
use sitewire_core::{Document, ElementId, Rect, ViewportMetrics};

use crate::selector::SelectorList;

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    style: AHashMap<String, String>,
    layout: Rect,
    fixed: bool,
    client_width: Option<f64>,
    offset_height: Option<f64>,
    image_complete: bool,
}

/// In-memory document with explicit layout, focus tracking, and a mutation
/// log for assertions.
#[derive(Debug, Clone)]
pub struct FakeDocument {
    nodes: Vec<Node>,
    root: ElementId,
    body: ElementId,
    stylesheet_vars: AHashMap<String, String>,
    inline_vars: AHashMap<String, String>,
    scroll_y: f64,
    inner_height: f64,
    scroll_height: Option<f64>,
    active: Option<ElementId>,
    focus_log: Vec<ElementId>,
    resize_observer: bool,
    observed: Vec<ElementId>,
    custom_property_writes: usize,
    style_writes: usize,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    /// Document with `<html>` and `<body>` and an 1280x800 viewport.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: ElementId::from_raw(0),
            body: ElementId::from_raw(0),
            stylesheet_vars: AHashMap::default(),
            inline_vars: AHashMap::default(),
            scroll_y: 0.0,
            inner_height: 800.0,
            scroll_height: None,
            active: None,
            focus_log: Vec::new(),
            resize_observer: true,
            observed: Vec::new(),
            custom_property_writes: 0,
            style_writes: 0,
        };
        doc.nodes.push(Node {
            tag: "html".into(),
            ..Node::default()
        });
        doc.body = doc.append(doc.root, "body");
        doc
    }

    // --- Construction ---

    /// The `<html>` element.
    pub fn root_id(&self) -> ElementId {
        self.root
    }

    /// The `<body>` element.
    pub fn body_id(&self) -> ElementId {
        self.body
    }

    /// Append a bare element under `parent`.
    pub fn append(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let id = ElementId::from_raw(self.nodes.len() as u64);
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            ..Node::default()
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Append an element and configure it fluently.
    pub fn create(&mut self, parent: ElementId, tag: &str) -> ElementMut<'_> {
        let id = self.append(parent, tag);
        ElementMut { doc: self, id }
    }

    /// Configure an existing element fluently.
    pub fn edit(&mut self, id: ElementId) -> ElementMut<'_> {
        ElementMut { doc: self, id }
    }

    /// Detach `element` (and its subtree) from the document.
    pub fn remove(&mut self, element: ElementId) {
        let parent = self.node(element).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|c| *c != element);
        }
        if let Some(n) = self.node_mut(element) {
            n.parent = None;
        }
        if let Some(active) = self.active
            && self.contains(element, active)
        {
            self.active = None;
        }
    }

    // --- Layout and viewport ---

    pub fn set_layout(&mut self, element: ElementId, rect: Rect) {
        if let Some(n) = self.node_mut(element) {
            n.layout = rect;
        }
    }

    pub fn set_client_width(&mut self, element: ElementId, width: f64) {
        if let Some(n) = self.node_mut(element) {
            n.client_width = Some(width);
        }
    }

    pub fn set_image_complete(&mut self, element: ElementId, complete: bool) {
        if let Some(n) = self.node_mut(element) {
            n.image_complete = complete;
        }
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y;
    }

    pub fn set_inner_height(&mut self, height: f64) {
        self.inner_height = height;
    }

    /// Override the scrollable height; by default it is the lowest bottom
    /// edge of any in-flow element, or the viewport height if larger.
    pub fn set_scroll_height(&mut self, height: f64) {
        self.scroll_height = Some(height);
    }

    /// Scroll so the viewport bottom sits exactly on the document bottom.
    pub fn scroll_to_bottom(&mut self) {
        let max = self.viewport().scroll_height - self.inner_height;
        self.scroll_y = max.max(0.0);
    }

    /// Set a custom property as if declared in a stylesheet on `:root`.
    pub fn set_stylesheet_var(&mut self, name: &str, value: &str) {
        self.stylesheet_vars.insert(name.to_owned(), value.to_owned());
    }

    pub fn set_resize_observer(&mut self, supported: bool) {
        self.resize_observer = supported;
    }

    // --- Inspection ---

    /// Inline style value previously written with `set_style`.
    pub fn inline_style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.node(element)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    /// Custom property value written inline on the document element.
    pub fn inline_var(&self, name: &str) -> Option<&str> {
        self.inline_vars.get(name).map(String::as_str)
    }

    /// Class list of an element.
    pub fn classes(&self, element: ElementId) -> &[String] {
        self.node(element).map_or(&[], |n| n.classes.as_slice())
    }

    /// Every element focused so far, oldest first.
    pub fn focus_log(&self) -> &[ElementId] {
        &self.focus_log
    }

    /// Elements passed to `observe_resize`.
    pub fn observed(&self) -> &[ElementId] {
        &self.observed
    }

    /// Number of `set_custom_property` calls.
    pub fn custom_property_writes(&self) -> usize {
        self.custom_property_writes
    }

    /// Number of `set_style` calls.
    pub fn style_writes(&self) -> usize {
        self.style_writes
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.raw() as usize)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.raw() as usize)
    }

    fn subtree(&self, root: ElementId, out: &mut Vec<ElementId>) {
        if let Some(n) = self.node(root) {
            for &child in &n.children {
                out.push(child);
                self.subtree(child, out);
            }
        }
    }

    fn matching(&self, candidates: Vec<ElementId>, selector: &str) -> Vec<ElementId> {
        match SelectorList::parse(selector) {
            Ok(list) => candidates
                .into_iter()
                .filter(|el| list.matches(self, *el))
                .collect(),
            Err(err) => {
                tracing::warn!(%err, "selector rejected by fake document");
                Vec::new()
            }
        }
    }
}

impl Document for FakeDocument {
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let mut all = vec![self.root];
        self.subtree(self.root, &mut all);
        self.matching(all, selector)
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        self.matching(self.descendants(root), selector)
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.body)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).and_then(|n| n.parent)
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.subtree(root, &mut out);
        out
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.contains(self.root, element)
    }

    fn tag_name(&self, element: ElementId) -> String {
        self.node(element).map(|n| n.tag.clone()).unwrap_or_default()
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let node = self.node(element)?;
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_owned).collect();
            return;
        }
        match node.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => node.attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn toggle_class(&mut self, element: ElementId, class: &str, force: bool) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        let present = node.classes.iter().any(|c| c == class);
        if force && !present {
            node.classes.push(class.to_owned());
        } else if !force && present {
            node.classes.retain(|c| c != class);
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        self.style_writes += 1;
        if let Some(node) = self.node_mut(element) {
            node.style.insert(property.to_owned(), value.to_owned());
        }
    }

    fn custom_property(&self, name: &str) -> Option<String> {
        self.inline_vars
            .get(name)
            .or_else(|| self.stylesheet_vars.get(name))
            .cloned()
    }

    fn set_custom_property(&mut self, name: &str, value: &str) {
        self.custom_property_writes += 1;
        self.inline_vars.insert(name.to_owned(), value.to_owned());
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        if !self.is_connected(element) {
            return Rect::default();
        }
        match self.node(element) {
            Some(n) if n.fixed => n.layout,
            Some(n) => n.layout.translate(0.0, -self.scroll_y),
            None => Rect::default(),
        }
    }

    fn client_width(&self, element: ElementId) -> f64 {
        if !self.is_connected(element) {
            return 0.0;
        }
        self.node(element)
            .map_or(0.0, |n| n.client_width.unwrap_or(n.layout.width))
    }

    fn offset_height(&self, element: ElementId) -> f64 {
        if !self.is_connected(element) {
            return 0.0;
        }
        self.node(element)
            .map_or(0.0, |n| n.offset_height.unwrap_or(n.layout.height))
    }

    fn viewport(&self) -> ViewportMetrics {
        let scroll_height = self.scroll_height.unwrap_or_else(|| {
            self.nodes
                .iter()
                .filter(|n| !n.fixed)
                .map(|n| n.layout.bottom())
                .fold(self.inner_height, f64::max)
        });
        ViewportMetrics {
            scroll_y: self.scroll_y,
            inner_height: self.inner_height,
            scroll_height,
        }
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active.or(Some(self.body))
    }

    fn focus(&mut self, element: ElementId) {
        if self.is_connected(element) {
            self.active = Some(element);
            self.focus_log.push(element);
        }
    }

    fn image_complete(&self, element: ElementId) -> bool {
        self.node(element).is_some_and(|n| n.image_complete)
    }

    fn supports_resize_observer(&self) -> bool {
        self.resize_observer
    }

    fn observe_resize(&mut self, element: ElementId) {
        self.observed.push(element);
    }
}

/// Fluent element configuration returned by [`FakeDocument::create`].
#[must_use = "call `done()` to get the element id"]
pub struct ElementMut<'a> {
    doc: &'a mut FakeDocument,
    id: ElementId,
}

impl ElementMut<'_> {
    pub fn class(self, class: &str) -> Self {
        self.doc.toggle_class(self.id, class, true);
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.id, name, value);
        self
    }

    /// Set the `id` attribute.
    pub fn html_id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Rectangle in document coordinates.
    pub fn layout(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.doc.set_layout(self.id, Rect::new(x, y, width, height));
        self
    }

    /// Position relative to the viewport, unaffected by scrolling.
    pub fn fixed(self) -> Self {
        if let Some(n) = self.doc.node_mut(self.id) {
            n.fixed = true;
        }
        self
    }

    pub fn client_width(self, width: f64) -> Self {
        self.doc.set_client_width(self.id, width);
        self
    }

    pub fn offset_height(self, height: f64) -> Self {
        if let Some(n) = self.doc.node_mut(self.id) {
            n.offset_height = Some(height);
        }
        self
    }

    pub fn complete(self, complete: bool) -> Self {
        self.doc.set_image_complete(self.id, complete);
        self
    }

    pub fn done(self) -> ElementId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn body_is_connected_child_of_root() {
        let doc = FakeDocument::new();
        assert_eq!(doc.parent(doc.body_id()), Some(doc.root_id()));
        assert!(doc.is_connected(doc.body_id()));
        assert_eq!(doc.tag_name(doc.body_id()), "body");
    }

    #[test]
    fn bounding_rect_follows_scroll() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let header = doc.create(body, "header").layout(0.0, 0.0, 1280.0, 88.0).fixed().done();
        let section = doc.create(body, "section").layout(0.0, 500.0, 1280.0, 300.0).done();

        doc.scroll_to(200.0);
        assert_eq!(doc.bounding_rect(header).top(), 0.0);
        assert_eq!(doc.bounding_rect(section).top(), 300.0);
    }

    #[test]
    fn removal_detaches_subtree_and_blurs() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let wrap = doc.create(body, "div").done();
        let button = doc.create(wrap, "button").done();
        doc.focus(button);
        assert_eq!(doc.active_element(), Some(button));

        doc.remove(wrap);
        assert!(!doc.is_connected(button));
        assert_eq!(doc.active_element(), Some(body));
        assert_eq!(doc.bounding_rect(button), Rect::default());

        doc.focus(button);
        assert_eq!(doc.active_element(), Some(body));
    }

    #[test]
    fn queries_in_document_order() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let a = doc.create(body, "div").class("x").done();
        let inner = doc.create(a, "span").class("x").done();
        let b = doc.create(body, "div").class("x").done();
        assert_eq!(doc.query_selector_all(".x"), vec![a, inner, b]);
        assert_eq!(doc.query_within(a, ".x"), vec![inner]);
        assert_eq!(doc.query_selector(".x"), Some(a));
    }

    #[test]
    fn class_attribute_mirrors_class_list() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let el = doc.create(body, "div").class("a").class("b").done();
        assert_eq!(doc.attribute(el, "class").as_deref(), Some("a b"));
        doc.toggle_class(el, "a", false);
        doc.toggle_class(el, "b", true);
        assert_eq!(doc.classes(el), ["b".to_owned()]);
    }

    #[test]
    fn inline_var_shadows_stylesheet() {
        let mut doc = FakeDocument::new();
        doc.set_stylesheet_var("--header-h", "88px");
        assert_eq!(doc.custom_property("--header-h").as_deref(), Some("88px"));
        doc.set_custom_property("--header-h", "56px");
        assert_eq!(doc.custom_property("--header-h").as_deref(), Some("56px"));
        assert_eq!(doc.custom_property_writes(), 1);
    }

    #[test]
    fn scroll_height_defaults_to_content() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let _ = doc.create(body, "section").layout(0.0, 0.0, 100.0, 2400.0).done();
        assert_eq!(doc.viewport().scroll_height, 2400.0);
        doc.scroll_to_bottom();
        assert_eq!(doc.viewport().scroll_y, 1600.0);
        assert!(doc.viewport().at_bottom(0.0));
    }

    #[test]
    fn viewport_overrides_replace_defaults() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let _ = doc.create(body, "section").layout(0.0, 0.0, 100.0, 900.0).done();
        doc.set_inner_height(600.0);
        doc.set_scroll_height(3000.0);
        doc.scroll_to_bottom();

        let viewport = doc.viewport();
        assert_eq!(viewport.inner_height, 600.0);
        assert_eq!(viewport.scroll_height, 3000.0);
        assert_eq!(viewport.scroll_y, 2400.0);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = FakeDocument::new();
        assert!(doc.query_selector_all("div >").is_empty());
    }
}
