#![forbid(unsafe_code)]

//! Header and navigation synchronizer.
//!
//! On every scroll or resize the header switches between its large and
//! compact heights, publishes the effective height through a custom
//! property, and the nav link for the section under the header is marked
//! active.
//!
//! # Active Section
//!
//! The *probe line* sits one pixel below the header. The current section is,
//! in order of preference:
//!
//! 1. the last section, when the viewport bottom is within tolerance of the
//!    document bottom;
//! 2. the first section whose rect straddles the probe (`top <= y < bottom`);
//! 3. the last section whose top is at or above the probe;
//! 4. the first section.
//!
//! [`resolve_active_section`] is the pure form of this rule.
//!
//! # Invariants
//!
//! 1. The effective height is exactly one of the two configured heights.
//! 2. Once at least one section exists, at most one nav link is active.
//! 3. Header sync runs before link activation within a frame, and both run
//!    at most once per animation frame.

use std::cell::Cell;
use std::rc::Rc;

use sitewire_core::css::{format_px, parse_px};
use sitewire_core::{
    ClassNames, CssVars, Document, ElementId, EventKind, HeaderDefaults, Rect, SiteConfig, Target,
    ViewportMetrics,
};
use sitewire_runtime::{EventBus, FrameThrottle, Subscription, WeakEventBus};

/// Inputs to the active-section rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeGeometry {
    /// Effective header height in pixels.
    pub header_height: f64,
    pub viewport: ViewportMetrics,
    /// Slack for the bottom-of-page check.
    pub bottom_tolerance: f64,
}

impl ProbeGeometry {
    /// Y coordinate of the probe line, relative to the viewport.
    #[inline]
    pub fn probe_y(&self) -> f64 {
        self.header_height + 1.0
    }
}

/// Index of the current section given viewport-relative section rects in
/// document order. `None` only when `sections` is empty.
pub fn resolve_active_section(geometry: &ProbeGeometry, sections: &[Rect]) -> Option<usize> {
    if sections.is_empty() {
        return None;
    }
    if geometry.viewport.at_bottom(geometry.bottom_tolerance) {
        return Some(sections.len() - 1);
    }
    let probe = geometry.probe_y();
    if let Some(index) = sections.iter().position(|r| r.straddles(probe)) {
        return Some(index);
    }
    Some(sections.iter().rposition(|r| r.top() <= probe).unwrap_or(0))
}

/// Header mode after a sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderState {
    pub compact: bool,
    pub effective_height: f64,
}

/// A content section and its fragment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub element: ElementId,
    pub id: String,
}

/// Header, sections, and nav links discovered at install time.
#[derive(Debug)]
pub struct HeaderNav {
    header: Option<ElementId>,
    sections: Vec<Section>,
    links: Vec<ElementId>,
    classes: ClassNames,
    vars: CssVars,
    defaults: HeaderDefaults,
    recomputes: Cell<u64>,
}

impl HeaderNav {
    /// Collect the header, sections, and nav links from the document.
    pub fn discover(doc: &dyn Document, config: &SiteConfig) -> Self {
        let selectors = &config.selectors;
        let header = doc.query_selector(&selectors.header);
        let sections = doc
            .query_selector_all(&selectors.sections)
            .into_iter()
            .map(|element| Section {
                element,
                id: doc.attribute(element, "id").unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        let links = doc.query_selector_all(&selectors.nav_links);

        tracing::debug!(
            header = header.is_some(),
            sections = sections.len(),
            links = links.len(),
            "discovered header nav"
        );
        Self {
            header,
            sections,
            links,
            classes: config.classes.clone(),
            vars: config.css_vars.clone(),
            defaults: config.header,
            recomputes: Cell::new(0),
        }
    }

    pub fn header(&self) -> Option<ElementId> {
        self.header
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn links(&self) -> &[ElementId] {
        &self.links
    }

    /// Number of throttled recomputations run so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes.get()
    }

    /// Toggle compact mode from the scroll offset and publish the effective
    /// header height. `None` when the page has no header.
    pub fn sync_header_state(&self, doc: &mut dyn Document) -> Option<HeaderState> {
        let header = self.header?;
        let compact = doc.viewport().scroll_y > 0.0;
        doc.toggle_class(header, &self.classes.compact, compact);

        let effective_height = if compact {
            css_px(&*doc, &self.vars.header_height_compact, self.defaults.compact)
        } else {
            css_px(&*doc, &self.vars.header_height_large, self.defaults.large)
        };
        doc.set_custom_property(&self.vars.header_height, &format_px(effective_height));
        Some(HeaderState {
            compact,
            effective_height,
        })
    }

    /// Mark the nav link of the current section active. Returns the index of
    /// the winning section, or `None` when there is nothing to do.
    pub fn update_active_link(&self, doc: &mut dyn Document) -> Option<usize> {
        let header = self.header?;
        if self.sections.is_empty() || self.links.is_empty() {
            return None;
        }

        let measured = doc.offset_height(header);
        let fallback = if measured > 0.0 {
            measured
        } else {
            self.defaults.measured
        };
        let geometry = ProbeGeometry {
            header_height: css_px(&*doc, &self.vars.header_height, fallback),
            viewport: doc.viewport(),
            bottom_tolerance: self.defaults.bottom_tolerance,
        };
        let rects = self
            .sections
            .iter()
            .map(|s| doc.bounding_rect(s.element))
            .collect::<Vec<_>>();

        let winner = resolve_active_section(&geometry, &rects)?;
        let id = self.sections[winner].id.clone();
        self.set_active(doc, &id);
        Some(winner)
    }

    /// Activate exactly the links whose `href` is `#<id>`.
    pub fn set_active(&self, doc: &mut dyn Document, id: &str) {
        let href = format!("#{id}");
        for &link in &self.links {
            let on = doc.attribute(link, "href").as_deref() == Some(href.as_str());
            doc.toggle_class(link, &self.classes.active, on);
        }
    }

    /// The first nav link currently carrying the active class.
    pub fn active_link(&self, doc: &dyn Document) -> Option<ElementId> {
        self.links
            .iter()
            .copied()
            .find(|&link| doc.has_class(link, &self.classes.active))
    }

    /// One throttled frame of work: header sync, then link activation.
    pub fn recompute(&self, doc: &mut dyn Document) {
        self.recomputes.set(self.recomputes.get() + 1);
        let state = self.sync_header_state(doc);
        let active = self.update_active_link(doc);
        tracing::trace!(?state, ?active, "header nav recomputed");
    }

    fn on_link_click(&self, doc: &mut dyn Document, link: ElementId) {
        let Some(href) = doc.attribute(link, "href") else {
            return;
        };
        let id = href.strip_prefix('#').unwrap_or(&href);
        if !id.is_empty() {
            self.set_active(doc, id);
        }
    }
}

fn css_px(doc: &dyn Document, name: &str, fallback: f64) -> f64 {
    doc.custom_property(name)
        .as_deref()
        .and_then(parse_px)
        .unwrap_or(fallback)
}

/// Installed header/nav synchronizer.
#[derive(Debug)]
pub struct HeaderNavController {
    nav: Rc<HeaderNav>,
    throttle: FrameThrottle,
    _subscriptions: Vec<Subscription>,
}

impl HeaderNavController {
    /// Discover the header nav, listen to window scroll/resize and nav link
    /// clicks, and schedule the initial recomputation.
    pub fn install(doc: &mut dyn Document, bus: &EventBus, config: &SiteConfig) -> Self {
        let nav = Rc::new(HeaderNav::discover(&*doc, config));
        let throttle = FrameThrottle::new();
        let mut subscriptions = Vec::with_capacity(2 + nav.links.len());

        for kind in [EventKind::Scroll, EventKind::Resize] {
            let nav = Rc::clone(&nav);
            let throttle = throttle.clone();
            let weak = bus.downgrade();
            subscriptions.push(bus.listen(Target::Window, kind, move |_, _| {
                schedule(&nav, &throttle, &weak);
            }));
        }

        for &link in &nav.links {
            let nav_ref = Rc::clone(&nav);
            subscriptions.push(bus.listen(
                Target::Element(link),
                EventKind::Click,
                move |doc, _| nav_ref.on_link_click(doc, link),
            ));
        }

        schedule(&nav, &throttle, &bus.downgrade());
        Self {
            nav,
            throttle,
            _subscriptions: subscriptions,
        }
    }

    pub fn nav(&self) -> &HeaderNav {
        &self.nav
    }

    pub fn throttle(&self) -> &FrameThrottle {
        &self.throttle
    }
}

fn schedule(nav: &Rc<HeaderNav>, throttle: &FrameThrottle, bus: &WeakEventBus) {
    let Some(bus) = bus.upgrade() else {
        return;
    };
    let nav = Rc::clone(nav);
    throttle.schedule(&bus, move |doc| nav.recompute(doc));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use sitewire_core::DomEvent;
    use sitewire_harness::{FakeDocument, fixtures};

    fn viewport(scroll_y: f64) -> ViewportMetrics {
        ViewportMetrics {
            scroll_y,
            inner_height: 800.0,
            scroll_height: 5000.0,
        }
    }

    fn geometry(header_height: f64) -> ProbeGeometry {
        ProbeGeometry {
            header_height,
            viewport: viewport(0.0),
            bottom_tolerance: 2.0,
        }
    }

    fn stacked(tops: &[(f64, f64)]) -> Vec<Rect> {
        tops.iter()
            .map(|&(top, h)| Rect::new(0.0, top, 100.0, h))
            .collect()
    }

    // --- Pure rule ---

    #[test]
    fn straddling_section_wins() {
        let rects = stacked(&[(-500.0, 400.0), (-100.0, 300.0), (200.0, 300.0)]);
        assert_eq!(resolve_active_section(&geometry(88.0), &rects), Some(1));
    }

    #[test]
    fn probe_is_one_pixel_below_header() {
        let rects = stacked(&[(0.0, 89.0), (89.0, 300.0)]);
        assert_eq!(resolve_active_section(&geometry(88.0), &rects), Some(1));
        let rects = stacked(&[(0.0, 90.0), (90.0, 300.0)]);
        assert_eq!(resolve_active_section(&geometry(88.0), &rects), Some(0));
    }

    #[test]
    fn gap_falls_back_to_last_above_probe() {
        let rects = stacked(&[(-400.0, 100.0), (-200.0, 100.0), (400.0, 100.0)]);
        assert_eq!(resolve_active_section(&geometry(88.0), &rects), Some(1));
    }

    #[test]
    fn all_below_probe_falls_back_to_first() {
        let rects = stacked(&[(300.0, 100.0), (400.0, 100.0)]);
        assert_eq!(resolve_active_section(&geometry(88.0), &rects), Some(0));
    }

    #[test]
    fn bottom_override_beats_geometry() {
        let rects = stacked(&[(0.0, 1000.0), (1000.0, 20.0)]);
        let mut g = geometry(88.0);
        g.viewport = ViewportMetrics {
            scroll_y: 4198.0,
            inner_height: 800.0,
            scroll_height: 5000.0,
        };
        assert_eq!(resolve_active_section(&g, &rects), Some(1));
        g.viewport.scroll_y = 4197.0;
        assert_eq!(resolve_active_section(&g, &rects), Some(0));
    }

    #[test]
    fn empty_sections_resolve_to_none() {
        assert_eq!(resolve_active_section(&geometry(88.0), &[]), None);
    }

    proptest! {
        #[test]
        fn resolved_index_is_in_range(
            heights in prop::collection::vec(1.0f64..2000.0, 1..12),
            offset in -20000.0f64..2000.0,
            header in 40.0f64..120.0,
            scroll_y in 0.0f64..10000.0,
        ) {
            let mut top = offset;
            let rects: Vec<Rect> = heights
                .iter()
                .map(|h| {
                    let r = Rect::new(0.0, top, 100.0, *h);
                    top += h;
                    r
                })
                .collect();
            let g = ProbeGeometry {
                header_height: header,
                viewport: viewport(scroll_y),
                bottom_tolerance: 2.0,
            };
            let index = resolve_active_section(&g, &rects).unwrap();
            prop_assert!(index < rects.len());
            if !g.viewport.at_bottom(2.0) && !rects[index].straddles(g.probe_y()) {
                prop_assert!(rects.iter().all(|r| !r.straddles(g.probe_y())));
            }
        }
    }

    // --- Against the harness ---

    fn stock() -> (FakeDocument, fixtures::PageParts, HeaderNav) {
        let mut doc = FakeDocument::new();
        let parts = fixtures::page(
            &mut doc,
            &[("intro", 700.0), ("work", 900.0), ("team", 900.0), ("contact", 300.0)],
        );
        let nav = HeaderNav::discover(&doc, &SiteConfig::default());
        (doc, parts, nav)
    }

    #[test]
    fn sync_toggles_compact_and_publishes_height() {
        let (mut doc, parts, nav) = stock();
        let state = nav.sync_header_state(&mut doc).unwrap();
        assert_eq!(
            state,
            HeaderState {
                compact: false,
                effective_height: 88.0
            }
        );
        assert_eq!(doc.inline_var("--header-h"), Some("88px"));
        assert!(!doc.has_class(parts.header, "is-compact"));

        doc.scroll_to(1.0);
        let state = nav.sync_header_state(&mut doc).unwrap();
        assert!(state.compact);
        assert_eq!(doc.inline_var("--header-h"), Some("56px"));
        assert!(doc.has_class(parts.header, "is-compact"));
    }

    #[test]
    fn malformed_height_vars_use_defaults() {
        let (mut doc, _, nav) = stock();
        doc.set_stylesheet_var("--header-h-large", "5rem");
        doc.set_stylesheet_var("--header-h-compact", "-3px");
        assert_eq!(nav.sync_header_state(&mut doc).unwrap().effective_height, 88.0);
        doc.scroll_to(10.0);
        assert_eq!(nav.sync_header_state(&mut doc).unwrap().effective_height, 56.0);
    }

    #[test]
    fn custom_heights_are_respected() {
        let (mut doc, _, nav) = stock();
        doc.set_stylesheet_var("--header-h-large", " 100.5px ");
        assert_eq!(nav.sync_header_state(&mut doc).unwrap().effective_height, 100.5);
        assert_eq!(doc.inline_var("--header-h"), Some("100.5px"));
    }

    #[test]
    fn sync_is_idempotent() {
        let (mut doc, parts, nav) = stock();
        doc.scroll_to(300.0);
        let first = nav.sync_header_state(&mut doc);
        let classes = doc.classes(parts.header).to_vec();
        let second = nav.sync_header_state(&mut doc);
        assert_eq!(first, second);
        assert_eq!(doc.classes(parts.header), classes.as_slice());
    }

    #[test]
    fn missing_header_is_noop() {
        let mut doc = FakeDocument::new();
        let nav = HeaderNav::discover(&doc, &SiteConfig::default());
        assert_eq!(nav.sync_header_state(&mut doc), None);
        assert_eq!(nav.update_active_link(&mut doc), None);
        assert_eq!(doc.custom_property_writes(), 0);
    }

    #[test]
    fn section_under_probe_is_active() {
        let (mut doc, parts, nav) = stock();
        nav.recompute(&mut doc);
        assert_eq!(nav.active_link(&doc), Some(parts.links[0]));

        // "work" spans document y 788..1688; scroll so it covers the probe.
        doc.scroll_to(1000.0);
        nav.recompute(&mut doc);
        assert_eq!(nav.active_link(&doc), Some(parts.links[1]));
        assert_eq!(doc.inline_var("--header-h"), Some("56px"));
    }

    #[test]
    fn bottom_of_page_activates_last_section() {
        let (mut doc, parts, nav) = stock();
        doc.scroll_to_bottom();
        nav.recompute(&mut doc);
        assert_eq!(nav.active_link(&doc), Some(parts.links[3]));
    }

    #[test]
    fn height_var_missing_falls_back_to_offset_height() {
        let (mut doc, parts, nav) = stock();
        // No --header-h yet: the header's 88px offset height is used.
        assert_eq!(nav.update_active_link(&mut doc), Some(0));
        // "work" top at 788 - 700 = 88, straddles the 89px probe.
        doc.scroll_to(700.0);
        assert_eq!(nav.update_active_link(&mut doc), Some(1));
        assert_eq!(nav.active_link(&doc), Some(parts.links[1]));
    }

    #[test]
    fn exactly_one_link_active() {
        let (mut doc, parts, nav) = stock();
        for y in [0.0, 350.0, 900.0, 1700.0, 2400.0, 10_000.0] {
            doc.scroll_to(y);
            nav.recompute(&mut doc);
            let active = parts
                .links
                .iter()
                .filter(|l| doc.has_class(**l, "is-active"))
                .count();
            assert_eq!(active, 1, "scroll_y = {y}");
        }
    }

    #[test]
    fn click_gives_immediate_feedback() {
        let (mut doc, parts, _) = stock();
        let bus = EventBus::new();
        let controller = HeaderNavController::install(&mut doc, &bus, &SiteConfig::default());
        bus.run_frame(&mut doc);
        assert_eq!(controller.nav().active_link(&doc), Some(parts.links[0]));

        bus.dispatch(&mut doc, &mut DomEvent::click(parts.links[2]));
        assert_eq!(controller.nav().active_link(&doc), Some(parts.links[2]));
        assert!(!bus.frame_pending());
    }

    #[test]
    fn empty_fragment_click_is_ignored() {
        let mut doc = FakeDocument::new();
        let parts = fixtures::page(&mut doc, &[("a", 500.0), ("b", 500.0)]);
        let top = doc.create(parts.nav, "a").attr("href", "#").done();
        let bus = EventBus::new();
        let controller = HeaderNavController::install(&mut doc, &bus, &SiteConfig::default());
        bus.run_frame(&mut doc);

        bus.dispatch(&mut doc, &mut DomEvent::click(top));
        assert_eq!(controller.nav().active_link(&doc), Some(parts.links[0]));
    }

    #[test]
    fn scroll_burst_coalesces_into_one_frame() {
        let (mut doc, _, _) = stock();
        let bus = EventBus::new();
        let controller = HeaderNavController::install(&mut doc, &bus, &SiteConfig::default());
        bus.run_frame(&mut doc);
        assert_eq!(controller.nav().recomputes(), 1);

        for i in 0..100 {
            doc.scroll_to(f64::from(i) * 10.0);
            bus.dispatch(&mut doc, &mut DomEvent::scroll());
        }
        assert_eq!(controller.nav().recomputes(), 1);
        bus.run_frame(&mut doc);
        assert_eq!(controller.nav().recomputes(), 2);
        assert_eq!(controller.throttle().scheduled(), 2);

        // The frame saw the final scroll position.
        assert_eq!(doc.inline_var("--header-h"), Some("56px"));
    }

    #[test]
    fn dropping_controller_detaches_listeners() {
        let (mut doc, _, _) = stock();
        let bus = EventBus::new();
        let controller = HeaderNavController::install(&mut doc, &bus, &SiteConfig::default());
        assert!(bus.listener_count() > 0);
        drop(controller);
        assert_eq!(bus.listener_count(), 0);
    }
}
