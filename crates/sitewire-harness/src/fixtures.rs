#![forbid(unsafe_code)]

//! Builders for the stock page markup.
//!
//! Each builder appends to an existing [`FakeDocument`] and returns the ids
//! of the parts a test usually wants to poke at. Layout mirrors the stock
//! stylesheet: a fixed 88px header, sections stacked under it, carousels
//! sized by their viewport.

use sitewire_core::ElementId;

use crate::FakeDocument;

/// Page width used by every fixture.
pub const PAGE_WIDTH: f64 = 1280.0;

/// Header height in the stock stylesheet (`--header-h-large`).
pub const HEADER_LARGE: f64 = 88.0;

/// Compact header height in the stock stylesheet (`--header-h-compact`).
pub const HEADER_COMPACT: f64 = 56.0;

#[derive(Debug, Clone)]
pub struct PageParts {
    pub header: ElementId,
    pub nav: ElementId,
    pub main: ElementId,
    /// Sections in document order.
    pub sections: Vec<ElementId>,
    /// Nav links, one per section, same order.
    pub links: Vec<ElementId>,
}

/// Header with one nav link per section, then `<main>` with the sections
/// stacked from `y = 88`.
///
/// `sections` is a list of `(id, height)`.
pub fn page(doc: &mut FakeDocument, sections: &[(&str, f64)]) -> PageParts {
    doc.set_stylesheet_var("--header-h-large", "88px");
    doc.set_stylesheet_var("--header-h-compact", "56px");

    let body = doc.body_id();
    let header = doc
        .create(body, "header")
        .class("site-header")
        .layout(0.0, 0.0, PAGE_WIDTH, HEADER_LARGE)
        .fixed()
        .done();
    let nav = doc.create(header, "nav").class("site-nav").done();
    let links = sections
        .iter()
        .map(|(id, _)| {
            doc.create(nav, "a")
                .attr("href", &format!("#{id}"))
                .done()
        })
        .collect();

    let total: f64 = sections.iter().map(|(_, h)| h).sum();
    let main = doc
        .create(body, "main")
        .layout(0.0, HEADER_LARGE, PAGE_WIDTH, total)
        .done();
    let mut y = HEADER_LARGE;
    let sections = sections
        .iter()
        .map(|(id, height)| {
            let el = doc
                .create(main, "section")
                .class("stripe")
                .html_id(id)
                .layout(0.0, y, PAGE_WIDTH, *height)
                .done();
            y += height;
            el
        })
        .collect();

    PageParts {
        header,
        nav,
        main,
        sections,
        links,
    }
}

#[derive(Debug, Clone)]
pub struct CarouselParts {
    pub root: ElementId,
    pub viewport: ElementId,
    pub track: ElementId,
    pub slides: Vec<ElementId>,
    pub prev: ElementId,
    pub next: ElementId,
}

/// A `.carousel` with prev/next buttons, a viewport `width` pixels wide,
/// and `slides` slides in the track.
pub fn carousel(
    doc: &mut FakeDocument,
    parent: ElementId,
    slides: usize,
    width: f64,
) -> CarouselParts {
    let root = doc
        .create(parent, "div")
        .class("carousel")
        .layout(0.0, 0.0, width, 320.0)
        .done();
    let prev = doc.create(root, "button").class("caro-prev").done();
    let viewport = doc
        .create(root, "div")
        .class("caro-viewport")
        .layout(0.0, 0.0, width, 320.0)
        .done();
    let track = doc.create(viewport, "div").class("caro-track").done();
    let slides = (0..slides)
        .map(|_| doc.create(track, "div").class("caro-slide").done())
        .collect();
    let next = doc.create(root, "button").class("caro-next").done();

    CarouselParts {
        root,
        viewport,
        track,
        slides,
        prev,
        next,
    }
}

#[derive(Debug, Clone)]
pub struct DialogParts {
    pub opener: ElementId,
    pub dialog: ElementId,
    pub backdrop: ElementId,
    pub panel: ElementId,
    pub close: ElementId,
    /// Focusable descendants in document order, starting with `close`.
    pub focusables: Vec<ElementId>,
}

/// An opener button followed by a closed `.modal#<id>` holding a backdrop,
/// a close button, and `fields` text inputs.
pub fn dialog(doc: &mut FakeDocument, parent: ElementId, id: &str, fields: usize) -> DialogParts {
    let opener = doc
        .create(parent, "button")
        .class("open-modal")
        .attr("data-modal-target", &format!("#{id}"))
        .done();
    let dialog = doc
        .create(parent, "div")
        .class("modal")
        .html_id(id)
        .attr("aria-hidden", "true")
        .done();
    let backdrop = doc
        .create(dialog, "div")
        .class("modal__backdrop")
        .done();
    let panel = doc
        .create(dialog, "div")
        .class("modal__panel")
        .attr("role", "dialog")
        .done();
    let close = doc
        .create(panel, "button")
        .attr("data-modal-close", "")
        .done();
    let mut focusables = vec![close];
    focusables.extend((0..fields).map(|_| doc.create(panel, "input").done()));

    DialogParts {
        opener,
        dialog,
        backdrop,
        panel,
        close,
        focusables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitewire_core::Document;

    #[test]
    fn page_matches_stock_selectors() {
        let mut doc = FakeDocument::new();
        let parts = page(&mut doc, &[("intro", 600.0), ("work", 900.0)]);
        assert_eq!(doc.query_selector(".site-header"), Some(parts.header));
        assert_eq!(doc.query_selector_all("main .stripe[id]"), parts.sections);
        assert_eq!(doc.query_selector_all(".site-nav a[href^=\"#\"]"), parts.links);
        assert_eq!(doc.bounding_rect(parts.sections[1]).top(), 688.0);
    }

    #[test]
    fn dialog_focusables_in_order() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let parts = dialog(&mut doc, body, "contact", 2);
        assert_eq!(parts.focusables.len(), 3);
        assert_eq!(
            doc.query_within(parts.dialog, "button, input"),
            parts.focusables
        );
        assert_eq!(
            doc.query_selector(".open-modal[data-modal-target]"),
            Some(parts.opener)
        );
    }
}
