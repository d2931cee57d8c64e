#![forbid(unsafe_code)]

//! Width-tracking slide carousel.
//!
//! A carousel is a root holding a *viewport* (the visible window) and a
//! *track* (the strip of slides). Every slide is exactly one viewport wide,
//! so showing slide `i` means translating the track by `-i * width`.
//!
//! The width is not known until layout has happened, and it changes when
//! the viewport resizes or images inside it load. [`CarouselState`] treats a
//! zero width as "not measured yet" and refuses to move until a measurement
//! succeeds.
//!
//! # Invariants
//!
//! 1. `index < count` at all times; moves wrap in both directions.
//! 2. `count >= MIN_SLIDES`; smaller carousels are never installed.
//! 3. The index only changes through `go_to`; measuring keeps the index and
//!    only repositions the track.
//! 4. Each image inside the root settles at most once, and the re-measure
//!    after the last one fires exactly once.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use sitewire_core::css::translate_x;
use sitewire_core::{Document, ElementId, EventKind, KeyCode, Selectors, SiteConfig, Target};
use sitewire_runtime::{EventBus, FrameThrottle, Subscription};

/// Fewest slides a carousel needs to be installed.
pub const MIN_SLIDES: usize = 3;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Index and measured width of one carousel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselState {
    count: usize,
    index: usize,
    slide_width: f64,
}

impl CarouselState {
    /// Unmeasured state at slide 0. `None` when `count < MIN_SLIDES`.
    pub fn new(count: usize) -> Option<Self> {
        (count >= MIN_SLIDES).then_some(Self {
            count,
            index: 0,
            slide_width: 0.0,
        })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn slide_width(&self) -> f64 {
        self.slide_width
    }

    #[inline]
    pub fn is_measured(&self) -> bool {
        self.slide_width > 0.0
    }

    /// Track offset for the current index and width.
    pub fn offset(&self) -> f64 {
        -(self.index as f64) * self.slide_width
    }

    /// Store a new slide width. Returns `false` and keeps the old width when
    /// `width` is not a positive finite length.
    pub fn set_width(&mut self, width: f64) -> bool {
        if width.is_finite() && width > 0.0 {
            self.slide_width = width;
            true
        } else {
            false
        }
    }

    /// Move to slide `target` (wrapped into range).
    ///
    /// When unmeasured, `measure` is called once for a width. If the width is
    /// still unknown nothing changes and `None` is returned; otherwise the
    /// new track offset is returned.
    pub fn go_to(&mut self, target: isize, measure: impl FnOnce() -> f64) -> Option<f64> {
        if !self.is_measured() {
            self.set_width(measure());
        }
        if !self.is_measured() {
            return None;
        }
        // count >= MIN_SLIDES, far below isize::MAX.
        let count = self.count as isize;
        self.index = target.rem_euclid(count) as usize;
        Some(self.offset())
    }

    pub fn next(&mut self, measure: impl FnOnce() -> f64) -> Option<f64> {
        self.go_to(self.index as isize + 1, measure)
    }

    pub fn prev(&mut self, measure: impl FnOnce() -> f64) -> Option<f64> {
        self.go_to(self.index as isize - 1, measure)
    }
}

// ---------------------------------------------------------------------------
// Carousel
// ---------------------------------------------------------------------------

/// One discovered carousel and its state.
#[derive(Debug)]
pub struct Carousel {
    root: ElementId,
    viewport: ElementId,
    track: ElementId,
    slides: Vec<ElementId>,
    prev: Option<ElementId>,
    next: Option<ElementId>,
    state: RefCell<CarouselState>,
    measures: Cell<u64>,
}

impl Carousel {
    /// Resolve the parts of the carousel rooted at `root`.
    ///
    /// `None` when the track or viewport is missing or there are fewer than
    /// [`MIN_SLIDES`] slides.
    pub fn discover(doc: &dyn Document, root: ElementId, selectors: &Selectors) -> Option<Self> {
        let track = doc.query_first_within(root, &selectors.carousel_track);
        let viewport = doc.query_first_within(root, &selectors.carousel_viewport);
        let slides = doc.query_within(root, &selectors.carousel_slide);

        let (Some(track), Some(viewport)) = (track, viewport) else {
            tracing::debug!(root = root.raw(), "carousel skipped: missing track or viewport");
            return None;
        };
        let Some(state) = CarouselState::new(slides.len()) else {
            tracing::debug!(
                root = root.raw(),
                slides = slides.len(),
                "carousel skipped: too few slides"
            );
            return None;
        };

        Some(Self {
            root,
            viewport,
            track,
            slides,
            prev: doc.query_first_within(root, &selectors.carousel_prev),
            next: doc.query_first_within(root, &selectors.carousel_next),
            state: RefCell::new(state),
            measures: Cell::new(0),
        })
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn viewport(&self) -> ElementId {
        self.viewport
    }

    pub fn track(&self) -> ElementId {
        self.track
    }

    pub fn slides(&self) -> &[ElementId] {
        &self.slides
    }

    pub fn index(&self) -> usize {
        self.state.borrow().index()
    }

    pub fn slide_width(&self) -> f64 {
        self.state.borrow().slide_width()
    }

    /// Successful measurements so far.
    pub fn measures(&self) -> u64 {
        self.measures.get()
    }

    /// First non-zero of the viewport's rect width, its client width, and the
    /// root's rect width.
    pub fn viewport_width(&self, doc: &dyn Document) -> f64 {
        [
            doc.bounding_rect(self.viewport).width,
            doc.client_width(self.viewport),
            doc.bounding_rect(self.root).width,
        ]
        .into_iter()
        .find(|w| *w > 0.0)
        .unwrap_or(0.0)
    }

    /// Re-read the viewport width and reposition the track. A zero width is
    /// ignored and the previous measurement kept.
    pub fn measure(&self, doc: &mut dyn Document) -> bool {
        let width = self.viewport_width(&*doc);
        let offset = {
            let mut state = self.state.borrow_mut();
            if !state.set_width(width) {
                return false;
            }
            state.offset()
        };
        self.measures.set(self.measures.get() + 1);
        doc.set_style(self.track, "transform", &translate_x(offset));
        tracing::trace!(root = self.root.raw(), width, "carousel measured");
        true
    }

    /// Show slide `target`, wrapping. Returns `false` if the carousel could
    /// not be measured.
    pub fn go_to(&self, doc: &mut dyn Document, target: isize) -> bool {
        let moved = {
            let width = || self.viewport_width(&*doc);
            self.state.borrow_mut().go_to(target, width)
        };
        self.apply(doc, moved)
    }

    pub fn next(&self, doc: &mut dyn Document) -> bool {
        let moved = {
            let width = || self.viewport_width(&*doc);
            self.state.borrow_mut().next(width)
        };
        self.apply(doc, moved)
    }

    pub fn prev(&self, doc: &mut dyn Document) -> bool {
        let moved = {
            let width = || self.viewport_width(&*doc);
            self.state.borrow_mut().prev(width)
        };
        self.apply(doc, moved)
    }

    fn apply(&self, doc: &mut dyn Document, offset: Option<f64>) -> bool {
        let Some(offset) = offset else {
            return false;
        };
        doc.set_style(self.track, "transform", &translate_x(offset));
        true
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Load/error pair for one image; emptied when the image settles.
type ImageWatch = RefCell<Option<[Subscription; 2]>>;

/// An installed carousel with its listeners.
#[derive(Debug)]
pub struct CarouselController {
    carousel: Rc<Carousel>,
    pending_images: Rc<Cell<usize>>,
    images: Vec<Rc<ImageWatch>>,
    _subscriptions: Vec<Subscription>,
}

impl CarouselController {
    /// Install every carousel on the page.
    pub fn install_all(doc: &mut dyn Document, bus: &EventBus, config: &SiteConfig) -> Vec<Self> {
        doc.query_selector_all(&config.selectors.carousels)
            .into_iter()
            .filter_map(|root| Self::install(doc, bus, root, config))
            .collect()
    }

    /// Install the carousel rooted at `root`, or `None` if it is inert.
    pub fn install(
        doc: &mut dyn Document,
        bus: &EventBus,
        root: ElementId,
        config: &SiteConfig,
    ) -> Option<Self> {
        let carousel = Rc::new(Carousel::discover(&*doc, root, &config.selectors)?);
        let mut subscriptions = Vec::new();

        for (control, forward) in [(carousel.next, true), (carousel.prev, false)] {
            let Some(control) = control else { continue };
            let c = Rc::clone(&carousel);
            subscriptions.push(bus.listen(
                Target::Element(control),
                EventKind::Click,
                move |doc, _| {
                    if forward {
                        c.next(doc);
                    } else {
                        c.prev(doc);
                    }
                },
            ));
        }

        let viewport = carousel.viewport;
        let tabindex = doc
            .attribute(viewport, "tabindex")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "0".to_owned());
        doc.set_attribute(viewport, "tabindex", &tabindex);

        let c = Rc::clone(&carousel);
        subscriptions.push(bus.listen(
            Target::Element(viewport),
            EventKind::KeyDown,
            move |doc, ev| {
                let forward = match ev.key().map(|k| &k.code) {
                    Some(KeyCode::ArrowRight) => true,
                    Some(KeyCode::ArrowLeft) => false,
                    _ => return,
                };
                ev.prevent_default();
                if forward {
                    c.next(doc);
                } else {
                    c.prev(doc);
                }
            },
        ));

        if doc.supports_resize_observer() {
            doc.observe_resize(viewport);
            let c = Rc::clone(&carousel);
            subscriptions.push(bus.listen(
                Target::Element(viewport),
                EventKind::ElementResize,
                move |doc, _| {
                    c.measure(doc);
                },
            ));
        } else {
            let c = Rc::clone(&carousel);
            let throttle = FrameThrottle::new();
            let weak = bus.downgrade();
            subscriptions.push(bus.listen(Target::Window, EventKind::Resize, move |_, _| {
                let Some(bus) = weak.upgrade() else { return };
                let c = Rc::clone(&c);
                throttle.schedule(&bus, move |doc| {
                    c.measure(doc);
                });
            }));
        }

        let (pending_images, images) =
            watch_images(doc, bus, &carousel, &config.selectors.carousel_images);

        carousel.measure(doc);
        tracing::debug!(
            root = root.raw(),
            slides = carousel.slides.len(),
            pending_images = pending_images.get(),
            "carousel installed"
        );
        Some(Self {
            carousel,
            pending_images,
            images,
            _subscriptions: subscriptions,
        })
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    /// Images inside the root that have not settled yet.
    pub fn pending_images(&self) -> usize {
        self.pending_images.get()
    }

    /// Live image listeners (two per unsettled image).
    pub fn image_listeners(&self) -> usize {
        self.images
            .iter()
            .filter(|w| w.borrow().is_some())
            .count()
            * 2
    }
}

/// Count down the root's images and re-measure once the last one settles.
fn watch_images(
    doc: &mut dyn Document,
    bus: &EventBus,
    carousel: &Rc<Carousel>,
    selector: &str,
) -> (Rc<Cell<usize>>, Vec<Rc<ImageWatch>>) {
    let imgs = doc.query_within(carousel.root, selector);
    let pending = Rc::new(Cell::new(imgs.len()));
    let mut watches = Vec::new();

    for img in imgs {
        if doc.image_complete(img) {
            settle(doc, &pending, carousel);
            continue;
        }
        let watch: Rc<ImageWatch> = Rc::new(RefCell::new(None));
        let subscribe = |kind| {
            let slot = Rc::downgrade(&watch);
            let pending = Rc::clone(&pending);
            let carousel = Rc::downgrade(carousel);
            bus.listen_once(Target::Element(img), kind, move |doc, _| {
                on_image_settled(doc, &slot, &pending, &carousel);
            })
        };
        let pair = [subscribe(EventKind::Load), subscribe(EventKind::Error)];
        *watch.borrow_mut() = Some(pair);
        watches.push(watch);
    }
    (pending, watches)
}

fn on_image_settled(
    doc: &mut dyn Document,
    slot: &Weak<ImageWatch>,
    pending: &Rc<Cell<usize>>,
    carousel: &Weak<Carousel>,
) {
    let Some(slot) = slot.upgrade() else { return };
    // Dropping the pair detaches the sibling listener.
    let Some(pair) = slot.borrow_mut().take() else {
        return;
    };
    drop(pair);
    if let Some(carousel) = carousel.upgrade() {
        settle(doc, pending, &carousel);
    }
}

fn settle(doc: &mut dyn Document, pending: &Cell<usize>, carousel: &Carousel) {
    let left = pending.get().saturating_sub(1);
    pending.set(left);
    if left == 0 {
        carousel.measure(doc);
    }
}
