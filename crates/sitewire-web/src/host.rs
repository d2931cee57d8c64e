#![forbid(unsafe_code)]

//! Event forwarding between the browser and the bus.
//!
//! The host listens once at the window and document level and re-dispatches
//! normalized [`DomEvent`]s through the bus, which performs its own bubbling
//! from the target element. Image `load`/`error` do not bubble in the DOM, so
//! they are captured at the document. Frames requested on the bus are
//! coalesced into a single `requestAnimationFrame`.
//!
//! All browser callbacks hold a `Weak` reference to the host; dropping the
//! last strong reference removes every listener and cancels any queued frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{AnimationFrame, request_animation_frame};
use js_sys::{Array, Reflect};
use sitewire::Site;
use sitewire_core::{DomEvent, SiteConfig};
use sitewire_runtime::EventBus;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, EventTarget, KeyboardEvent, ResizeObserver, ResizeObserverEntry};

use crate::dom::WebDocument;
use crate::error::{WebError, describe_js};
use crate::keys::key_event;

type ObserverCallback = Closure<dyn FnMut(Array)>;

/// One page's sitewire installation.
pub struct BrowserHost {
    doc: RefCell<WebDocument>,
    bus: EventBus,
    site: RefCell<Option<Site>>,
    listeners: RefCell<Vec<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
    _observer_callback: Option<ObserverCallback>,
}

impl BrowserHost {
    /// Bind to the current page. Nothing is installed yet.
    pub fn attach() -> Result<Rc<Self>, WebError> {
        let doc = WebDocument::new()?;
        Ok(Rc::new_cyclic(|weak: &Weak<Self>| {
            let (observer, callback) = match resize_observer(weak, &doc) {
                Some((observer, callback)) => (Some(observer), Some(callback)),
                None => (None, None),
            };
            Self {
                doc: RefCell::new(doc.with_observer(observer)),
                bus: EventBus::new(),
                site: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                frame: RefCell::new(None),
                _observer_callback: callback,
            }
        }))
    }

    /// Wire browser events and install the controllers.
    pub fn install(self: &Rc<Self>, config: &SiteConfig) -> Result<(), WebError> {
        self.forward_browser_events();
        let weak = Rc::downgrade(self);
        self.bus.set_frame_hook(move || {
            if let Some(host) = weak.upgrade() {
                host.schedule_frame();
            }
        });
        let site = {
            let mut doc = self.doc.try_borrow_mut().map_err(|_| WebError::Busy)?;
            Site::install(&mut *doc, &self.bus, config)
        };
        *self.site.borrow_mut() = Some(site);
        tracing::debug!(
            browser_listeners = self.listeners.borrow().len(),
            "browser host installed"
        );
        Ok(())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Dispatch an event built against the document. Returns whether a
    /// listener prevented the default action.
    pub fn dispatch(&self, make: impl FnOnce(&WebDocument) -> Option<DomEvent>) -> bool {
        let Ok(mut doc) = self.doc.try_borrow_mut() else {
            tracing::warn!("re-entrant browser event dropped");
            return false;
        };
        let Some(mut event) = make(&*doc) else {
            return false;
        };
        self.bus.dispatch(&mut *doc, &mut event)
    }

    fn schedule_frame(self: &Rc<Self>) {
        let mut slot = self.frame.borrow_mut();
        if slot.is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        *slot = Some(request_animation_frame(move |_timestamp| {
            if let Some(host) = weak.upgrade() {
                host.run_frame();
            }
        }));
    }

    fn run_frame(self: &Rc<Self>) {
        self.frame.borrow_mut().take();
        let Ok(mut doc) = self.doc.try_borrow_mut() else {
            tracing::debug!("event in flight; frame deferred");
            self.schedule_frame();
            return;
        };
        let ran = self.bus.run_frame(&mut *doc);
        tracing::trace!(ran, "animation frame");
    }

    fn forward_browser_events(self: &Rc<Self>) {
        let (window, document): (EventTarget, EventTarget) = {
            let doc = self.doc.borrow();
            (doc.window().clone().into(), doc.dom().clone().into())
        };
        let passive = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: true,
        };
        let active = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        };
        let capture = EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: true,
        };

        let mut listeners = Vec::with_capacity(6);
        listeners.push(self.listen(&window, "scroll", passive, |_, _| Some(DomEvent::scroll())));
        listeners.push(self.listen(&window, "resize", passive, |_, _| Some(DomEvent::resize())));
        listeners.push(self.listen(&document, "click", active, |doc, event| {
            let target = target_element(event)?;
            Some(DomEvent::click(doc.id_of(&target)))
        }));
        listeners.push(self.listen(&document, "keydown", active, |doc, event| {
            let key = event.dyn_ref::<KeyboardEvent>()?;
            let target = target_element(event).map(|el| doc.id_of(&el));
            let key = key_event(
                &key.key(),
                key.shift_key(),
                key.ctrl_key(),
                key.alt_key(),
                key.meta_key(),
            );
            Some(DomEvent::key_down(target, key))
        }));
        listeners.push(self.listen(&document, "load", capture, |doc, event| {
            let image = target_image(event)?;
            Some(DomEvent::load(doc.id_of(&image)))
        }));
        listeners.push(self.listen(&document, "error", capture, |doc, event| {
            let image = target_image(event)?;
            Some(DomEvent::error(doc.id_of(&image)))
        }));
        self.listeners.borrow_mut().extend(listeners);
    }

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        event_type: &'static str,
        options: EventListenerOptions,
        translate: impl Fn(&WebDocument, &Event) -> Option<DomEvent> + 'static,
    ) -> EventListener {
        let weak = Rc::downgrade(self);
        EventListener::new_with_options(target, event_type, options, move |event: &Event| {
            let Some(host) = weak.upgrade() else {
                return;
            };
            let prevented = host.dispatch(|doc| translate(doc, event));
            if prevented && event.cancelable() {
                event.prevent_default();
            }
        })
    }
}

impl std::fmt::Debug for BrowserHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserHost")
            .field("bus", &self.bus)
            .field("installed", &self.site.borrow().is_some())
            .field("browser_listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn target_image(event: &Event) -> Option<Element> {
    target_element(event).filter(|el| el.tag_name().eq_ignore_ascii_case("img"))
}

/// Create a `ResizeObserver` that forwards to the host, when the browser
/// has one.
fn resize_observer(
    weak: &Weak<BrowserHost>,
    doc: &WebDocument,
) -> Option<(ResizeObserver, ObserverCallback)> {
    let available = Reflect::has(doc.window(), &JsValue::from_str("ResizeObserver")).unwrap_or(false);
    if !available {
        tracing::debug!("ResizeObserver unavailable; carousels fall back to window resize");
        return None;
    }
    let weak = weak.clone();
    let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
        let Some(host) = weak.upgrade() else {
            return;
        };
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() else {
                continue;
            };
            let target = entry.target();
            host.dispatch(|doc| Some(DomEvent::element_resize(doc.id_of(&target))));
        }
    });
    match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => Some((observer, callback)),
        Err(err) => {
            tracing::warn!(error = %describe_js(&err), "ResizeObserver construction failed");
            None
        }
    }
}
