#![forbid(unsafe_code)]

//! Event bus with cancellable subscriptions and an animation-frame queue.
//!
//! The bus is the page's single dispatcher. Hosts feed it normalized
//! [`DomEvent`]s through [`EventBus::dispatch`] and drive frames through
//! [`EventBus::run_frame`]; controllers register handlers with
//! [`EventBus::listen`] and keep the returned [`Subscription`] for as long as
//! the handler should stay attached.
//!
//! # Invariants
//!
//! 1. Listeners on one `(target, kind)` pair run in registration order.
//! 2. Propagation follows the bubbling path: target element, its ancestors,
//!    then [`Target::Document`], then [`Target::Window`]. Detached elements
//!    do not bubble past their own ancestors.
//! 3. A listener added during a dispatch does not run for that dispatch.
//! 4. A listener removed during a dispatch never runs afterwards, including
//!    later in the same dispatch.
//! 5. `once` listeners are detached before their handler runs.
//! 6. `run_frame` only runs callbacks queued before it started; callbacks
//!    queued from inside a frame wait for the next one.
//!
//! # Failure Modes
//!
//! - Dropping a [`Subscription`] after the bus is gone is a no-op.
//! - Dropping a [`Subscription`] while the listener table is borrowed marks
//!   the listener dead; the entry is purged on the next dispatch.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use sitewire_core::{Document, DomEvent, EventKind, Target};

/// Event handler signature.
pub type Handler = dyn Fn(&mut dyn Document, &mut DomEvent);

type FrameCallback = Box<dyn FnOnce(&mut dyn Document)>;
type ListenerKey = (Target, EventKind);

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    once: bool,
    alive: Cell<bool>,
    handler: Box<Handler>,
}

#[derive(Default)]
struct BusInner {
    listeners: AHashMap<ListenerKey, Vec<Rc<Listener>>>,
    frames: Vec<FrameCallback>,
    frame_hook: Option<Rc<dyn Fn()>>,
    next_id: u64,
    frames_run: u64,
}

impl BusInner {
    fn remove(&mut self, key: ListenerKey, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(&key) {
            list.retain(|l| l.id != id);
            if list.is_empty() {
                self.listeners.remove(&key);
            }
        }
    }

    fn purge_dead(&mut self, key: ListenerKey) {
        if let Some(list) = self.listeners.get_mut(&key) {
            list.retain(|l| l.alive.get());
        }
    }
}

/// Shared handle to the page's event bus. Cloning is cheap.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("listener_keys", &inner.listeners.len())
            .field("pending_frames", &inner.frames.len())
            .field("frames_run", &inner.frames_run)
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Subscriptions ---

    /// Attach `handler` to events of `kind` reaching `target`.
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn listen(
        &self,
        target: Target,
        kind: EventKind,
        handler: impl Fn(&mut dyn Document, &mut DomEvent) + 'static,
    ) -> Subscription {
        self.register(target, kind, false, Box::new(handler))
    }

    /// Like [`listen`](Self::listen), but the listener detaches itself the
    /// first time it fires.
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn listen_once(
        &self,
        target: Target,
        kind: EventKind,
        handler: impl Fn(&mut dyn Document, &mut DomEvent) + 'static,
    ) -> Subscription {
        self.register(target, kind, true, Box::new(handler))
    }

    fn register(
        &self,
        target: Target,
        kind: EventKind,
        once: bool,
        handler: Box<Handler>,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        let listener = Rc::new(Listener {
            id,
            once,
            alive: Cell::new(true),
            handler,
        });
        let weak_listener = Rc::downgrade(&listener);
        inner
            .listeners
            .entry((target, kind))
            .or_default()
            .push(listener);
        Subscription {
            bus: Rc::downgrade(&self.inner),
            listener: weak_listener,
            key: (target, kind),
            id,
        }
    }

    /// Number of live listeners across all targets.
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .values()
            .flat_map(|list| list.iter())
            .filter(|l| l.alive.get())
            .count()
    }

    /// Number of live listeners for one `(target, kind)` pair.
    pub fn listeners_on(&self, target: Target, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&(target, kind))
            .map_or(0, |list| list.iter().filter(|l| l.alive.get()).count())
    }

    // --- Dispatch ---

    /// Deliver `event` along its bubbling path.
    ///
    /// Returns `true` if any handler called
    /// [`DomEvent::prevent_default`].
    pub fn dispatch(&self, doc: &mut dyn Document, event: &mut DomEvent) -> bool {
        let kind = event.kind();
        for target in propagation_path(&*doc, event.target()) {
            for listener in self.snapshot((target, kind)) {
                if !listener.alive.get() {
                    continue;
                }
                if listener.once {
                    listener.alive.set(false);
                    if let Ok(mut inner) = self.inner.try_borrow_mut() {
                        inner.remove((target, kind), listener.id);
                    }
                }
                (listener.handler)(&mut *doc, &mut *event);
            }
        }
        event.is_default_prevented()
    }

    fn snapshot(&self, key: ListenerKey) -> Vec<Rc<Listener>> {
        let mut inner = self.inner.borrow_mut();
        inner.purge_dead(key);
        inner.listeners.get(&key).cloned().unwrap_or_default()
    }

    // --- Frames ---

    /// Queue `callback` for the next animation frame.
    ///
    /// When the queue goes from empty to non-empty the frame hook (if any)
    /// is invoked so the host can request a real frame.
    pub fn request_frame(&self, callback: impl FnOnce(&mut dyn Document) + 'static) {
        let hook = {
            let mut inner = self.inner.borrow_mut();
            let was_idle = inner.frames.is_empty();
            inner.frames.push(Box::new(callback));
            if was_idle {
                inner.frame_hook.clone()
            } else {
                None
            }
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Install the callback used to ask the host for an animation frame.
    pub fn set_frame_hook(&self, hook: impl Fn() + 'static) {
        self.inner.borrow_mut().frame_hook = Some(Rc::new(hook));
    }

    /// Whether any frame callback is waiting.
    pub fn frame_pending(&self) -> bool {
        !self.inner.borrow().frames.is_empty()
    }

    /// Run the callbacks queued so far. Returns how many ran.
    pub fn run_frame(&self, doc: &mut dyn Document) -> usize {
        let batch = {
            let mut inner = self.inner.borrow_mut();
            inner.frames_run += 1;
            std::mem::take(&mut inner.frames)
        };
        let count = batch.len();
        tracing::trace!(callbacks = count, "running animation frame");
        for callback in batch {
            callback(&mut *doc);
        }
        count
    }

    /// Total frames run since creation.
    pub fn frames_run(&self) -> u64 {
        self.inner.borrow().frames_run
    }

    /// Non-owning handle, for handlers that need to reach the bus they are
    /// registered on.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Weak counterpart of [`EventBus`].
#[derive(Clone, Default)]
pub struct WeakEventBus {
    inner: Weak<RefCell<BusInner>>,
}

impl WeakEventBus {
    /// The bus, if it is still alive.
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

impl fmt::Debug for WeakEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Targets visited by an event dispatched at `origin`, innermost first.
pub fn propagation_path(doc: &dyn Document, origin: Target) -> Vec<Target> {
    match origin {
        Target::Window => vec![Target::Window],
        Target::Document => vec![Target::Document, Target::Window],
        Target::Element(el) => {
            let mut path = vec![Target::Element(el)];
            let mut cursor = doc.parent(el);
            while let Some(parent) = cursor {
                path.push(Target::Element(parent));
                cursor = doc.parent(parent);
            }
            if doc.is_connected(el) {
                path.push(Target::Document);
                path.push(Target::Window);
            }
            path
        }
    }
}

/// RAII guard for a registered listener.
///
/// Dropping the guard detaches the listener. Call [`forget`](Self::forget)
/// to keep the listener attached for the rest of the page's lifetime.
#[must_use = "dropping the subscription detaches the listener"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    listener: Weak<Listener>,
    key: ListenerKey,
    id: ListenerId,
}

impl Subscription {
    /// The listener's id.
    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still attached.
    pub fn is_active(&self) -> bool {
        self.listener.upgrade().is_some_and(|l| l.alive.get())
    }

    /// Keep the listener attached permanently.
    pub fn forget(mut self) {
        self.bus = Weak::new();
        self.listener = Weak::new();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.upgrade() {
            listener.alive.set(false);
        }
        if let Some(shared) = self.bus.upgrade()
            && let Ok(mut inner) = shared.try_borrow_mut()
        {
            inner.remove(self.key, self.id);
        }
    }
}
