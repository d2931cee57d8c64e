#![forbid(unsafe_code)]

//! Animation-frame throttling.
//!
//! High-frequency events (scroll, resize) must not each trigger a layout
//! read. A [`FrameThrottle`] coalesces them: the first event schedules one
//! frame callback, and every event that arrives before that frame runs is
//! dropped. The work always observes the latest DOM state, never the
//! intermediate ones.
//!
//! # Invariants
//!
//! 1. At most one callback per throttle is queued at any time.
//! 2. The pending flag clears only after the scheduled work has run, so an
//!    event delivered from inside the work itself is dropped too.

use std::cell::Cell;
use std::rc::Rc;

use sitewire_core::Document;

use crate::bus::EventBus;

/// Pending-flag throttle over [`EventBus::request_frame`].
#[derive(Debug, Clone, Default)]
pub struct FrameThrottle {
    ticking: Rc<Cell<bool>>,
    scheduled: Rc<Cell<u64>>,
}

impl FrameThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` for the next frame unless a frame is already pending.
    ///
    /// Returns `true` if the work was queued, `false` if it was coalesced
    /// into the pending frame.
    pub fn schedule(
        &self,
        bus: &EventBus,
        work: impl FnOnce(&mut dyn Document) + 'static,
    ) -> bool {
        if self.ticking.get() {
            return false;
        }
        self.ticking.set(true);
        self.scheduled.set(self.scheduled.get() + 1);

        let ticking = Rc::clone(&self.ticking);
        bus.request_frame(move |doc| {
            work(doc);
            ticking.set(false);
        });
        true
    }

    /// Whether a frame is queued and has not run yet.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.ticking.get()
    }

    /// Frames scheduled over the throttle's lifetime.
    #[inline]
    pub fn scheduled(&self) -> u64 {
        self.scheduled.get()
    }
}
