#![forbid(unsafe_code)]

//! Single-threaded event runtime for sitewire.
//!
//! - [`EventBus`]: listener table with bubbling dispatch and an
//!   animation-frame queue.
//! - [`Subscription`]: RAII guard that detaches its listener on drop.
//! - [`FrameThrottle`]: at-most-one-pending-frame coalescing for
//!   high-frequency events.
//!
//! Everything here is `Rc`-based and `!Send`. The DOM is only touched from
//! inside an event or frame callback on the page's main thread.

pub mod bus;
pub mod frame;

pub use bus::{EventBus, Handler, ListenerId, Subscription, WeakEventBus, propagation_path};
pub use frame::FrameThrottle;
