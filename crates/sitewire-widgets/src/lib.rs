#![forbid(unsafe_code)]

//! Page controllers for sitewire.
//!
//! - [`header`]: compact header mode and the active nav link.
//! - [`carousel`]: width-tracking slide carousel.
//! - [`modal`]: accessible dialogs with a focus trap and focus restoration.
//!
//! Each controller is discovered from markup by an `install` function and
//! returns a handle owning its event subscriptions. Dropping the handle
//! detaches the controller.

pub mod carousel;
pub mod header;
pub mod modal;

pub use carousel::{Carousel, CarouselController, CarouselState, MIN_SLIDES};
pub use header::{HeaderNav, HeaderNavController, HeaderState, ProbeGeometry, resolve_active_section};
pub use modal::{FocusReturn, ModalController, focusable_elements, trap_tab};
