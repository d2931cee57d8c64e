#![forbid(unsafe_code)]

//! Accessible modal dialogs.
//!
//! - [`focus`]: the focusable-element policy, the Tab trap decision, and
//!   [`FocusReturn`], the weak handle used to restore focus on close.
//! - [`controller`]: the page-wide [`ModalController`] that owns the dialog
//!   registry and wires openers, close controls, backdrops, and Escape.
//!
//! # State Machine
//!
//! ```text
//!            open (opener click)
//!   closed ───────────────────────▶ open
//!      ▲                              │
//!      └──────────────────────────────┘
//!        close (close control, backdrop, Escape)
//! ```
//!
//! While open, a dialog has `aria-hidden="false"`, `<body>` carries the
//! modal-open class, and a keydown trap keeps Tab inside the dialog.

pub mod controller;
pub mod focus;

pub use controller::ModalController;
pub use focus::{FOCUSABLE_SELECTOR, FocusReturn, focusable_elements, trap_tab};
