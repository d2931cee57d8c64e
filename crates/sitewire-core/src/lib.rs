#![forbid(unsafe_code)]

//! Core types for sitewire: geometry, the key/event model, the host
//! [`Document`](dom::Document) abstraction, CSS length helpers, and the
//! site configuration.
//!
//! Nothing in this crate touches a browser. Hosts (the `web-sys` binding in
//! `sitewire-web`, the in-memory model in `sitewire-harness`) implement
//! [`dom::Document`] and everything above it is written against that trait.

pub mod config;
pub mod css;
pub mod dom;
pub mod event;
pub mod geometry;

pub use config::{ClassNames, ConfigError, CssVars, HeaderDefaults, Selectors, SiteConfig};
pub use dom::{Document, ElementId};
pub use event::{DomEvent, EventKind, KeyCode, KeyEvent, Modifiers, Target};
pub use geometry::{Rect, ViewportMetrics};
