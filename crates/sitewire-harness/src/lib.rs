#![forbid(unsafe_code)]

//! Test harness for sitewire controllers.
//!
//! - [`FakeDocument`]: an in-memory [`Document`](sitewire_core::Document)
//!   with explicit layout, scroll position, focus, and a tiny selector
//!   engine.
//! - [`fixtures`]: builders for the stock page markup (header, sections,
//!   nav, carousels, dialogs).
//!
//! The harness only depends on `sitewire-core`, so any crate can pull it in
//! as a dev-dependency.

pub mod document;
pub mod fixtures;
pub mod selector;

pub use document::{ElementMut, FakeDocument};
pub use fixtures::{CarouselParts, DialogParts, PageParts};
pub use selector::{SelectorError, SelectorList};
