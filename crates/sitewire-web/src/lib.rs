#![forbid(unsafe_code)]

//! Browser host for sitewire.
//!
//! [`WebDocument`] implements the core `Document` trait over `web-sys`;
//! [`BrowserHost`] forwards window and document events into an
//! [`EventBus`](sitewire_runtime::EventBus) and drives its frame queue from
//! `requestAnimationFrame`. The wasm entry points are:
//!
//! ```js
//! import init, { install, installWithConfig, uninstall } from "./sitewire_web.js";
//! await init();
//! install(); // or installWithConfig(JSON.stringify({ classes: { active: "current" } }))
//! ```
//!
//! Only [`WebError`] and the key translation compile on native targets.

pub mod error;
pub mod keys;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod entry;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod logging;

pub use error::WebError;
pub use keys::key_event;

#[cfg(target_arch = "wasm32")]
pub use dom::WebDocument;
#[cfg(target_arch = "wasm32")]
pub use entry::{install, install_with_config, uninstall};
#[cfg(target_arch = "wasm32")]
pub use host::BrowserHost;
#[cfg(target_arch = "wasm32")]
pub use logging::{ConsoleMakeWriter, init_logging};
