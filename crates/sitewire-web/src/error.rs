#![forbid(unsafe_code)]

//! Errors surfaced to JavaScript by the entry points.

use sitewire_core::ConfigError;
use thiserror::Error;

/// Why the browser host could not be installed.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("no global `window` object")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("document has no root element")]
    NoRootElement,
    /// The host document was already borrowed by an event in flight.
    #[error("host is busy dispatching an event")]
    Busy,
    #[error("javascript exception: {0}")]
    Js(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Human-readable rendering of a thrown JS value, for logs and errors.
#[cfg(target_arch = "wasm32")]
pub(crate) fn describe_js(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}

#[cfg(target_arch = "wasm32")]
impl From<WebError> for wasm_bindgen::JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
