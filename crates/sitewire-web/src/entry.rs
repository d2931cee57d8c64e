#![forbid(unsafe_code)]

//! `#[wasm_bindgen]` entry points.
//!
//! The installed host lives in a thread-local slot. Installing again replaces
//! it, which detaches everything the previous installation attached.

use std::cell::RefCell;
use std::rc::Rc;

use sitewire_core::SiteConfig;
use wasm_bindgen::prelude::*;

use crate::error::WebError;
use crate::host::BrowserHost;
use crate::logging::init_logging;

thread_local! {
    static HOST: RefCell<Option<Rc<BrowserHost>>> = const { RefCell::new(None) };
}

/// Install with the default markup contract.
#[wasm_bindgen]
pub fn install() -> Result<(), JsValue> {
    install_config(&SiteConfig::default()).map_err(JsValue::from)
}

/// Install with a JSON configuration overriding selectors, class names,
/// custom property names, or header height fallbacks.
#[wasm_bindgen(js_name = installWithConfig)]
pub fn install_with_config(json: &str) -> Result<(), JsValue> {
    init_logging();
    let config = SiteConfig::from_json(json).map_err(WebError::from)?;
    install_config(&config).map_err(JsValue::from)
}

/// Detach every listener and forget the installation.
#[wasm_bindgen]
pub fn uninstall() {
    let previous = HOST.with(|slot| slot.borrow_mut().take());
    if previous.is_some() {
        tracing::info!("sitewire uninstalled");
    }
}

fn install_config(config: &SiteConfig) -> Result<(), WebError> {
    init_logging();
    let host = BrowserHost::attach()?;
    host.install(config)?;
    let previous = HOST.with(|slot| slot.borrow_mut().replace(host));
    if previous.is_some() {
        tracing::debug!("replaced previous installation");
    }
    Ok(())
}
