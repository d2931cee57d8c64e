//! Browser-only checks of the web-sys document binding.
//!
//! Run with `wasm-pack test --headless --firefox crates/sitewire-web`.

#![cfg(target_arch = "wasm32")]

use pretty_assertions::assert_eq;
use sitewire_core::Document;
use sitewire_web::{BrowserHost, WebDocument};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn mount(html: &str) -> Element {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("document");
    let body = document.body().expect("body");
    let host = document.create_element("div").expect("div");
    host.set_inner_html(html);
    body.append_child(&host).expect("append");
    host
}

#[wasm_bindgen_test]
fn handles_are_stable_across_queries() {
    let mount = mount(r#"<section id="stable-a" class="stripe"></section>"#);
    let doc = WebDocument::new().expect("web document");
    let first = doc.query_selector("#stable-a").expect("found");
    let again = doc.query_selector_all("section#stable-a");
    assert_eq!(again, vec![first]);
    assert_eq!(doc.tag_name(first), "section");
    assert!(doc.has_class(first, "stripe"));
    mount.remove();
}

#[wasm_bindgen_test]
fn classes_attributes_and_parents() {
    let mount = mount(r##"<nav id="nav-b"><a id="link-b" href="#x">x</a></nav>"##);
    let mut doc = WebDocument::new().expect("web document");
    let nav = doc.query_selector("#nav-b").expect("nav");
    let link = doc.query_selector("#link-b").expect("link");

    assert_eq!(doc.parent(link), Some(nav));
    assert!(doc.contains(nav, link));
    assert_eq!(doc.attribute(link, "href").as_deref(), Some("#x"));

    doc.toggle_class(link, "is-active", true);
    assert!(doc.has_class(link, "is-active"));
    doc.toggle_class(link, "is-active", false);
    assert!(!doc.has_class(link, "is-active"));

    doc.set_attribute(link, "aria-current", "true");
    assert!(doc.has_attribute(link, "aria-current"));
    mount.remove();
}

#[wasm_bindgen_test]
fn focus_moves_and_detached_elements_report_disconnected() {
    let mount = mount(r#"<button id="focus-c">go</button>"#);
    let mut doc = WebDocument::new().expect("web document");
    let button = doc.query_selector("#focus-c").expect("button");
    doc.focus(button);
    assert_eq!(doc.active_element(), Some(button));

    mount.remove();
    assert!(!doc.is_connected(button));
    let body = doc.body().expect("body");
    assert!(!doc.contains(body, button));
}

#[wasm_bindgen_test]
fn handle_follows_element_through_detach_and_reinsert() {
    let mount = mount(r#"<p id="weak-e">text</p>"#);
    let doc = WebDocument::new().expect("web document");
    let para = doc.query_selector("#weak-e").expect("paragraph");
    let element = doc.element(para).expect("alive");

    element.remove();
    assert!(!doc.is_connected(para));
    assert_eq!(doc.tag_name(para), "p");

    mount.append_child(&element).expect("reinsert");
    assert!(doc.is_connected(para));
    assert_eq!(doc.query_selector("#weak-e"), Some(para));
    assert_eq!(doc.interned(), 1);
    mount.remove();
}

#[wasm_bindgen_test]
fn custom_property_round_trips_through_computed_style() {
    let mut doc = WebDocument::new().expect("web document");
    doc.set_custom_property("--sitewire-test", "42px");
    assert_eq!(doc.custom_property("--sitewire-test").as_deref(), Some("42px"));
    assert_eq!(doc.custom_property("--sitewire-unset"), None);
}

#[wasm_bindgen_test]
fn invalid_selector_matches_nothing() {
    let doc = WebDocument::new().expect("web document");
    assert_eq!(doc.query_selector("a[href"), None);
    assert!(doc.query_selector_all("::nope(").is_empty());
}

#[wasm_bindgen_test]
fn host_forwards_clicks_to_the_modal() {
    let mount = mount(
        r##"<button class="open-modal" id="open-d" data-modal-target="#dlg-d">open</button>
        <div class="modal" id="dlg-d" aria-hidden="true">
          <div class="modal__backdrop"></div>
          <div class="modal__panel" role="dialog">
            <button data-modal-close>close</button>
            <input id="field-d">
          </div>
        </div>"##,
    );
    let host = BrowserHost::attach().expect("host");
    host.install(&sitewire_core::SiteConfig::default())
        .expect("installed");

    let opener = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("open-d"))
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .expect("opener");
    opener.click();

    let dialog = mount.query_selector("#dlg-d").ok().flatten().expect("dialog");
    assert_eq!(dialog.get_attribute("aria-hidden").as_deref(), Some("false"));
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .expect("body");
    assert!(body.class_list().contains("modal-open"));

    drop(host);
    body.class_list().remove_1("modal-open").expect("cleanup");
    mount.remove();
}
