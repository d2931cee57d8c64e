#![no_main]

use libfuzzer_sys::fuzz_target;
use sitewire_core::Document;
use sitewire_harness::{FakeDocument, SelectorList, fixtures};

fuzz_target!(|data: &str| {
    if data.len() > 256 {
        return;
    }
    let mut doc = FakeDocument::new();
    let page = fixtures::page(&mut doc, &[("a", 400.0), ("b", 400.0)]);
    let _ = fixtures::dialog(&mut doc, page.sections[1], "dlg", 2);

    // The document query agrees with matching each element directly.
    let Ok(list) = SelectorList::parse(data) else {
        assert!(doc.query_selector_all(data).is_empty());
        return;
    };
    let body = doc.body_id();
    let root = doc.root_id();
    let direct: Vec<_> = std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|&el| list.matches(&doc, el))
        .collect();
    assert_eq!(doc.query_selector_all(data), direct);
    let _ = doc.query_within(body, data);
});
