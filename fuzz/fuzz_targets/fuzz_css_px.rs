#![no_main]

use libfuzzer_sys::fuzz_target;
use sitewire_core::css::{format_px, parse_px};

fuzz_target!(|data: &str| {
    if let Some(px) = parse_px(data) {
        assert!(px.is_finite());
        // Whatever we write back must parse to the same length.
        let again = parse_px(&format_px(px));
        assert_eq!(again, Some(px));
    }
});
