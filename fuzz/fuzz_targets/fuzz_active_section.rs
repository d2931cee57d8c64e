#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sitewire_core::{Rect, ViewportMetrics};
use sitewire_widgets::{ProbeGeometry, resolve_active_section};

#[derive(Debug, Arbitrary)]
struct Input {
    header_height: u16,
    scroll_y: u32,
    inner_height: u16,
    scroll_height: u32,
    tolerance: u8,
    sections: Vec<(i32, u16)>,
}

fuzz_target!(|input: Input| {
    let sections: Vec<Rect> = input
        .sections
        .iter()
        .take(64)
        .map(|&(top, height)| Rect::new(0.0, f64::from(top), 1280.0, f64::from(height)))
        .collect();
    let geometry = ProbeGeometry {
        header_height: f64::from(input.header_height),
        viewport: ViewportMetrics {
            scroll_y: f64::from(input.scroll_y),
            inner_height: f64::from(input.inner_height),
            scroll_height: f64::from(input.scroll_height),
        },
        bottom_tolerance: f64::from(input.tolerance),
    };

    match resolve_active_section(&geometry, &sections) {
        None => assert!(sections.is_empty()),
        Some(index) => assert!(index < sections.len()),
    }
});
