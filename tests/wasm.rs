#![cfg(target_arch = "wasm32")]

use circular_gallery::{GalleryItem, GalleryOptions};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

// Options arrive from JS as a plain object; they must survive the
// serde-wasm-bindgen boundary in both directions.
#[wasm_bindgen_test]
fn options_round_trip_through_js_values() {
    let options = GalleryOptions {
        items: vec![GalleryItem {
            image: "https://example.com/a.jpg".into(),
            text: "A".into(),
            link: Some("https://example.com".into()),
            description: None,
        }],
        bend: 0.0,
        snap_debounce_ms: 50,
        ..GalleryOptions::default()
    };

    let value = serde_wasm_bindgen::to_value(&options).unwrap();
    let back: GalleryOptions = serde_wasm_bindgen::from_value(value).unwrap();

    assert_eq!(back.items.len(), 1);
    assert_eq!(back.items[0].image, options.items[0].image);
    assert_eq!(back.items[0].link.as_deref(), Some("https://example.com"));
    assert_eq!(back.bend, 0.0);
    assert_eq!(back.snap_debounce_ms, 50);
    assert_eq!(back.scroll_ease, GalleryOptions::default().scroll_ease);
}
