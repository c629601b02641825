//! WASM bindings for the e-library PDF reader
//!
//! Selection handling, highlight geometry, overlay state and persistence run
//! in Rust. The page render host (pdf.js) draws pages; JavaScript forwards
//! DOM events and registers page elements.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ReaderHandle } from './pkg/reader_wasm.js';
//!
//! await init();
//!
//! const reader = new ReaderHandle(bookId, API_BASE, window.innerWidth, 1);
//! await reader.load();
//!
//! // once per rendered page
//! reader.registerPage(n, pageEl);
//! reader.paintPage(n, overlayLayerEl);
//!
//! document.addEventListener('mouseup', () => showMenu(reader.onSelection()));
//! await reader.confirm('underline');
//! ```

pub mod auth_storage;
pub mod dom;
pub mod fetch_store;
pub mod session;

use wasm_bindgen::prelude::*;

pub use fetch_store::{FetchError, FetchHighlightStore};
pub use session::ReaderHandle;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Palette for the annotation menu: `[{ name, label, fill, stroke }]`
#[wasm_bindgen(js_name = highlightPalette)]
pub fn highlight_palette() -> Result<JsValue, JsValue> {
    #[derive(serde::Serialize)]
    struct Swatch {
        name: &'static str,
        label: &'static str,
        fill: String,
        stroke: String,
    }

    let swatches: Vec<Swatch> = reader_types::HighlightColor::ALL
        .iter()
        .map(|c| Swatch {
            name: c.as_str(),
            label: c.label(),
            fill: c.fill_css(),
            stroke: c.stroke_css(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&swatches)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
