//! Reader bindings for one open book
//!
//! All annotation state lives in Rust; JavaScript forwards DOM events and
//! hands over page and overlay-layer elements.

use std::cell::RefCell;
use std::rc::Rc;

use annotation_core::viewport::{page_jump, preview_page_count};
use annotation_core::{
    HighlightStore, LayoutMode, PageGeometry, ReaderSession, ReaderViewport, ScreenRect,
};
use reader_types::{AnnotationKind, HighlightColor, HighlightId};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::auth_storage;
use crate::dom::{self, DomPageRegistry};
use crate::fetch_store::FetchHighlightStore;

struct State {
    reader: ReaderSession,
    viewport: ReaderViewport,
    pages: DomPageRegistry,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Reader state for one book
///
/// Async methods never hold the state borrowed while a request is in
/// flight, so DOM events keep being handled during network round trips.
#[wasm_bindgen]
pub struct ReaderHandle {
    state: Rc<RefCell<State>>,
    store: Rc<FetchHighlightStore>,
}

#[wasm_bindgen]
impl ReaderHandle {
    /// `api_base` is the API root, e.g. `https://library.example.edu/api`.
    /// The bearer token is taken from the stored auth session.
    #[wasm_bindgen(constructor)]
    pub fn new(
        book_id: &str,
        api_base: &str,
        window_width: f64,
        initial_page: Option<u32>,
    ) -> Result<ReaderHandle, JsValue> {
        let auth = auth_storage::load_session()?;
        let token = auth.bearer().map(str::to_string);
        Ok(Self {
            state: Rc::new(RefCell::new(State {
                reader: ReaderSession::new(book_id, initial_page.unwrap_or(1)),
                viewport: ReaderViewport::new(window_width),
                pages: DomPageRegistry::new(),
            })),
            store: Rc::new(FetchHighlightStore::new(api_base, token)),
        })
    }

    // ---- pages ----

    #[wasm_bindgen(js_name = registerPage)]
    pub fn register_page(&self, page_number: u32, element: Element) {
        self.state.borrow_mut().pages.register(page_number, element);
    }

    #[wasm_bindgen(js_name = unregisterPage)]
    pub fn unregister_page(&self, page_number: u32) {
        self.state.borrow_mut().pages.unregister(page_number);
    }

    /// Call on scroll with the scrolling container. Returns the new current
    /// page when it changed.
    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&self, container: &Element) -> Option<u32> {
        let viewport = dom::screen_rect(&container.get_bounding_client_rect());
        let mut state = self.state.borrow_mut();
        let State { reader, pages, .. } = &mut *state;
        reader.on_scroll(&viewport, &*pages)
    }

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.state.borrow().reader.current_page()
    }

    /// Parse a page-jump input. Returns the target page when valid.
    #[wasm_bindgen(js_name = jumpToPage)]
    pub fn jump_to_page(&self, input: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let num_pages = state.viewport.document().num_pages();
        let page = page_jump(input, num_pages)?;
        state.reader.set_current_page(page);
        Some(page)
    }

    // ---- highlights ----

    /// Fetch the book's highlights. Returns how many were loaded.
    pub async fn load(&self) -> Result<u32, JsValue> {
        let book_id = self.state.borrow().reader.book_id().to_string();
        let highlights = self.store.list(&book_id).await?;
        let count = highlights.len() as u32;
        self.state.borrow_mut().reader.set_highlights(highlights);
        Ok(count)
    }

    pub fn highlights(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().reader.highlights())
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&self, color: &str) -> Result<(), JsValue> {
        let color: HighlightColor = color.parse().map_err(js_err)?;
        self.state.borrow_mut().reader.set_color(color);
        Ok(())
    }

    /// Call after mouseup/touchend. Returns the pending menu
    /// (`{ text, anchor: { x, y } }`) or `null`.
    #[wasm_bindgen(js_name = onSelection)]
    pub fn on_selection(&self) -> Result<JsValue, JsValue> {
        let Some(event) = dom::live_selection()? else {
            return Ok(JsValue::NULL);
        };
        let mut state = self.state.borrow_mut();
        match state.reader.on_selection(&event) {
            Some(pending) => to_js(pending),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = dismissSelection)]
    pub fn dismiss_selection(&self) {
        self.state.borrow_mut().reader.dismiss_selection();
    }

    /// Menu action. `kind` is `"highlight"` or `"underline"`. Resolves to the
    /// created highlight, or `null` when there was nothing to save.
    pub async fn confirm(&self, kind: &str) -> Result<JsValue, JsValue> {
        let kind: AnnotationKind = kind.parse().map_err(js_err)?;
        // Rects are re-read now; the page may have been zoomed since mouseup
        let rects: Vec<ScreenRect> = dom::live_selection()?
            .map(|event| event.client_rects)
            .unwrap_or_default();

        let (book_id, payload) = {
            let mut state = self.state.borrow_mut();
            let State { reader, pages, .. } = &mut *state;
            (
                reader.book_id().to_string(),
                reader.begin_create(kind, &rects, &*pages),
            )
        };
        let Some(payload) = payload else {
            return Ok(JsValue::NULL);
        };

        let created = self.store.create(&book_id, &payload).await;
        dom::clear_selection()?;
        let created = created?;
        let js = to_js(&created)?;
        self.state.borrow_mut().reader.finish_create(created);
        Ok(js)
    }

    /// Regions for a page as plain objects, for hosts that draw their own
    #[wasm_bindgen(js_name = overlaysForPage)]
    pub fn overlays_for_page(&self, page_number: u32) -> Result<JsValue, JsValue> {
        let state = self.state.borrow();
        match state.pages.page_box(page_number) {
            Some(page) => to_js(&state.reader.overlays_for_page(page_number, &page)),
            None => to_js(&Vec::<()>::new()),
        }
    }

    /// Repaint a page's overlay layer. Overlays are not shown in the mobile
    /// layout.
    #[wasm_bindgen(js_name = paintPage)]
    pub fn paint_page(&self, page_number: u32, layer: &Element) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let state = self.state.borrow();

        let page = match state.pages.page_box(page_number) {
            Some(page) if state.viewport.layout().shows_annotations() => page,
            _ => return dom::paint_layer(&document, layer, &[], None),
        };
        let regions = state.reader.overlays_for_page(page_number, &page);
        let removal = state.reader.removal_menu_for_page(page_number, &page);
        dom::paint_layer(&document, layer, &regions, removal.as_ref())
    }

    #[wasm_bindgen(js_name = clickOverlay)]
    pub fn click_overlay(&self, highlight_id: &str) {
        self.state
            .borrow_mut()
            .reader
            .click_overlay(&HighlightId::from(highlight_id));
    }

    #[wasm_bindgen(js_name = clickElsewhere)]
    pub fn click_elsewhere(&self) {
        self.state.borrow_mut().reader.click_elsewhere();
    }

    #[wasm_bindgen(getter, js_name = activeHighlight)]
    pub fn active_highlight(&self) -> Option<String> {
        self.state
            .borrow()
            .reader
            .active_highlight()
            .map(|id| id.to_string())
    }

    /// Remove a highlight. It disappears at once and comes back if the
    /// server refuses.
    pub async fn remove(&self, highlight_id: &str) -> Result<(), JsValue> {
        let id = HighlightId::from(highlight_id);
        let ticket = self
            .state
            .borrow_mut()
            .reader
            .begin_remove(&id)
            .map_err(js_err)?;

        let outcome = self.store.delete(&id).await;
        self.state
            .borrow_mut()
            .reader
            .finish_remove(ticket, outcome.is_ok())
            .map_err(js_err)?;
        outcome.map_err(JsValue::from)
    }

    /// Remove the highlight whose menu is open. Resolves to `false` when no
    /// menu was open.
    #[wasm_bindgen(js_name = removeActive)]
    pub async fn remove_active(&self) -> Result<bool, JsValue> {
        let active = self.active_highlight();
        match active {
            Some(id) => self.remove(&id).await.map(|_| true),
            None => Ok(false),
        }
    }

    // ---- viewport ----

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.state.borrow().viewport.scale()
    }

    #[wasm_bindgen(getter, js_name = zoomPercent)]
    pub fn zoom_percent(&self) -> u32 {
        self.state.borrow().viewport.zoom_percent()
    }

    #[wasm_bindgen(getter, js_name = isMobile)]
    pub fn is_mobile(&self) -> bool {
        self.state.borrow().viewport.layout() == LayoutMode::Mobile
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) -> f64 {
        self.state.borrow_mut().viewport.zoom_in()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) -> f64 {
        self.state.borrow_mut().viewport.zoom_out()
    }

    /// Window resize event
    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&self) {
        self.state
            .borrow_mut()
            .viewport
            .on_resize(js_sys::Date::now());
    }

    /// Poll from a timer after `onResize`. Returns true when the scale
    /// changed and pages must be re-rendered.
    #[wasm_bindgen(js_name = pollResize)]
    pub fn poll_resize(&self, window_width: f64) -> bool {
        self.state
            .borrow_mut()
            .viewport
            .poll_resize(js_sys::Date::now(), window_width)
    }

    // ---- document ----

    #[wasm_bindgen(js_name = documentLoaded)]
    pub fn document_loaded(&self, num_pages: u32) {
        self.state
            .borrow_mut()
            .viewport
            .document_mut()
            .loaded(num_pages);
    }

    #[wasm_bindgen(js_name = documentFailed)]
    pub fn document_failed(&self, message: Option<String>) {
        self.state
            .borrow_mut()
            .viewport
            .document_mut()
            .failed(message.as_deref());
    }

    /// Returns the new reload key
    pub fn retry(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.viewport.document_mut().retry();
        state.pages.clear();
        state.viewport.document().retry_count()
    }

    #[wasm_bindgen(js_name = documentState)]
    pub fn document_state(&self) -> Result<JsValue, JsValue> {
        to_js(self.state.borrow().viewport.document().state())
    }

    /// Number of thumbnails to render in the preview strip
    #[wasm_bindgen(getter, js_name = previewPageCount)]
    pub fn preview_page_count(&self) -> u32 {
        let state = self.state.borrow();
        if !state.viewport.layout().shows_preview() {
            return 0;
        }
        preview_page_count(state.viewport.document().num_pages())
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_failed_create_still_clears_selection() {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let page = document.create_element("div").unwrap();
        page.set_attribute("style", "width: 600px; height: 800px;").unwrap();
        page.set_text_content(Some("Cellular respiration releases energy"));
        document.body().unwrap().append_child(&page).unwrap();

        // Nothing listens on the discard port, so the create request fails
        let reader = ReaderHandle::new("42", "http://127.0.0.1:9/api", 1280.0, Some(1)).unwrap();
        reader.register_page(1, page.clone());

        let range = document.create_range().unwrap();
        range.select_node_contents(&page).unwrap();
        let selection = window.get_selection().unwrap().unwrap();
        selection.remove_all_ranges().unwrap();
        selection.add_range(&range).unwrap();
        assert!(!reader.on_selection().unwrap().is_null());

        assert!(reader.confirm("highlight").await.is_err());
        assert_eq!(selection.range_count(), 0);
        assert_eq!(js_sys::Array::from(&reader.highlights().unwrap()).length(), 0);
    }
}
