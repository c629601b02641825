//! DOM access: page element geometry, the live text selection, and overlay
//! painting

use std::collections::BTreeMap;

use annotation_core::{
    OverlayRegion, PageBox, PageGeometry, RemovalAnchor, ScreenRect, SelectionEvent,
};
use wasm_bindgen::JsValue;
use web_sys::{Document, DomRect, Element};

pub const OVERLAY_CLASS: &str = "highlight-overlay";
pub const REMOVE_BUTTON_CLASS: &str = "highlight-remove";
pub const HIGHLIGHT_ID_ATTR: &str = "data-highlight-id";

pub fn screen_rect(rect: &DomRect) -> ScreenRect {
    ScreenRect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Rendered page elements by page number. Geometry is read from the element
/// on every call so zoom and resize are always reflected.
#[derive(Default)]
pub struct DomPageRegistry {
    pages: BTreeMap<u32, Element>,
}

impl DomPageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, page_number: u32, element: Element) {
        self.pages.insert(page_number, element);
    }

    pub fn unregister(&mut self, page_number: u32) {
        self.pages.remove(&page_number);
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageGeometry for DomPageRegistry {
    fn page_box(&self, page_number: u32) -> Option<PageBox> {
        self.pages
            .get(&page_number)
            .map(|el| screen_rect(&el.get_bounding_client_rect()))
    }

    fn page_boxes(&self) -> Vec<(u32, PageBox)> {
        self.pages
            .iter()
            .map(|(page, el)| (*page, screen_rect(&el.get_bounding_client_rect())))
            .collect()
    }
}

/// Current window selection with one rect per line fragment. `None` when
/// nothing is selected.
pub fn live_selection() -> Result<Option<SelectionEvent>, JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let Some(selection) = window.get_selection()? else {
        return Ok(None);
    };
    if selection.range_count() == 0 {
        return Ok(None);
    }

    let text: String = selection.to_string().into();
    let range = selection.get_range_at(0)?;
    let mut client_rects = Vec::new();
    if let Some(list) = range.get_client_rects() {
        for i in 0..list.length() {
            if let Some(rect) = list.item(i) {
                client_rects.push(screen_rect(&rect));
            }
        }
    }

    Ok(Some(SelectionEvent { text, client_rects }))
}

pub fn clear_selection() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    if let Some(selection) = window.get_selection()? {
        selection.remove_all_ranges()?;
    }
    Ok(())
}

/// Replace the contents of a page's overlay layer. The layer must be
/// positioned over the page so percentage offsets line up.
pub fn paint_layer(
    document: &Document,
    layer: &Element,
    regions: &[OverlayRegion],
    removal: Option<&RemovalAnchor>,
) -> Result<(), JsValue> {
    layer.set_inner_html("");

    for region in regions {
        let el = document.create_element("div")?;
        el.set_class_name(OVERLAY_CLASS);
        el.set_attribute(HIGHLIGHT_ID_ATTR, region.highlight_id.as_str())?;
        el.set_attribute("title", &region.title)?;
        el.set_attribute(
            "style",
            &format!("position: absolute; cursor: pointer; {}", region.css()),
        )?;
        layer.append_child(&el)?;
    }

    if let Some(anchor) = removal {
        let button = document.create_element("button")?;
        button.set_class_name(REMOVE_BUTTON_CLASS);
        button.set_attribute(HIGHLIGHT_ID_ATTR, anchor.highlight_id.as_str())?;
        button.set_attribute("style", &format!("position: absolute; {}", anchor.css()))?;
        button.set_text_content(Some("Remove"));
        layer.append_child(&button)?;
    }

    Ok(())
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use annotation_core::OverlayMode;
    use reader_types::{HighlightId, Rect};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::HtmlElement;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    fn sized_page(document: &Document) -> Element {
        let page = document.create_element("div").unwrap();
        page.set_attribute(
            "style",
            "position: absolute; left: 0; top: 0; width: 600px; height: 800px;",
        )
        .unwrap();
        document.body().unwrap().append_child(&page).unwrap();
        page
    }

    #[wasm_bindgen_test]
    fn test_registry_reads_live_geometry() {
        let document = document();
        let page = sized_page(&document);

        let mut registry = DomPageRegistry::new();
        registry.register(1, page.clone());
        assert_eq!(registry.page_box(1).unwrap().width, 600.0);

        page.dyn_ref::<HtmlElement>()
            .unwrap()
            .style()
            .set_property("width", "900px")
            .unwrap();
        assert_eq!(registry.page_box(1).unwrap().width, 900.0);

        registry.unregister(1);
        assert!(registry.page_box(1).is_none());
    }

    #[wasm_bindgen_test]
    fn test_paint_layer_replaces_children() {
        let document = document();
        let layer = document.create_element("div").unwrap();
        let region = OverlayRegion {
            highlight_id: HighlightId::from("9"),
            index: 0,
            rect: Rect::new(0.1, 0.2, 0.3, 0.02),
            frame: annotation_core::PixelRect {
                left: 60.0,
                top: 160.0,
                width: 180.0,
                height: 16.0,
            },
            mode: OverlayMode::Fill {
                color: "rgba(255, 235, 59, 0.3)".to_string(),
            },
            title: "x".to_string(),
        };

        paint_layer(&document, &layer, &[region.clone(), region.clone()], None).unwrap();
        assert_eq!(layer.child_element_count(), 2);

        paint_layer(&document, &layer, &[region], None).unwrap();
        assert_eq!(layer.child_element_count(), 1);
        let child = layer.first_element_child().unwrap();
        assert_eq!(child.get_attribute(HIGHLIGHT_ID_ATTR).as_deref(), Some("9"));
    }
}
