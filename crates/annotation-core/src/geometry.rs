//! Coordinate transformation between screen pixels and page fractions
//!
//! Selections arrive as client rectangles (viewport pixels, top-left origin).
//! They are stored as fractions of the page box that was live when the user
//! confirmed, which makes them independent of zoom and window size.

use std::collections::BTreeMap;

use reader_types::Rect;
use serde::{Deserialize, Serialize};

/// Rectangle in viewport pixels, as reported by `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Bounding box of a rendered page element
pub type PageBox = ScreenRect;

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// A page box can only be divided by when both sides are positive
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        ScreenRect {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

/// Rectangle in pixels relative to the page's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Live access to page element geometry.
///
/// Implementations must answer from the current layout on every call; the
/// browser implementation reads `getBoundingClientRect` each time.
pub trait PageGeometry {
    fn page_box(&self, page_number: u32) -> Option<PageBox>;

    /// All registered pages in ascending page order
    fn page_boxes(&self) -> Vec<(u32, PageBox)>;
}

impl PageGeometry for BTreeMap<u32, PageBox> {
    fn page_box(&self, page_number: u32) -> Option<PageBox> {
        self.get(&page_number).copied()
    }

    fn page_boxes(&self) -> Vec<(u32, PageBox)> {
        self.iter().map(|(page, b)| (*page, *b)).collect()
    }
}

/// Convert one client rectangle to page fractions
pub fn normalize_rect(client: &ScreenRect, page: &PageBox) -> Rect {
    Rect::new(
        (client.left - page.left) / page.width,
        (client.top - page.top) / page.height,
        client.width / page.width,
        client.height / page.height,
    )
}

/// Convert every line fragment of a selection. Returns nothing when the page
/// box cannot be divided by.
pub fn normalize_rects(clients: &[ScreenRect], page: &PageBox) -> Vec<Rect> {
    if !page.is_usable() {
        return Vec::new();
    }
    clients.iter().map(|c| normalize_rect(c, page)).collect()
}

/// Project a stored fraction back to pixels at the page's current size
pub fn project_rect(rect: &Rect, page: &PageBox) -> PixelRect {
    PixelRect {
        left: rect.x * page.width,
        top: rect.y * page.height,
        width: rect.width * page.width,
        height: rect.height * page.height,
    }
}

/// Smallest rectangle covering all fragments
pub fn selection_bounds(clients: &[ScreenRect]) -> Option<ScreenRect> {
    let (first, rest) = clients.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_center_fragment() {
        let page = ScreenRect::new(100.0, 50.0, 600.0, 800.0);
        let client = ScreenRect::new(250.0, 450.0, 300.0, 16.0);
        let rect = normalize_rect(&client, &page);
        assert!((rect.x - 0.25).abs() < 1e-9);
        assert!((rect.y - 0.5).abs() < 1e-9);
        assert!((rect.width - 0.5).abs() < 1e-9);
        assert!((rect.height - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_two_line_selection_gives_two_rects() {
        let page = ScreenRect::new(0.0, 0.0, 612.0, 792.0);
        let lines = [
            ScreenRect::new(200.0, 100.0, 350.0, 14.0),
            ScreenRect::new(72.0, 116.0, 120.0, 14.0),
        ];
        let rects = normalize_rects(&lines, &page);
        assert_eq!(rects.len(), 2);
        assert!(rects[1].x < rects[0].x);
    }

    #[test]
    fn test_degenerate_page_box_yields_nothing() {
        let lines = [ScreenRect::new(10.0, 10.0, 10.0, 10.0)];
        assert!(normalize_rects(&lines, &ScreenRect::new(0.0, 0.0, 0.0, 500.0)).is_empty());
        assert!(normalize_rects(&lines, &ScreenRect::new(0.0, 0.0, f64::NAN, 500.0)).is_empty());
    }

    #[test]
    fn test_project_at_double_scale() {
        let rect = Rect::new(0.1, 0.2, 0.3, 0.05);
        let at_1x = project_rect(&rect, &ScreenRect::new(0.0, 0.0, 612.0, 792.0));
        let at_2x = project_rect(&rect, &ScreenRect::new(40.0, -300.0, 1224.0, 1584.0));
        assert!((at_2x.left - 2.0 * at_1x.left).abs() < 1e-9);
        assert!((at_2x.top - 2.0 * at_1x.top).abs() < 1e-9);
        assert!((at_2x.width - 2.0 * at_1x.width).abs() < 1e-9);
        assert!((at_2x.height - 2.0 * at_1x.height).abs() < 1e-9);
    }

    #[test]
    fn test_selection_bounds() {
        assert!(selection_bounds(&[]).is_none());
        let bounds = selection_bounds(&[
            ScreenRect::new(200.0, 100.0, 350.0, 14.0),
            ScreenRect::new(72.0, 116.0, 120.0, 14.0),
        ])
        .unwrap();
        assert_eq!(bounds.left, 72.0);
        assert_eq!(bounds.top, 100.0);
        assert_eq!(bounds.right(), 550.0);
        assert_eq!(bounds.bottom(), 130.0);
    }

    #[test]
    fn test_btreemap_geometry_is_ordered() {
        let mut pages = BTreeMap::new();
        pages.insert(3, ScreenRect::new(0.0, 2000.0, 600.0, 800.0));
        pages.insert(1, ScreenRect::new(0.0, 0.0, 600.0, 800.0));
        let order: Vec<u32> = pages.page_boxes().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![1, 3]);
        assert!(pages.page_box(2).is_none());
    }
}
