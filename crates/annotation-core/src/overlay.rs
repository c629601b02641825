//! Overlay projection for stored highlights
//!
//! Every render pass re-derives pixel geometry from the page box, so overlays
//! follow zoom and resize without storing pixels anywhere.

use reader_types::{Highlight, HighlightId, Rect};
use serde::Serialize;

use crate::geometry::{project_rect, PageBox, PixelRect};

/// Thickness of the underline stripe in CSS pixels
pub const UNDERLINE_THICKNESS_PX: f64 = 3.0;

/// Gap between the removal button and the first rect, as a page fraction
const REMOVAL_MENU_GAP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OverlayMode {
    Fill { color: String },
    Underline { color: String, thickness_px: f64 },
}

/// One interactive region drawn over a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayRegion {
    pub highlight_id: HighlightId,
    /// Index of the rect within its highlight
    pub index: usize,
    /// Fractional geometry, used for percentage positioning
    pub rect: Rect,
    /// Pixel geometry at the page's current size
    pub frame: PixelRect,
    pub mode: OverlayMode,
    /// Tooltip text
    pub title: String,
}

impl OverlayRegion {
    /// Inline style for an absolutely positioned element inside the page
    pub fn css(&self) -> String {
        let position = format!(
            "left: {}%; top: {}%; width: {}%; height: {}%;",
            self.rect.x * 100.0,
            self.rect.y * 100.0,
            self.rect.width * 100.0,
            self.rect.height * 100.0
        );
        match &self.mode {
            OverlayMode::Fill { color } => format!("{} background-color: {};", position, color),
            OverlayMode::Underline {
                color,
                thickness_px,
            } => format!("{} border-bottom: {}px solid {};", position, thickness_px, color),
        }
    }
}

/// Build the regions for `page_number` from the highlights of a book.
///
/// Highlights stored without `position_data` cover the whole page; one whose
/// `position_data` carries no rects draws nothing.
pub fn overlay_regions<'a>(
    highlights: impl IntoIterator<Item = &'a Highlight>,
    page_number: u32,
    page: &PageBox,
) -> Vec<OverlayRegion> {
    let mut regions = Vec::new();
    for highlight in highlights
        .into_iter()
        .filter(|h| h.page_number == page_number)
    {
        let mode = if highlight.color.is_underline() {
            OverlayMode::Underline {
                color: highlight.color.color.stroke_css(),
                thickness_px: UNDERLINE_THICKNESS_PX,
            }
        } else {
            OverlayMode::Fill {
                color: highlight.color.color.fill_css(),
            }
        };

        for (index, rect) in effective_rects(highlight).iter().enumerate() {
            regions.push(OverlayRegion {
                highlight_id: highlight.id.clone(),
                index,
                rect: *rect,
                frame: project_rect(rect, page),
                mode: mode.clone(),
                title: highlight.text_content.clone(),
            });
        }
    }
    regions
}

fn effective_rects(highlight: &Highlight) -> &[Rect] {
    match &highlight.position_data {
        Some(position) => &position.rects,
        None => std::slice::from_ref(&Rect::FULL_PAGE),
    }
}

/// Position of the floating "remove" button for a highlight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalAnchor {
    pub highlight_id: HighlightId,
    /// Pixels from the page's left edge
    pub left: f64,
    /// Pixels from the page's top edge; the button sits above this line
    pub top: f64,
    pub left_percent: f64,
    pub top_percent: f64,
}

impl RemovalAnchor {
    pub fn css(&self) -> String {
        format!(
            "left: {}%; top: {}%; transform: translateY(-100%);",
            self.left_percent, self.top_percent
        )
    }
}

/// Anchor the removal affordance just above the first rect of the highlight,
/// or at the page top when it has none
pub fn removal_anchor(highlight: &Highlight, page: &PageBox) -> RemovalAnchor {
    let first = effective_rects(highlight)
        .first()
        .copied()
        .unwrap_or(Rect::FULL_PAGE);
    let top_fraction = first.y - REMOVAL_MENU_GAP;
    RemovalAnchor {
        highlight_id: highlight.id.clone(),
        left: first.x * page.width,
        top: top_fraction * page.height,
        left_percent: first.x * 100.0,
        top_percent: top_fraction * 100.0,
    }
}

/// Which highlight currently shows its removal affordance. At most one.
#[derive(Debug, Clone, Default)]
pub struct OverlaySelection {
    active: Option<HighlightId>,
}

impl OverlaySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&HighlightId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &HighlightId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Click on a region: open its menu, or close it if it was already open.
    /// Opening one highlight's menu closes any other.
    pub fn toggle(&mut self, id: &HighlightId) {
        if self.is_active(id) {
            self.active = None;
        } else {
            self.active = Some(id.clone());
        }
    }

    /// Click anywhere outside an overlay
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Drop the menu for a highlight that no longer exists
    pub fn forget(&mut self, id: &HighlightId) {
        if self.is_active(id) {
            self.active = None;
        }
    }
}
