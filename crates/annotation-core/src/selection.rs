//! Selection-to-annotation state machine
//!
//! `Idle` -> `MenuOpen` on a non-empty selection, back to `Idle` on confirm or
//! dismiss. A new selection while the menu is open replaces the pending one.

use reader_types::{AnnotationKind, HighlightColor, HighlightStyle, NewHighlight, PositionData};
use serde::Serialize;

use crate::geometry::{normalize_rects, selection_bounds, PageGeometry, ScreenRect};

/// Distance between the top of the selection and the floating menu
pub const MENU_OFFSET_PX: f64 = 50.0;

/// A text selection reported by the host after mouseup/touchend
#[derive(Debug, Clone, Default)]
pub struct SelectionEvent {
    pub text: String,
    /// One rectangle per visual line fragment, in viewport pixels
    pub client_rects: Vec<ScreenRect>,
}

/// Screen-space point the menu is centred on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MenuAnchor {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAnnotation {
    pub text: String,
    pub anchor: MenuAnchor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ControllerState {
    #[default]
    Idle,
    MenuOpen(PendingAnnotation),
}

#[derive(Debug, Default)]
pub struct AnnotationController {
    state: ControllerState,
    color: HighlightColor,
}

impl AnnotationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingAnnotation> {
        match &self.state {
            ControllerState::MenuOpen(pending) => Some(pending),
            ControllerState::Idle => None,
        }
    }

    pub fn is_menu_open(&self) -> bool {
        self.pending().is_some()
    }

    pub fn color(&self) -> HighlightColor {
        self.color
    }

    pub fn set_color(&mut self, color: HighlightColor) {
        self.color = color;
    }

    /// Feed a selection event. Returns true when the menu is open afterwards.
    pub fn on_selection(&mut self, event: &SelectionEvent) -> bool {
        let text = event.text.trim();
        let bounds = match selection_bounds(&event.client_rects) {
            Some(bounds) if !text.is_empty() => bounds,
            _ => {
                self.dismiss();
                return false;
            }
        };

        self.state = ControllerState::MenuOpen(PendingAnnotation {
            text: text.to_string(),
            anchor: MenuAnchor {
                x: bounds.left + bounds.width / 2.0,
                y: bounds.top - MENU_OFFSET_PX,
            },
        });
        true
    }

    pub fn dismiss(&mut self) {
        self.state = ControllerState::Idle;
    }

    /// Build the creation payload for the pending selection and return to
    /// `Idle`.
    ///
    /// `client_rects` must be read from the live selection and the page box is
    /// looked up now, since the scale may have changed since the menu opened.
    /// Without a menu, without a registered page, or without any fragment the
    /// flow is abandoned and `None` is returned.
    pub fn confirm<G: PageGeometry + ?Sized>(
        &mut self,
        kind: AnnotationKind,
        page_number: u32,
        client_rects: &[ScreenRect],
        geometry: &G,
    ) -> Option<NewHighlight> {
        let pending = match std::mem::take(&mut self.state) {
            ControllerState::MenuOpen(pending) => pending,
            ControllerState::Idle => return None,
        };

        let page = geometry.page_box(page_number)?;
        let rects: Vec<_> = normalize_rects(client_rects, &page)
            .into_iter()
            .map(|r| r.on_page(page_number))
            .collect();
        if rects.is_empty() {
            return None;
        }

        Some(NewHighlight {
            page_number,
            text_content: pending.text,
            color: HighlightStyle::new(self.color, kind),
            position_data: PositionData { rects },
        })
    }
}
