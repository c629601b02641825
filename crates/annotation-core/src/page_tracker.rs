//! Scroll-driven current page detection
//!
//! Runs on every scroll event, so it only walks the rendered pages once and
//! keeps a single page number as state.

use crate::geometry::{PageBox, ScreenRect};

/// Vertical overlap between a page and the scroll container, in pixels
pub fn visible_height(page: &PageBox, viewport: &ScreenRect) -> f64 {
    let top = page.top.max(viewport.top);
    let bottom = page.bottom().min(viewport.bottom());
    (bottom - top).max(0.0)
}

#[derive(Debug, Clone)]
pub struct CurrentPageTracker {
    current: u32,
}

impl Default for CurrentPageTracker {
    fn default() -> Self {
        Self { current: 1 }
    }
}

impl CurrentPageTracker {
    pub fn new(initial_page: u32) -> Self {
        Self {
            current: initial_page.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Jump without scrolling (initial page changed by the host)
    pub fn set(&mut self, page: u32) {
        self.current = page.max(1);
    }

    /// Recompute the most visible page. Returns the new page only when it
    /// changed. Ties go to the earliest page in iteration order; when nothing
    /// overlaps the viewport the current page is kept.
    pub fn update<I>(&mut self, viewport: &ScreenRect, pages: I) -> Option<u32>
    where
        I: IntoIterator<Item = (u32, PageBox)>,
    {
        let mut best: Option<(u32, f64)> = None;
        for (page, bounds) in pages {
            let visible = visible_height(&bounds, viewport);
            if visible > best.map_or(0.0, |(_, v)| v) {
                best = Some((page, visible));
            }
        }

        match best {
            Some((page, _)) if page != self.current => {
                self.current = page;
                Some(page)
            }
            _ => None,
        }
    }
}
