//! Reader viewport: zoom, responsive scale, resize debouncing, page jumps and
//! document load state
//!
//! Time is passed in by the caller as milliseconds so the same code runs
//! against `performance.now()` in the browser and a fake clock in tests.

use serde::Serialize;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.5;
pub const SCALE_STEP: f64 = 0.1;
pub const DESKTOP_SCALE: f64 = 1.5;

pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;
/// Horizontal padding kept around the page on narrow screens (8px per side)
pub const MOBILE_PADDING_PX: f64 = 16.0;
pub const MOBILE_MIN_SCALE: f64 = 0.8;
pub const MOBILE_MAX_SCALE: f64 = 1.5;
/// Letter width in points, used when the real page width is not known yet
pub const DEFAULT_PAGE_WIDTH_PT: f64 = 612.0;
/// Mobile rescales smaller than this are ignored (browser chrome resizes)
pub const SCALE_HYSTERESIS: f64 = 0.05;

pub const RESIZE_DEBOUNCE_MS: f64 = 100.0;
pub const PREVIEW_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    Mobile,
    Desktop,
}

impl LayoutMode {
    pub fn for_width(window_width: f64) -> Self {
        if window_width < MOBILE_BREAKPOINT_PX {
            LayoutMode::Mobile
        } else {
            LayoutMode::Desktop
        }
    }

    /// Highlight overlays and the annotation menu are desktop-only
    pub fn shows_annotations(&self) -> bool {
        matches!(self, LayoutMode::Desktop)
    }

    pub fn shows_preview(&self) -> bool {
        matches!(self, LayoutMode::Desktop)
    }
}

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Scale to use for a window width given the scale currently applied
pub fn responsive_scale(window_width: f64, current: f64) -> f64 {
    match LayoutMode::for_width(window_width) {
        LayoutMode::Desktop => DESKTOP_SCALE,
        LayoutMode::Mobile => {
            let ideal = (window_width - MOBILE_PADDING_PX) / DEFAULT_PAGE_WIDTH_PT;
            let target = ideal.clamp(MOBILE_MIN_SCALE, MOBILE_MAX_SCALE);
            if (current - target).abs() > SCALE_HYSTERESIS {
                target
            } else {
                current
            }
        }
    }
}

/// Trailing-edge debouncer
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    /// Record an event; restarts the quiet period
    pub fn schedule(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once after the quiet period has elapsed
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Parse a page-jump input; only pages inside the document are accepted
pub fn page_jump(input: &str, num_pages: u32) -> Option<u32> {
    let page: u32 = input.trim().parse().ok()?;
    (1..=num_pages).contains(&page).then_some(page)
}

/// Number of thumbnails in the preview strip
pub fn preview_page_count(num_pages: u32) -> u32 {
    num_pages.min(PREVIEW_PAGE_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentState {
    Loading,
    Loaded { num_pages: u32 },
    Failed { message: String },
}

/// Document load lifecycle as reported by the page render host
#[derive(Debug, Clone)]
pub struct DocumentLoad {
    state: DocumentState,
    retry_count: u32,
}

impl Default for DocumentLoad {
    fn default() -> Self {
        Self {
            state: DocumentState::Loading,
            retry_count: 0,
        }
    }
}

impl DocumentLoad {
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn num_pages(&self) -> u32 {
        match self.state {
            DocumentState::Loaded { num_pages } => num_pages,
            _ => 0,
        }
    }

    /// Key that changes on every retry, forcing the host to reload
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn loaded(&mut self, num_pages: u32) {
        self.state = DocumentState::Loaded { num_pages };
    }

    pub fn failed(&mut self, message: Option<&str>) {
        self.state = DocumentState::Failed {
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or("Failed to load PDF")
                .to_string(),
        };
    }

    pub fn retry(&mut self) {
        self.state = DocumentState::Loading;
        self.retry_count += 1;
    }
}

#[derive(Debug, Clone)]
pub struct ReaderViewport {
    scale: f64,
    layout: LayoutMode,
    resize: Debouncer,
    document: DocumentLoad,
}

impl Default for ReaderViewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            layout: LayoutMode::Desktop,
            resize: Debouncer::new(RESIZE_DEBOUNCE_MS),
            document: DocumentLoad::default(),
        }
    }
}

impl ReaderViewport {
    pub fn new(window_width: f64) -> Self {
        let mut viewport = Self::default();
        viewport.apply_window_width(window_width);
        viewport
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.scale = clamp_scale(self.scale + SCALE_STEP);
        self.scale
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.scale = clamp_scale(self.scale - SCALE_STEP);
        self.scale
    }

    /// Re-evaluate layout and scale for a window width. Returns true when the
    /// scale changed.
    pub fn apply_window_width(&mut self, window_width: f64) -> bool {
        self.layout = LayoutMode::for_width(window_width);
        let next = responsive_scale(window_width, self.scale);
        let changed = (next - self.scale).abs() > f64::EPSILON;
        self.scale = next;
        changed
    }

    pub fn on_resize(&mut self, now_ms: f64) {
        self.resize.schedule(now_ms);
    }

    /// Apply a pending resize once the debounce window has passed
    pub fn poll_resize(&mut self, now_ms: f64, window_width: f64) -> bool {
        if self.resize.fire_if_due(now_ms) {
            self.apply_window_width(window_width)
        } else {
            false
        }
    }

    pub fn document(&self) -> &DocumentLoad {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DocumentLoad {
        &mut self.document
    }
}
