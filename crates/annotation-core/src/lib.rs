//! Annotation overlay mapping for the e-library reader
//!
//! Turns text selections on a rendered PDF page into resolution-independent
//! highlight rectangles, and projects stored rectangles back onto the page at
//! whatever scale it is currently drawn.
//!
//! - [`geometry`]: pixel <-> fraction conversion against the live page box
//! - [`overlay`]: regions and the removal affordance for a page
//! - [`selection`]: the selection -> menu -> annotation state machine
//! - [`page_tracker`]: scroll-driven current page
//! - [`viewport`]: zoom, responsive scale, debounced resize, document state
//! - [`cache`]: local highlight list with tentative changes
//! - [`store`]: persistence seam
//! - [`reader`]: one open book, tying the above together

pub mod cache;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod page_tracker;
pub mod reader;
pub mod selection;
pub mod store;
pub mod viewport;

pub use cache::{CacheChange, HighlightCache, Ticket};
pub use error::AnnotationError;
pub use geometry::{
    normalize_rect, normalize_rects, project_rect, PageBox, PageGeometry, PixelRect, ScreenRect,
};
pub use overlay::{OverlayMode, OverlayRegion, OverlaySelection, RemovalAnchor};
pub use page_tracker::CurrentPageTracker;
pub use reader::ReaderSession;
pub use selection::{AnnotationController, ControllerState, MenuAnchor, PendingAnnotation, SelectionEvent};
pub use store::{HighlightStore, MemoryHighlightStore, MemoryStoreError};
pub use viewport::{DocumentLoad, DocumentState, LayoutMode, ReaderViewport};
