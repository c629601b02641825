//! Per-book reading session
//!
//! Owns the highlight list, the selection controller, the removal-menu state
//! and the current page for one open book. Every step is available as a
//! synchronous pair (`begin_*` / `finish_*`) so hosts that cannot hold a
//! mutable borrow across an await point (the wasm bindings) can drive it, and
//! as an `async` convenience taking a [`HighlightStore`].

use reader_types::{AnnotationKind, Highlight, HighlightColor, HighlightId, NewHighlight};
use tracing::{debug, info, warn};

use crate::cache::{CacheChange, HighlightCache, Ticket};
use crate::error::AnnotationError;
use crate::geometry::{PageBox, PageGeometry, ScreenRect};
use crate::overlay::{overlay_regions, removal_anchor, OverlayRegion, OverlaySelection, RemovalAnchor};
use crate::page_tracker::CurrentPageTracker;
use crate::selection::{AnnotationController, PendingAnnotation, SelectionEvent};
use crate::store::HighlightStore;

#[derive(Debug)]
pub struct ReaderSession {
    book_id: String,
    cache: HighlightCache,
    controller: AnnotationController,
    overlay: OverlaySelection,
    tracker: CurrentPageTracker,
}

impl ReaderSession {
    pub fn new(book_id: impl Into<String>, initial_page: u32) -> Self {
        Self {
            book_id: book_id.into(),
            cache: HighlightCache::new(),
            controller: AnnotationController::new(),
            overlay: OverlaySelection::new(),
            tracker: CurrentPageTracker::new(initial_page),
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn highlights(&self) -> &[Highlight] {
        self.cache.all()
    }

    pub fn highlights_on_page(&self, page_number: u32) -> impl Iterator<Item = &Highlight> {
        self.cache.for_page(page_number)
    }

    pub fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        debug!(book = %self.book_id, count = highlights.len(), "Highlights loaded");
        self.cache.replace_all(highlights);
        if let Some(active) = self.overlay.active().cloned() {
            if self.cache.get(&active).is_none() {
                self.overlay.clear();
            }
        }
    }

    pub async fn load<S: HighlightStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<usize, AnnotationError> {
        let highlights = store
            .list(&self.book_id)
            .await
            .map_err(AnnotationError::store)?;
        let count = highlights.len();
        self.set_highlights(highlights);
        Ok(count)
    }

    // ---- current page ----

    pub fn current_page(&self) -> u32 {
        self.tracker.current()
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.tracker.set(page);
    }

    /// Scroll handler. Returns the new current page when it changed.
    pub fn on_scroll<G: PageGeometry + ?Sized>(
        &mut self,
        viewport: &ScreenRect,
        geometry: &G,
    ) -> Option<u32> {
        // No visible page (all unregistered mid re-render) keeps the current
        // page instead of snapping back to page 1
        let changed = self.tracker.update(viewport, geometry.page_boxes());
        if let Some(page) = changed {
            debug!(book = %self.book_id, page, "Current page changed");
        }
        changed
    }

    // ---- selection flow ----

    pub fn color(&self) -> HighlightColor {
        self.controller.color()
    }

    pub fn set_color(&mut self, color: HighlightColor) {
        self.controller.set_color(color);
    }

    pub fn pending(&self) -> Option<&PendingAnnotation> {
        self.controller.pending()
    }

    /// Text selection finished. Opening the menu closes any removal menu.
    pub fn on_selection(&mut self, event: &SelectionEvent) -> Option<&PendingAnnotation> {
        if self.controller.on_selection(event) {
            self.overlay.clear();
        }
        self.controller.pending()
    }

    pub fn dismiss_selection(&mut self) {
        self.controller.dismiss();
    }

    /// Build the payload for the pending selection against the current page.
    /// The menu is closed whatever the outcome.
    pub fn begin_create<G: PageGeometry + ?Sized>(
        &mut self,
        kind: AnnotationKind,
        client_rects: &[ScreenRect],
        geometry: &G,
    ) -> Option<NewHighlight> {
        let page = self.tracker.current();
        let payload = self.controller.confirm(kind, page, client_rects, geometry);
        if payload.is_none() {
            debug!(book = %self.book_id, page, "Highlight creation abandoned");
        }
        payload
    }

    /// Record the backend's copy of a created highlight
    pub fn finish_create(&mut self, highlight: Highlight) {
        info!(
            book = %self.book_id,
            id = %highlight.id,
            page = highlight.page_number,
            "Highlight created"
        );
        self.cache.insert(highlight);
    }

    /// Confirm the pending selection and persist it. `Ok(None)` means there
    /// was nothing to create. Failures are returned and not retried.
    pub async fn confirm<S, G>(
        &mut self,
        kind: AnnotationKind,
        client_rects: &[ScreenRect],
        geometry: &G,
        store: &S,
    ) -> Result<Option<Highlight>, AnnotationError>
    where
        S: HighlightStore + ?Sized,
        G: PageGeometry + ?Sized,
    {
        let Some(payload) = self.begin_create(kind, client_rects, geometry) else {
            return Ok(None);
        };
        match store.create(&self.book_id, &payload).await {
            Ok(highlight) => {
                self.finish_create(highlight.clone());
                Ok(Some(highlight))
            }
            Err(e) => {
                warn!(book = %self.book_id, error = %e, "Failed to save highlight");
                Err(AnnotationError::store(e))
            }
        }
    }

    // ---- overlays and removal ----

    pub fn overlays_for_page(&self, page_number: u32, page: &PageBox) -> Vec<OverlayRegion> {
        overlay_regions(self.cache.all(), page_number, page)
    }

    /// Removal button for the active highlight, if it lives on this page
    pub fn removal_menu_for_page(&self, page_number: u32, page: &PageBox) -> Option<RemovalAnchor> {
        let active = self.overlay.active()?;
        let highlight = self.cache.get(active)?;
        (highlight.page_number == page_number).then(|| removal_anchor(highlight, page))
    }

    pub fn active_highlight(&self) -> Option<&HighlightId> {
        self.overlay.active()
    }

    pub fn click_overlay(&mut self, id: &HighlightId) {
        self.overlay.toggle(id);
    }

    pub fn click_elsewhere(&mut self) {
        self.overlay.clear();
    }

    /// Drop the highlight locally and close its menu. Settle the returned
    /// ticket with [`finish_remove`](Self::finish_remove).
    pub fn begin_remove(&mut self, id: &HighlightId) -> Result<Ticket, AnnotationError> {
        let ticket = self.cache.apply(CacheChange::Remove(id.clone()))?;
        self.overlay.forget(id);
        Ok(ticket)
    }

    /// Keep the removal when the backend accepted it, restore otherwise
    pub fn finish_remove(&mut self, ticket: Ticket, accepted: bool) -> Result<(), AnnotationError> {
        if accepted {
            self.cache.confirm(ticket)
        } else {
            self.cache.revert(ticket)
        }
    }

    pub async fn remove<S: HighlightStore + ?Sized>(
        &mut self,
        id: &HighlightId,
        store: &S,
    ) -> Result<(), AnnotationError> {
        let ticket = self.begin_remove(id)?;
        match store.delete(id).await {
            Ok(()) => {
                info!(book = %self.book_id, id = %id, "Highlight removed");
                self.finish_remove(ticket, true)
            }
            Err(e) => {
                warn!(book = %self.book_id, id = %id, error = %e, "Failed to remove highlight");
                self.finish_remove(ticket, false)?;
                Err(AnnotationError::store(e))
            }
        }
    }

    /// Remove whichever highlight has its menu open
    pub async fn remove_active<S: HighlightStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<bool, AnnotationError> {
        let Some(id) = self.overlay.active().cloned() else {
            return Ok(false);
        };
        self.remove(&id, store).await?;
        Ok(true)
    }
}
