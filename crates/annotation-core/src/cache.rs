//! Local highlight list with tentative changes
//!
//! A change is applied immediately and recorded with a [`Ticket`]. Once the
//! backend answers, the caller either confirms the ticket (the change stays)
//! or reverts it (the list is restored as it was before the change).

use reader_types::{Highlight, HighlightId};

use crate::error::AnnotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub enum CacheChange {
    Insert(Highlight),
    Remove(HighlightId),
}

#[derive(Debug, Clone)]
enum Undo {
    Drop(HighlightId),
    Restore { index: usize, highlight: Highlight },
}

#[derive(Debug, Clone)]
struct Pending {
    ticket: Ticket,
    undo: Undo,
}

#[derive(Debug, Clone, Default)]
pub struct HighlightCache {
    highlights: Vec<Highlight>,
    pending: Vec<Pending>,
    next_ticket: u64,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list with a fresh fetch.
    ///
    /// Pending changes survive: a record whose removal is still in flight
    /// stays hidden (and is restored in its fetched form on revert), and a
    /// tentative insert the fetch does not know about is kept.
    pub fn replace_all(&mut self, highlights: Vec<Highlight>) {
        let mut fresh = highlights;
        let mut tentative = Vec::new();
        for pending in &mut self.pending {
            match &mut pending.undo {
                Undo::Restore { index, highlight } => {
                    if let Some(pos) = fresh.iter().position(|h| h.id == highlight.id) {
                        *highlight = fresh.remove(pos);
                        *index = pos;
                    }
                }
                Undo::Drop(id) => {
                    if fresh.iter().all(|h| &h.id != id) {
                        if let Some(h) = self.highlights.iter().find(|h| &h.id == id) {
                            tentative.push(h.clone());
                        }
                    }
                }
            }
        }
        fresh.extend(tentative);
        self.highlights = fresh;
    }

    /// Insert a record the backend already accepted
    pub fn insert(&mut self, highlight: Highlight) {
        self.highlights.retain(|h| h.id != highlight.id);
        self.highlights.push(highlight);
    }

    pub fn all(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    pub fn get(&self, id: &HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| &h.id == id)
    }

    pub fn for_page(&self, page_number: u32) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .iter()
            .filter(move |h| h.page_number == page_number)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply a change tentatively
    pub fn apply(&mut self, change: CacheChange) -> Result<Ticket, AnnotationError> {
        let undo = match change {
            CacheChange::Insert(highlight) => {
                let id = highlight.id.clone();
                self.highlights.push(highlight);
                Undo::Drop(id)
            }
            CacheChange::Remove(id) => {
                let index = self
                    .highlights
                    .iter()
                    .position(|h| h.id == id)
                    .ok_or_else(|| AnnotationError::UnknownHighlight(id.clone()))?;
                let highlight = self.highlights.remove(index);
                Undo::Restore { index, highlight }
            }
        };

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.push(Pending { ticket, undo });
        Ok(ticket)
    }

    /// Keep a tentative change
    pub fn confirm(&mut self, ticket: Ticket) -> Result<(), AnnotationError> {
        self.take_pending(ticket).map(|_| ())
    }

    /// Undo a tentative change
    pub fn revert(&mut self, ticket: Ticket) -> Result<(), AnnotationError> {
        match self.take_pending(ticket)? {
            Undo::Drop(id) => {
                if let Some(pos) = self.highlights.iter().rposition(|h| h.id == id) {
                    self.highlights.remove(pos);
                }
            }
            Undo::Restore { index, highlight } => {
                let index = index.min(self.highlights.len());
                self.highlights.insert(index, highlight);
            }
        }
        Ok(())
    }

    fn take_pending(&mut self, ticket: Ticket) -> Result<Undo, AnnotationError> {
        let pos = self
            .pending
            .iter()
            .position(|p| p.ticket == ticket)
            .ok_or(AnnotationError::UnknownTicket(ticket))?;
        Ok(self.pending.remove(pos).undo)
    }
}
