//! Persistence seam for highlights
//!
//! The REST client and the browser fetch adapter implement [`HighlightStore`].
//! Futures are not required to be `Send` because the browser's are not.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reader_types::{Highlight, HighlightId, NewHighlight, RecordId};
use thiserror::Error;

#[async_trait(?Send)]
pub trait HighlightStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `GET /reading/highlights/{bookId}/`
    async fn list(&self, book_id: &str) -> Result<Vec<Highlight>, Self::Error>;

    /// `POST /reading/highlights/{bookId}/`
    async fn create(&self, book_id: &str, highlight: &NewHighlight)
        -> Result<Highlight, Self::Error>;

    /// `DELETE /reading/highlights/{highlightId}/detail/`. Removing an unknown
    /// highlight succeeds.
    async fn delete(&self, id: &HighlightId) -> Result<(), Self::Error>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryStoreError {
    #[error("Store unavailable")]
    Unavailable,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    books: BTreeMap<String, Vec<Highlight>>,
    offline: bool,
}

/// In-process store, used for offline reading and tests
#[derive(Debug, Default)]
pub struct MemoryHighlightStore {
    state: Mutex<MemoryState>,
}

impl MemoryHighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn count(&self, book_id: &str) -> usize {
        self.lock().books.get(book_id).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait(?Send)]
impl HighlightStore for MemoryHighlightStore {
    type Error = MemoryStoreError;

    async fn list(&self, book_id: &str) -> Result<Vec<Highlight>, Self::Error> {
        let state = self.lock();
        if state.offline {
            return Err(MemoryStoreError::Unavailable);
        }
        Ok(state.books.get(book_id).cloned().unwrap_or_default())
    }

    async fn create(
        &self,
        book_id: &str,
        highlight: &NewHighlight,
    ) -> Result<Highlight, Self::Error> {
        let mut state = self.lock();
        if state.offline {
            return Err(MemoryStoreError::Unavailable);
        }
        state.next_id += 1;
        let record = Highlight {
            id: RecordId::from(state.next_id),
            page_number: highlight.page_number,
            text_content: highlight.text_content.clone(),
            color: highlight.color,
            position_data: Some(highlight.position_data.clone()),
            created_at: None,
        };
        state
            .books
            .entry(book_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &HighlightId) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if state.offline {
            return Err(MemoryStoreError::Unavailable);
        }
        for highlights in state.books.values_mut() {
            highlights.retain(|h| &h.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_types::{HighlightStyle, PositionData, Rect};
    use tokio_test::block_on;

    fn payload(page: u32) -> NewHighlight {
        NewHighlight {
            page_number: page,
            text_content: "mitochondria".to_string(),
            color: HighlightStyle::default(),
            position_data: PositionData {
                rects: vec![Rect::new(0.1, 0.1, 0.3, 0.02)],
            },
        }
    }

    #[test]
    fn test_create_assigns_ids_per_store() {
        let store = MemoryHighlightStore::new();
        let a = block_on(store.create("book-1", &payload(1))).unwrap();
        let b = block_on(store.create("book-2", &payload(4))).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(block_on(store.list("book-1")).unwrap().len(), 1);
        assert_eq!(block_on(store.list("book-2")).unwrap()[0].page_number, 4);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryHighlightStore::new();
        let a = block_on(store.create("book-1", &payload(1))).unwrap();
        block_on(store.delete(&a.id)).unwrap();
        block_on(store.delete(&a.id)).unwrap();
        assert_eq!(store.count("book-1"), 0);
    }

    #[test]
    fn test_offline_store_fails() {
        let store = MemoryHighlightStore::new();
        store.set_offline(true);
        assert_eq!(
            block_on(store.list("book-1")).unwrap_err(),
            MemoryStoreError::Unavailable
        );
    }
}
