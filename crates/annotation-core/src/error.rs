use reader_types::HighlightId;
use thiserror::Error;

use crate::cache::Ticket;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("Highlight {0} is not loaded")]
    UnknownHighlight(HighlightId),

    #[error("Change {0:?} is not pending")]
    UnknownTicket(Ticket),

    #[error("Highlight store failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AnnotationError {
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnnotationError::Store(Box::new(err))
    }
}
