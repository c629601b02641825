use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Unknown highlight color: {0}")]
    UnknownColor(String),

    #[error("Unknown annotation kind: {0}")]
    UnknownKind(String),

    #[error("Invalid persisted session: {0}")]
    PersistedSession(#[from] serde_json::Error),
}
