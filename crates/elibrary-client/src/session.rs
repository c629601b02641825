//! Session context shared between the client and its owner
//!
//! The session is created explicitly and handed to [`ApiClient`](crate::ApiClient);
//! there is no process-wide instance. On native targets it persists as a JSON
//! file in the same envelope the browser keeps in localStorage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use reader_types::{AuthSession, AUTH_STORAGE_KEY};
use tracing::debug;

use crate::error::{ClientError, Result};

pub type SharedSession = Arc<RwLock<AuthSession>>;

pub fn shared(session: AuthSession) -> SharedSession {
    Arc::new(RwLock::new(session))
}

/// Snapshot of the session, tolerating a poisoned lock
pub fn snapshot(session: &SharedSession) -> AuthSession {
    session.read().unwrap_or_else(|e| e.into_inner()).clone()
}

pub fn update<F: FnOnce(&mut AuthSession)>(session: &SharedSession, f: F) {
    let mut guard = session.write().unwrap_or_else(|e| e.into_inner());
    f(&mut guard);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/elibrary/elibrary-auth-v2.json`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or(ClientError::NoSessionDir)?;
        Ok(Self::new(
            dir.join("elibrary").join(format!("{AUTH_STORAGE_KEY}.json")),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields an empty session. Either way the result is
    /// hydrated.
    pub fn load(&self) -> Result<AuthSession> {
        match fs::read_to_string(&self.path) {
            Ok(json) => {
                debug!(path = %self.path.display(), "Loaded session");
                Ok(AuthSession::from_persisted_json(&json)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut session = AuthSession::new();
                session.mark_hydrated();
                Ok(session)
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = session.to_persisted_json()?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "Saved session");
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> ClientError {
        ClientError::SessionIo {
            path: self.path.clone(),
            source,
        }
    }
}
