//! Authenticated session context
//!
//! The session is an explicit value handed to the API clients. Only the user
//! and the token pair are persisted; `hydrated` records whether a load from
//! storage has been attempted and is never written out.

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::types::RecordId;

/// Storage key shared by the browser and native persistence layers
pub const AUTH_STORAGE_KEY: &str = "elibrary-auth-v2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(skip)]
    hydrated: bool,
}

/// Envelope written to storage
#[derive(Serialize, Deserialize)]
struct Persisted {
    state: AuthSession,
    #[serde(default)]
    version: u32,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session(
        &mut self,
        user: UserProfile,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) {
        self.user = Some(user);
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
    }

    /// Replace tokens after a refresh; the old refresh token survives when the
    /// server does not rotate it
    pub fn set_tokens(&mut self, access_token: impl Into<String>, refresh_token: Option<String>) {
        self.access_token = Some(access_token.into());
        if let Some(refresh) = refresh_token {
            self.refresh_token = Some(refresh);
        }
    }

    pub fn set_user(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    pub fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
    }

    pub fn mark_hydrated(&mut self) {
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn to_persisted_json(&self) -> Result<String, TypesError> {
        let envelope = Persisted {
            state: self.clone(),
            version: 0,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Restore from storage. The result is always marked hydrated.
    pub fn from_persisted_json(json: &str) -> Result<Self, TypesError> {
        let envelope: Persisted = serde_json::from_str(json)?;
        let mut session = envelope.state;
        session.mark_hydrated();
        Ok(session)
    }
}
