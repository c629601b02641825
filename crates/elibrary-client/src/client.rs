use annotation_core::HighlightStore;
use async_trait::async_trait;
use reader_types::{
    Highlight, HighlightId, NewHighlight, ProgressUpdate, ReadingDashboard, ReadingProgress,
    ReadingSession, RecordId, SessionUpdate, UserProfile, DEFAULT_DASHBOARD_PERIOD,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::{self, SharedSession};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// REST client for the e-library backend
///
/// Every request carries `Authorization: Bearer <access>` when the shared
/// session holds a token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SharedSession) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        let token = session::snapshot(&self.session).access_token;
        debug!(%method, %url, authenticated = token.is_some(), "API request");

        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(%method, %url, status = status.as_u16(), "API request failed");
        Err(ClientError::Http {
            method: method.to_string(),
            url,
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.request(Method::GET, path);
        Ok(self.send(Method::GET, builder).await?.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(self.send(method, builder).await?.json().await?)
    }

    // ---- auth ----

    /// `POST /auth/login/`. Stores the returned user and tokens in the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile> {
        let response: LoginResponse = self
            .send_json(Method::POST, "/auth/login/", Some(credentials))
            .await?;
        info!(email = %response.user.email, "Signed in");
        let user = response.user.clone();
        session::update(&self.session, |s| {
            s.set_session(response.user, response.tokens.access, response.tokens.refresh)
        });
        Ok(user)
    }

    /// `GET /auth/me/`. Refreshes the cached user.
    pub async fn profile(&self) -> Result<UserProfile> {
        if !session::snapshot(&self.session).is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        let user: UserProfile = self.get_json("/auth/me/").await?;
        session::update(&self.session, |s| s.set_user(user.clone()));
        Ok(user)
    }

    /// `POST /auth/logout/` with the refresh token, then clear the session.
    /// The local session is cleared even if the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let refresh = session::snapshot(&self.session).refresh_token;
        let outcome = match refresh {
            Some(refresh_token) => {
                let body = serde_json::json!({ "refresh_token": refresh_token });
                let builder = self.request(Method::POST, "/auth/logout/").json(&body);
                self.send(Method::POST, builder).await.map(|_| ())
            }
            None => Ok(()),
        };
        session::update(&self.session, |s| s.clear());
        outcome
    }

    // ---- highlights ----

    pub async fn list_highlights(&self, book_id: &str) -> Result<Vec<Highlight>> {
        self.get_json(&format!("/reading/highlights/{book_id}/"))
            .await
    }

    pub async fn create_highlight(
        &self,
        book_id: &str,
        highlight: &NewHighlight,
    ) -> Result<Highlight> {
        self.send_json(
            Method::POST,
            &format!("/reading/highlights/{book_id}/"),
            Some(highlight),
        )
        .await
    }

    /// A highlight the server no longer has counts as removed
    pub async fn delete_highlight(&self, id: &HighlightId) -> Result<()> {
        let method = Method::DELETE;
        let builder = self.request(method.clone(), &format!("/reading/highlights/{id}/detail/"));
        match self.send(method, builder).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(%id, "Highlight already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ---- progress ----

    pub async fn progress(&self, book_id: &str) -> Result<ReadingProgress> {
        self.get_json(&format!("/reading/progress/{book_id}/")).await
    }

    pub async fn update_progress(
        &self,
        book_id: &str,
        update: &ProgressUpdate,
    ) -> Result<ReadingProgress> {
        self.send_json(
            Method::PATCH,
            &format!("/reading/progress/{book_id}/"),
            Some(update),
        )
        .await
    }

    /// `GET /reading/dashboard/?period=`; an empty period means the
    /// server's weekly window
    pub async fn dashboard(&self, period: &str) -> Result<ReadingDashboard> {
        let period = match period.trim() {
            "" => DEFAULT_DASHBOARD_PERIOD,
            p => p,
        };
        let builder = self
            .request(Method::GET, "/reading/dashboard/")
            .query(&[("period", period)]);
        Ok(self.send(Method::GET, builder).await?.json().await?)
    }

    // ---- reading sessions ----

    /// `GET /reading/sessions/{bookId}/active/`; the server creates one if
    /// none is open
    pub async fn active_session(&self, book_id: &str) -> Result<ReadingSession> {
        self.get_json(&format!("/reading/sessions/{book_id}/active/"))
            .await
    }

    pub async fn update_session(
        &self,
        session_id: &RecordId,
        update: &SessionUpdate,
    ) -> Result<ReadingSession> {
        self.send_json(
            Method::PATCH,
            &format!("/reading/sessions/{session_id}/update/"),
            Some(update),
        )
        .await
    }

    pub async fn end_session(&self, session_id: &RecordId) -> Result<ReadingSession> {
        self.send_json::<(), _>(
            Method::POST,
            &format!("/reading/sessions/{session_id}/end/"),
            None,
        )
        .await
    }
}

#[async_trait(?Send)]
impl HighlightStore for ApiClient {
    type Error = ClientError;

    async fn list(&self, book_id: &str) -> Result<Vec<Highlight>> {
        self.list_highlights(book_id).await
    }

    async fn create(&self, book_id: &str, highlight: &NewHighlight) -> Result<Highlight> {
        self.create_highlight(book_id, highlight).await
    }

    async fn delete(&self, id: &HighlightId) -> Result<()> {
        self.delete_highlight(id).await
    }
}
