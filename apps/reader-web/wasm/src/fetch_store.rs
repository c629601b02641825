//! Highlight persistence over the browser's `fetch`

use annotation_core::HighlightStore;
use async_trait::async_trait;
use reader_types::{Highlight, HighlightId, NewHighlight};
use serde::de::DeserializeOwned;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("{0}")]
    Js(String),

    #[error("{method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<JsValue> for FetchError {
    fn from(value: JsValue) -> Self {
        FetchError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<FetchError> for JsValue {
    fn from(err: FetchError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

struct Reply {
    method: &'static str,
    url: String,
    status: u16,
    body: String,
}

impl Reply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn into_json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        if !self.is_success() {
            return Err(self.into_error());
        }
        serde_json::from_str(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn into_error(self) -> FetchError {
        FetchError::Status {
            method: self.method,
            url: self.url,
            status: self.status,
        }
    }
}

pub struct FetchHighlightStore {
    api_base: String,
    token: Option<String>,
}

impl FetchHighlightStore {
    pub fn new(api_base: &str, token: Option<String>) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn fetch(
        &self,
        method: &'static str,
        path: &str,
        body: Option<String>,
    ) -> Result<Reply, FetchError> {
        let window = web_sys::window().ok_or_else(|| FetchError::Js("No window".into()))?;
        let url = self.url(path);

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&url, &opts)?;
        if body.is_some() {
            request.headers().set("Content-Type", "application/json")?;
        }
        if let Some(token) = &self.token {
            request
                .headers()
                .set("Authorization", &format!("Bearer {}", token))?;
        }

        let response = JsFuture::from(window.fetch_with_request(&request)).await?;
        let response: Response = response.dyn_into()?;
        let body = JsFuture::from(response.text()?)
            .await?
            .as_string()
            .unwrap_or_default();

        let reply = Reply {
            method,
            url,
            status: response.status(),
            body,
        };
        if !reply.is_success() {
            web_sys::console::warn_1(
                &format!("{} {} returned {}", reply.method, reply.url, reply.status).into(),
            );
        }
        Ok(reply)
    }
}

#[async_trait(?Send)]
impl HighlightStore for FetchHighlightStore {
    type Error = FetchError;

    async fn list(&self, book_id: &str) -> Result<Vec<Highlight>, FetchError> {
        self.fetch("GET", &format!("/reading/highlights/{}/", book_id), None)
            .await?
            .into_json()
    }

    async fn create(
        &self,
        book_id: &str,
        highlight: &NewHighlight,
    ) -> Result<Highlight, FetchError> {
        let body = serde_json::to_string(highlight).map_err(|e| FetchError::Decode(e.to_string()))?;
        self.fetch(
            "POST",
            &format!("/reading/highlights/{}/", book_id),
            Some(body),
        )
        .await?
        .into_json()
    }

    async fn delete(&self, id: &HighlightId) -> Result<(), FetchError> {
        let reply = self
            .fetch("DELETE", &format!("/reading/highlights/{}/detail/", id), None)
            .await?;
        // Already gone on the server
        if reply.is_success() || reply.status == 404 {
            Ok(())
        } else {
            Err(reply.into_error())
        }
    }
}
