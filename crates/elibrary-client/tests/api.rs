//! Client tests against an in-process backend

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use annotation_core::{HighlightStore, PageBox, ReaderSession, ScreenRect, SelectionEvent};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use elibrary_client::session::{self, shared};
use elibrary_client::{ApiClient, ClientConfig, ClientError, Credentials, LoginResponse, TokenPair};
use pretty_assertions::assert_eq;
use reader_types::{
    AnnotationKind, AuthSession, Highlight, HighlightStyle, NewHighlight, PositionData,
    ProgressUpdate, ReadingProgress, ReadingSession, RecordId, Rect, SessionUpdate, UserProfile,
};

#[derive(Default)]
struct Backend {
    highlights: Mutex<Vec<(String, Highlight)>>,
    next_id: Mutex<u64>,
    progress: Mutex<ReadingProgress>,
    auth_headers: Mutex<Vec<Option<String>>>,
}

type Shared = Arc<Backend>;

impl Backend {
    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(value);
    }
}

fn student() -> UserProfile {
    UserProfile {
        id: RecordId::from(3u64),
        email: "lina@uni.example".to_string(),
        first_name: Some("Lina".to_string()),
        last_name: Some("Haddad".to_string()),
        role: Some("student".to_string()),
    }
}

async fn list_highlights(
    State(backend): State<Shared>,
    Path(book_id): Path<String>,
    headers: HeaderMap,
) -> Json<Vec<Highlight>> {
    backend.record_auth(&headers);
    let highlights = backend.highlights.lock().unwrap();
    Json(
        highlights
            .iter()
            .filter(|(book, _)| *book == book_id)
            .map(|(_, h)| h.clone())
            .collect(),
    )
}

async fn create_highlight(
    State(backend): State<Shared>,
    Path(book_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NewHighlight>,
) -> impl IntoResponse {
    backend.record_auth(&headers);
    let id = {
        let mut next = backend.next_id.lock().unwrap();
        *next += 1;
        *next
    };
    let highlight = Highlight {
        id: RecordId::from(id),
        page_number: payload.page_number,
        text_content: payload.text_content,
        color: payload.color,
        position_data: Some(payload.position_data),
        created_at: None,
    };
    backend
        .highlights
        .lock()
        .unwrap()
        .push((book_id, highlight.clone()));
    (StatusCode::CREATED, Json(highlight))
}

async fn delete_highlight(
    State(backend): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    backend.record_auth(&headers);
    let mut highlights = backend.highlights.lock().unwrap();
    let before = highlights.len();
    highlights.retain(|(_, h)| h.id.as_str() != id);
    if highlights.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn get_progress(
    State(backend): State<Shared>,
    Path(book_id): Path<String>,
) -> Result<Json<ReadingProgress>, StatusCode> {
    if book_id == "broken" {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(backend.progress.lock().unwrap().clone()))
}

async fn patch_progress(
    State(backend): State<Shared>,
    Json(update): Json<ProgressUpdate>,
) -> Json<ReadingProgress> {
    let mut progress = backend.progress.lock().unwrap();
    progress.current_page = update.current_page;
    if update.total_pages.is_some() {
        progress.total_pages = update.total_pages;
    }
    progress.is_completed = progress.total_pages == Some(progress.current_page);
    Json(progress.clone())
}

fn reading_session(current_page: u32) -> ReadingSession {
    ReadingSession {
        id: RecordId::from(77u64),
        start_page: Some(4),
        current_page: Some(current_page),
        pages_read: Some(current_page.saturating_sub(4)),
        started_at: None,
        ended_at: None,
    }
}

async fn active_session() -> Json<ReadingSession> {
    Json(reading_session(4))
}

async fn update_session(Json(update): Json<SessionUpdate>) -> Json<ReadingSession> {
    Json(reading_session(update.current_page))
}

async fn end_session() -> Json<ReadingSession> {
    let mut session = reading_session(9);
    session.ended_at = Some(chrono::Utc::now());
    Json(session)
}

async fn login(Json(body): Json<serde_json::Value>) -> Result<Json<LoginResponse>, StatusCode> {
    if body["password"] != "correct horse" {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(LoginResponse {
        user: student(),
        tokens: TokenPair {
            access: "access-1".to_string(),
            refresh: "refresh-1".to_string(),
        },
    }))
}

async fn me(headers: HeaderMap) -> Result<Json<UserProfile>, StatusCode> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer access-1") => Ok(Json(student())),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn dashboard(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    backend.record_auth(&headers);
    let history = match params.get("period").map(String::as_str) {
        Some("week") => serde_json::json!([
            {"date": "2026-10-12", "read": true},
            {"date": "2026-10-13", "read": false},
            {"date": "2026-10-14", "read": true},
            {"date": "2026-10-15", "read": true}
        ]),
        Some("month") => serde_json::json!([
            {"date": "2026-09-20", "read": true},
            {"date": "2026-10-15", "read": true}
        ]),
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    Ok(Json(serde_json::json!({
        "period": params["period"],
        "stats": {
            "current_streak_days": 2,
            "longest_streak_days": 9,
            "streak_history": history
        }
    })))
}

async fn spawn_backend(backend: Shared) -> String {
    let app = Router::new()
        .route(
            "/api/reading/highlights/:id/",
            get(list_highlights).post(create_highlight),
        )
        .route("/api/reading/highlights/:id/detail/", delete(delete_highlight))
        .route("/api/reading/progress/:id/", get(get_progress).patch(patch_progress))
        .route("/api/reading/sessions/:id/active/", get(active_session))
        .route("/api/reading/sessions/:id/update/", patch(update_session))
        .route("/api/reading/sessions/:id/end/", post(end_session))
        .route("/api/reading/dashboard/", get(dashboard))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/me/", get(me))
        .route("/api/auth/logout/", post(logout))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn signed_in() -> AuthSession {
    let mut session = AuthSession::new();
    session.set_session(student(), "access-1", "refresh-1");
    session
}

fn payload(page: u32) -> NewHighlight {
    NewHighlight {
        page_number: page,
        text_content: "the Krebs cycle".to_string(),
        color: "green-underline".parse::<HighlightStyle>().unwrap(),
        position_data: PositionData {
            rects: vec![Rect::new(0.12, 0.4, 0.5, 0.02).on_page(page)],
        },
    }
}

#[tokio::test]
async fn test_highlight_crud_sends_bearer_token() {
    let backend = Shared::default();
    let base = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();

    let created = client.create_highlight("42", &payload(5)).await.unwrap();
    assert_eq!(created.page_number, 5);
    assert_eq!(created.color.to_wire(), "green-underline");

    let listed = client.list_highlights("42").await.unwrap();
    assert_eq!(listed, vec![created.clone()]);
    assert!(client.list_highlights("43").await.unwrap().is_empty());

    client.delete_highlight(&created.id).await.unwrap();
    assert!(client.list_highlights("42").await.unwrap().is_empty());

    let headers = backend.auth_headers.lock().unwrap();
    assert!(headers
        .iter()
        .all(|h| h.as_deref() == Some("Bearer access-1")));
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_authorization() {
    let backend = Shared::default();
    let base = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(AuthSession::new())).unwrap();

    client.list_highlights("42").await.unwrap();
    assert_eq!(*backend.auth_headers.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn test_delete_of_missing_highlight_succeeds() {
    let base = spawn_backend(Shared::default()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();
    client
        .delete_highlight(&RecordId::from("never-existed"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let base = spawn_backend(Shared::default()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();
    let err = client.progress("broken").await.unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 500, .. }));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_progress_roundtrip() {
    let base = spawn_backend(Shared::default()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();

    let progress = client
        .update_progress(
            "42",
            &ProgressUpdate {
                current_page: 120,
                total_pages: Some(120),
            },
        )
        .await
        .unwrap();
    assert!(progress.is_completed);
    assert_eq!(client.progress("42").await.unwrap().current_page, 120);
}

#[tokio::test]
async fn test_dashboard_streaks_by_period() {
    let backend = Shared::default();
    let base = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();

    let week = client.dashboard("week").await.unwrap();
    assert_eq!(week.stats.current_streak_days, 2);
    assert_eq!(week.stats.longest_streak_days, 9);
    let days: Vec<String> = week
        .stats
        .reading_days()
        .iter()
        .map(|d| d.to_string())
        .collect();
    assert_eq!(days, vec!["2026-10-12", "2026-10-14", "2026-10-15"]);

    // Blank period falls back to the weekly window
    assert_eq!(client.dashboard(" ").await.unwrap(), week);

    let month = client.dashboard("month").await.unwrap();
    assert_eq!(month.stats.reading_days().len(), 2);

    let err = client.dashboard("decade").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(backend
        .auth_headers
        .lock()
        .unwrap()
        .iter()
        .all(|h| h.as_deref() == Some("Bearer access-1")));
}

#[tokio::test]
async fn test_reading_session_lifecycle() {
    let base = spawn_backend(Shared::default()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();

    let active = client.active_session("42").await.unwrap();
    assert!(active.is_active());

    let updated = client
        .update_session(
            &active.id,
            &SessionUpdate {
                current_page: 8,
                pages_read: Some(4),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.current_page, Some(8));

    let ended = client.end_session(&active.id).await.unwrap();
    assert!(!ended.is_active());
}

#[tokio::test]
async fn test_login_profile_logout() {
    let base = spawn_backend(Shared::default()).await;
    let session = shared(AuthSession::new());
    let client = ApiClient::new(ClientConfig::new(base), session.clone()).unwrap();

    assert!(matches!(
        client.profile().await.unwrap_err(),
        ClientError::Unauthenticated
    ));

    let err = client
        .login(&Credentials {
            email: "lina@uni.example".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    client
        .login(&Credentials {
            email: "lina@uni.example".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session::snapshot(&session).bearer(), Some("access-1"));
    assert_eq!(client.profile().await.unwrap(), student());

    client.logout().await.unwrap();
    assert!(!session::snapshot(&session).is_authenticated());
}

#[tokio::test]
async fn test_reader_session_persists_through_client() {
    let base = spawn_backend(Shared::default()).await;
    let client = ApiClient::new(ClientConfig::new(base), shared(signed_in())).unwrap();

    let mut pages: BTreeMap<u32, PageBox> = BTreeMap::new();
    pages.insert(1, ScreenRect::new(0.0, 0.0, 612.0, 792.0));

    let mut reader = ReaderSession::new("42", 1);
    let rects = vec![ScreenRect::new(60.0, 100.0, 300.0, 14.0)];
    reader.on_selection(&SelectionEvent {
        text: "osmosis".to_string(),
        client_rects: rects.clone(),
    });
    let created = reader
        .confirm(AnnotationKind::Highlight, &rects, &pages, &client)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(client.list("42").await.unwrap().len(), 1);

    reader.click_overlay(&created.id);
    assert!(reader.remove_active(&client).await.unwrap());
    assert!(client.list("42").await.unwrap().is_empty());
    assert!(reader.highlights().is_empty());
}
