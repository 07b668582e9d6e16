//! HTTP handlers.
//!
//! Form posts dispatch an [`Action`] and answer with `303 See Other` back to a
//! view, so a browser refresh never repeats an analysis. Views render the
//! session and then mark its notices as shown.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{ComparisonRecord, PaperRecord};
use crate::llm::CacheStats;
use crate::session::{Action, Page, SessionHandle, UploadedFile};
use crate::web::AppState;
use crate::web::render::render_page;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "paperlens_session";

type HandlerError = (StatusCode, String);

/// Read the session id from the request cookies, if present and well formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

struct Session {
    id: Uuid,
    handle: SessionHandle,
    created: bool,
}

impl Session {
    async fn resolve(state: &AppState, headers: &HeaderMap) -> Self {
        let (id, handle, created) = state
            .sessions
            .get_or_create(session_id_from_headers(headers))
            .await;
        Self {
            id,
            handle,
            created,
        }
    }

    /// Attach `Set-Cookie` when the session was created by this request.
    fn finish(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.created {
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

async fn run(state: &AppState, session: &Session, action: Action) {
    let mut guard = session.handle.lock().await;
    state.controller.dispatch(&mut guard, action).await;
}

async fn view(state: AppState, headers: HeaderMap, page: Page) -> Response {
    let session = Session::resolve(&state, &headers).await;
    let html = {
        let mut guard = session.handle.lock().await;
        state
            .controller
            .dispatch(&mut guard, Action::Navigate(page))
            .await;
        let html = render_page(&guard);
        state
            .controller
            .dispatch(&mut guard, Action::NoticesShown)
            .await;
        html
    };
    session.finish(Html(html))
}

pub async fn index() -> Redirect {
    Redirect::to(Page::Library.path())
}

pub async fn library(State(state): State<AppState>, headers: HeaderMap) -> Response {
    view(state, headers, Page::Library).await
}

pub async fn upload_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    view(state, headers, Page::Upload).await
}

pub async fn compare_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    view(state, headers, Page::Compare).await
}

/// Stage the PDFs from a multipart form (field `files`).
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed upload");
        (StatusCode::BAD_REQUEST, format!("Invalid upload: {e}"))
    })? {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")))?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let session = Session::resolve(&state, &headers).await;
    run(&state, &session, Action::Upload(files)).await;
    Ok(session.finish(Redirect::to(Page::Upload.path())))
}

pub async fn analyze(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers).await;
    run(&state, &session, Action::Analyze).await;
    session.finish(Redirect::to(Page::Upload.path()))
}

/// Parse the repeated `paper` field of a url-encoded compare form.
pub fn parse_selection(body: &str) -> Result<Vec<u64>, String> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(name, _)| *name == "paper")
        .map(|(_, raw)| {
            let value = urlencoding::decode(raw).map_err(|e| e.to_string())?;
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("Invalid paper id: {value}"))
        })
        .collect()
}

pub async fn compare(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, HandlerError> {
    let selection = parse_selection(&body).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let session = Session::resolve(&state, &headers).await;
    run(&state, &session, Action::Compare(selection)).await;
    Ok(session.finish(Redirect::to(Page::Compare.path())))
}

pub async fn reset_comparison(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers).await;
    run(&state, &session, Action::ResetComparison).await;
    session.finish(Redirect::to(Page::Compare.path()))
}

pub async fn api_papers(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers).await;
    let papers: Vec<PaperRecord> = session.handle.lock().await.store.papers().to_vec();
    session.finish(Json(papers))
}

pub async fn api_comparison(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers).await;
    let comparison: Option<ComparisonRecord> =
        session.handle.lock().await.store.comparison().cloned();
    session.finish(Json(comparison))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = match &state.cache {
        Some(cache) => Some(cache.stats().await),
        None => None,
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.len().await,
        cache,
    })
}
