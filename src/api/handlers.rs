//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateSessionResponse, ErrorResponse, SelectRequest, SessionListResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::{RuntimeError, SessionSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Player actions
        .route("/api/sessions/:id/start", post(start_session))
        .route("/api/sessions/:id/select", post(select_option))
        .route("/api/sessions/:id/back", post(go_back))
        .route("/api/sessions/:id/restart", post(restart_session))
        // Live updates
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list().await,
    })
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let handle = state.sessions.create().await?;
    tracing::info!(session_id = %handle.id(), "Session created");

    Ok(Json(CreateSessionResponse {
        id: handle.id().to_string(),
        session: handle.snapshot(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.snapshot()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.remove(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Player Actions
// ============================================================

async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.start().await?))
}

async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.choose(&req.option_id).await?))
}

async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.back().await?))
}

async fn restart_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.restart().await?))
}

// ============================================================
// Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(&id).await?;
    // Subscribe before reading the snapshot so no change falls in between
    let broadcast_rx = handle.subscribe();
    Ok(sse_stream(handle.snapshot(), broadcast_rx))
}

async fn get_version() -> &'static str {
    concat!("n109-archives ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::NotFound(_) => AppError::NotFound(e.to_string()),
            RuntimeError::Rejected(_) => AppError::BadRequest(e.to_string()),
            RuntimeError::AtCapacity(_) => AppError::Unavailable(e.to_string()),
            RuntimeError::Closed => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
