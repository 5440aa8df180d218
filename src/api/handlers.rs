//! HTTP request handlers

use super::types::{
    ChatRequest, CreateSessionResponse, ErrorResponse, SuccessResponse, ToolsResponse,
    VersionResponse,
};
use super::AppState;
use crate::runtime::{LlmClient, ToolExecutor, TurnError};
use crate::session::{SessionError, SessionSnapshot, TurnView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Create the API router
pub fn create_router<L, T>(state: AppState<L, T>) -> Router
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    Router::new()
        .route("/api/sessions", post(create_session::<L, T>))
        .route(
            "/api/sessions/:id",
            get(get_session::<L, T>).delete(delete_session::<L, T>),
        )
        .route("/api/sessions/:id/chat", post(send_chat::<L, T>))
        .route("/api/sessions/:id/accessories", post(ask_accessories::<L, T>))
        .route("/api/tools", get(list_tools::<L, T>))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session<L, T>(State(state): State<AppState<L, T>>) -> Json<CreateSessionResponse>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    let id = state.sessions.create().await;
    Json(CreateSessionResponse { id })
}

async fn get_session<L, T>(
    State(state): State<AppState<L, T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    Ok(Json(state.sessions.snapshot(id).await?))
}

async fn delete_session<L, T>(
    State(state): State<AppState<L, T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    state.sessions.remove(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Turns
// ============================================================

async fn send_chat<L, T>(
    State(state): State<AppState<L, T>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TurnView>, AppError>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    Ok(Json(state.sessions.chat(id, &req.text).await?))
}

async fn ask_accessories<L, T>(
    State(state): State<AppState<L, T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnView>, AppError>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    Ok(Json(state.sessions.ask_accessories(id).await?))
}

// ============================================================
// Info
// ============================================================

async fn list_tools<L, T>(State(state): State<AppState<L, T>>) -> Json<ToolsResponse>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    Json(ToolsResponse {
        tools: state.sessions.tool_specs().to_vec(),
    })
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    ToolFailed(String),
    UpstreamFailed(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::NotFound(_) => AppError::NotFound(message),
            SessionError::EmptyMessage => AppError::BadRequest(message),
            SessionError::NoSearchYet => AppError::Conflict(message),
            SessionError::Turn(TurnError::Tool(_)) => AppError::ToolFailed(message),
            SessionError::Turn(TurnError::Engine(_) | TurnError::RoundLimit(_)) => {
                AppError::UpstreamFailed(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ToolFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::UpstreamFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
