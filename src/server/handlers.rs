use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use super::error::ApiError;
use crate::llm::{ConnectionCheck, check_connection};
use crate::session::{SessionRecord, SessionSummary};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct StartTaskRequest {
    #[serde(default)]
    pub task: String,
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartTaskResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn start_task(
    State(state): State<AppState>,
    Json(req): Json<StartTaskRequest>,
) -> Result<Json<StartTaskResponse>, ApiError> {
    let max_rounds = req.max_rounds.unwrap_or(state.default_max_rounds);
    let session_id = state.sessions.start(&req.task, max_rounds).await?;
    Ok(Json(StartTaskResponse { session_id }))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRecord>, ApiError> {
    Ok(Json(state.sessions.poll(&session_id).await?))
}

pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let cancelled = state.sessions.cancel(&session_id).await?;
    Ok(Json(CancelResponse { cancelled }))
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list().await)
}

pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.client.list_models().await {
        Ok(models) => Ok(Json(json!({ "models": models }))),
        Err(e) => {
            warn!("Listing models failed: {}", e);
            let message = if e.is_transport() {
                "Cannot connect to Ollama".to_string()
            } else {
                e.to_string()
            };
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message))
        }
    }
}

pub async fn test_connection(State(state): State<AppState>) -> Json<ConnectionCheck> {
    Json(check_connection(state.client.as_ref()).await)
}
