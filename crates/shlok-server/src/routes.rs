//! Route handlers

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use shlok_core::VerseRecord;
use shlok_notify::{DebugInfo, SendReceipt};
use std::sync::Arc;

type Shared = State<Arc<AppState>>;

/// Envelope around a single verse
#[derive(Debug, Serialize)]
pub struct ShlokResponse {
    success: bool,
    shlok: VerseRecord,
}

impl From<VerseRecord> for ShlokResponse {
    fn from(shlok: VerseRecord) -> Self {
        Self {
            success: true,
            shlok,
        }
    }
}

/// `GET /`
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Tamohar backend is operational",
        "version": shlok_core::VERSION,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// `GET /api/shloks/daily`
pub async fn daily_handler(State(state): Shared) -> AppResult<Json<ShlokResponse>> {
    let shlok = state.service.daily_verse().await?;
    Ok(Json(shlok.into()))
}

/// `GET /api/shloks/random`
pub async fn random_handler(State(state): Shared) -> AppResult<Json<ShlokResponse>> {
    let shlok = state.service.random_verse().await?;
    Ok(Json(shlok.into()))
}

/// `GET /api/shloks/{chapter}/{verse}`
pub async fn verse_handler(
    State(state): Shared,
    Path((chapter, verse)): Path<(String, String)>,
) -> AppResult<Json<ShlokResponse>> {
    match state.service.verse(&chapter, &verse).await? {
        Some(shlok) => Ok(Json(shlok.into())),
        None => Err(AppError::VerseNotFound { chapter, verse }),
    }
}

/// `GET /api/notifications/check`
pub async fn check_handler(State(state): Shared) -> AppResult<Json<Value>> {
    let report = state.dispatcher.check_and_send(Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Notification check triggered successfully",
        "report": report,
    })))
}

#[derive(Debug, Serialize)]
struct SendResponse {
    success: bool,
    message: String,
    #[serde(flatten)]
    receipt: SendReceipt,
}

/// `POST /api/notifications/user/{user_id}`
pub async fn send_user_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let receipt = state.dispatcher.send_to_user(&user_id, Utc::now()).await?;
    Ok(Json(SendResponse {
        success: true,
        message: format!("Successfully sent notification to user {user_id}"),
        receipt,
    }))
}

#[derive(Debug, Serialize)]
struct DebugResponse {
    success: bool,
    debug: DebugInfo,
}

/// `GET /api/notifications/debug/{user_id}`
pub async fn debug_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    tracing::debug!(user = %user_id, "debugging notifications");
    let debug = state.dispatcher.debug_info(&user_id, Utc::now()).await?;
    Ok(Json(DebugResponse {
        success: true,
        debug,
    }))
}

/// `GET /data/gita-shloks.csv`, the raw corpus for clients computing locally
pub async fn corpus_csv_handler(State(state): Shared) -> AppResult<impl IntoResponse> {
    let text = state.service.source().read_text().await?;
    Ok(([(CONTENT_TYPE, "text/csv; charset=utf-8")], text))
}
