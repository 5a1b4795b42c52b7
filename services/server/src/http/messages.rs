use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::engine;
use crate::engine::messages::{DeleteScope, SendInput};
use crate::error::{CoreError, CoreResult};
use crate::http::response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: i64,
    pub message_type: String,
    pub encrypted_content: String,
    #[serde(default)]
    pub sender_encrypted_content: String,
    pub encryption_version: String,
    pub media_file_id: Option<i64>,
    pub recipient_media_key_wrap: Option<String>,
    pub sender_media_key_wrap: Option<String>,
    pub media_iv: Option<String>,
}

pub async fn send(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SendMessageRequest>,
) -> CoreResult<Response> {
    let record = engine::messages::send(
        &state,
        SendInput {
            conversation_id: body.conversation_id,
            sender_id: user.user_id,
            message_type: &body.message_type,
            encrypted_content: &body.encrypted_content,
            sender_encrypted_content: &body.sender_encrypted_content,
            encryption_version: &body.encryption_version,
            media_file_id: body.media_file_id,
            recipient_media_key_wrap: body.recipient_media_key_wrap.as_deref(),
            sender_media_key_wrap: body.sender_media_key_wrap.as_deref(),
            media_iv: body.media_iv.as_deref(),
        },
    )
    .await?;
    Ok(response::created(record))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub before_id: Option<i64>,
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> CoreResult<Response> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let records = engine::messages::list_history(&state, conversation_id, user.user_id, query.before_id, limit).await?;
    Ok(response::ok(records))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> CoreResult<Response> {
    engine::messages::mark_read(&state, message_id, user.user_id).await?;
    Ok(response::no_content())
}

pub async fn mark_conversation_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
) -> CoreResult<Response> {
    let count = engine::messages::mark_conversation_read(&state, conversation_id, user.user_id).await?;
    Ok(response::ok(serde_json::json!({ "marked_read": count })))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub delete_for: Option<String>,
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> CoreResult<Response> {
    let scope = match query.delete_for.as_deref() {
        None | Some("self") => DeleteScope::SenderOnly,
        Some("both") => DeleteScope::Both,
        Some(other) => return Err(CoreError::Validation(format!("unknown delete_for: {other}"))),
    };
    engine::messages::delete(&state, message_id, user.user_id, scope).await?;
    Ok(response::no_content())
}
