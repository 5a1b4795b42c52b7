use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::engine;
use crate::error::CoreResult;
use crate::http::response;
use crate::repo::conversations::ConversationRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub other_user_id: i64,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
}

impl From<&ConversationRow> for ConversationResponse {
    fn from(row: &ConversationRow) -> Self {
        ConversationResponse {
            id: row.id,
            user1_id: row.user1_id,
            user2_id: row.user2_id,
        }
    }
}

pub async fn create_or_get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateConversationRequest>,
) -> CoreResult<Response> {
    let (row, created) = engine::conversations::create_or_get(&state, user.user_id, body.other_user_id).await?;
    let body = ConversationResponse::from(&row);
    Ok(if created { response::created(body) } else { response::ok(body) })
}

pub async fn list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> CoreResult<Response> {
    let rows = engine::conversations::list_for_user(&state, user.user_id).await?;
    let body: Vec<ConversationResponse> = rows.iter().map(ConversationResponse::from).collect();
    Ok(response::ok(body))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
) -> CoreResult<Response> {
    let row = engine::conversations::get_as_participant(&state, conversation_id, user.user_id).await?;
    Ok(response::ok(ConversationResponse::from(&row)))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
) -> CoreResult<Response> {
    engine::conversations::delete(&state, conversation_id, user.user_id).await?;
    Ok(response::no_content())
}
