use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::engine;
use crate::error::CoreResult;
use crate::http::response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BlockRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct BlockedUserResponse {
    pub user_id: i64,
    pub username: String,
}

pub async fn block(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<BlockRequest>,
) -> CoreResult<Response> {
    engine::blocks::block(&state, user.user_id, &body.username).await?;
    Ok(response::no_content())
}

pub async fn unblock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> CoreResult<Response> {
    engine::blocks::unblock(&state, user.user_id, &username).await?;
    Ok(response::no_content())
}

pub async fn list_blocked(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> CoreResult<Response> {
    let rows = engine::blocks::list_blocked(&state, user.user_id).await?;
    let body: Vec<BlockedUserResponse> = rows
        .into_iter()
        .map(|r| BlockedUserResponse {
            user_id: r.user_id,
            username: r.username,
        })
        .collect();
    Ok(response::ok(body))
}
