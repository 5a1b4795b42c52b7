use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{CoreError, CoreResult};
use crate::http::response;
use crate::repo;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> CoreResult<Response> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let rows = repo::notifications::list_for_user(&state.pool, user.user_id, limit).await?;
    Ok(response::ok(rows))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> CoreResult<Response> {
    if !repo::notifications::mark_read(&state.pool, notification_id, user.user_id).await? {
        return Err(CoreError::NotFound("notification"));
    }
    Ok(response::no_content())
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> CoreResult<Response> {
    if !repo::notifications::delete(&state.pool, notification_id, user.user_id).await? {
        return Err(CoreError::NotFound("notification"));
    }
    Ok(response::no_content())
}
