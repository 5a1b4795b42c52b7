use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{CoreError, CoreResult};
use crate::http::response;
use crate::state::AppState;

/// Batched presence queries accept up to this many user ids.
const MAX_BATCH: usize = 100;

#[derive(Deserialize)]
pub struct StatusQuery {
    user_ids: String,
}

/// `GET /users/status?user_ids=1,2,3` — derived view over the hub's live
/// session registry; the engine never needs to listen for presence
/// transitions itself.
pub async fn status(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<StatusQuery>,
) -> CoreResult<Response> {
    let ids: Vec<i64> = query
        .user_ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|_| CoreError::Validation(format!("invalid user id: {s}")))
        })
        .collect::<CoreResult<_>>()?;

    if ids.len() > MAX_BATCH {
        return Err(CoreError::Validation(format!(
            "at most {MAX_BATCH} user ids may be queried at once"
        )));
    }

    let online: HashMap<i64, bool> = state.hub.online_many(&ids).await;
    Ok(response::ok(online))
}
