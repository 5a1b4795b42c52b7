use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{CoreError, CoreResult};
use crate::http::response;
use crate::repo;
use crate::slideshow::coordinator::{self, StartPersonalInput};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartSlideshowRequest {
    pub slideshow_type: String,
    #[serde(default)]
    pub media_file_ids: Vec<i64>,
    #[serde(default)]
    pub captions: Vec<Option<String>>,
    #[serde(default)]
    pub auto_advance: bool,
    pub auto_advance_interval: Option<i32>,
    pub external_source_id: Option<String>,
    pub external_sort: Option<String>,
    pub total_items: Option<i32>,
}

pub async fn start(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
    Json(body): Json<StartSlideshowRequest>,
) -> CoreResult<Response> {
    let record = match body.slideshow_type.as_str() {
        "personal" => {
            let items: Vec<(i64, Option<&str>)> = body
                .media_file_ids
                .iter()
                .enumerate()
                .map(|(i, media_file_id)| {
                    let caption = body.captions.get(i).and_then(|c| c.as_deref());
                    (*media_file_id, caption)
                })
                .collect();
            coordinator::start_personal(
                &state,
                StartPersonalInput {
                    conversation_id,
                    requester_id: user.user_id,
                    items,
                    auto_advance: body.auto_advance,
                    auto_advance_interval: body.auto_advance_interval,
                },
            )
            .await?
        }
        "reddit" => {
            let external_source_id = body
                .external_source_id
                .as_deref()
                .ok_or_else(|| CoreError::Validation("external_source_id is required for reddit slideshows".to_owned()))?;
            let external_sort = body.external_sort.as_deref().unwrap_or("hot");
            let total_items = body
                .total_items
                .ok_or_else(|| CoreError::Validation("total_items is required for reddit slideshows".to_owned()))?;
            coordinator::start_reddit(
                &state,
                conversation_id,
                user.user_id,
                external_source_id,
                external_sort,
                total_items,
            )
            .await?
        }
        other => return Err(CoreError::Validation(format!("unknown slideshow_type: {other}"))),
    };
    Ok(response::created(record))
}

pub async fn get_current(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<i64>,
) -> CoreResult<Response> {
    let conversation = repo::conversations::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    if !conversation.has_participant(user.user_id) {
        return Err(CoreError::NotParticipant);
    }
    let session = repo::slideshow::find_by_conversation(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("slideshow session"))?;
    Ok(response::ok(session))
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    pub index: i32,
}

pub async fn navigate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<i64>,
    Json(body): Json<NavigateRequest>,
) -> CoreResult<Response> {
    let record = coordinator::navigate(&state, session_id, user.user_id, body.index).await?;
    Ok(response::ok(record))
}

pub async fn transfer_control(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<i64>,
) -> CoreResult<Response> {
    let record = coordinator::transfer_control(&state, session_id, user.user_id).await?;
    Ok(response::ok(record))
}

#[derive(Deserialize)]
pub struct AutoAdvanceRequest {
    pub auto_advance: bool,
    pub auto_advance_interval: Option<i32>,
}

pub async fn update_auto_advance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<i64>,
    Json(body): Json<AutoAdvanceRequest>,
) -> CoreResult<Response> {
    let record = coordinator::update_auto_advance(
        &state,
        session_id,
        user.user_id,
        body.auto_advance,
        body.auto_advance_interval,
    )
    .await?;
    Ok(response::ok(record))
}

pub async fn stop(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<i64>,
) -> CoreResult<Response> {
    coordinator::stop(&state, session_id, user.user_id).await?;
    Ok(response::no_content())
}
