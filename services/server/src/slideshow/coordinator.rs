use rt_protocol::{
    Event, SlideshowAutoAdvanceUpdatedPayload, SlideshowControlTransferredPayload,
    SlideshowNavigatePayload, SlideshowSessionRecord, SlideshowStoppedPayload, AUTO_ADVANCE_INTERVALS,
};

use crate::error::{CoreError, CoreResult};
use crate::repo;
use crate::repo::slideshow::NewPersonalItem;
use crate::state::AppState;

async fn participants(state: &AppState, conversation_id: i64) -> CoreResult<(i64, i64)> {
    let conversation = repo::conversations::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    Ok(conversation.participants())
}

async fn broadcast(state: &AppState, conversation_id: i64, event: Event) -> CoreResult<()> {
    let (a, b) = participants(state, conversation_id).await?;
    state.hub.deliver_to_many(&[a, b], event).await;
    Ok(())
}

pub struct StartPersonalInput<'a> {
    pub conversation_id: i64,
    pub requester_id: i64,
    pub items: Vec<(i64, Option<&'a str>)>,
    pub auto_advance: bool,
    pub auto_advance_interval: Option<i32>,
}

/// Starts a personal-photo session. Rejects a second concurrent session on
/// the same conversation via the unique index on `conversation_id`.
pub async fn start_personal(state: &AppState, input: StartPersonalInput<'_>) -> CoreResult<SlideshowSessionRecord> {
    let (a, b) = participants(state, input.conversation_id).await?;
    if input.requester_id != a && input.requester_id != b {
        return Err(CoreError::NotParticipant);
    }
    if let Some(interval) = input.auto_advance_interval {
        if !AUTO_ADVANCE_INTERVALS.contains(&interval) {
            return Err(CoreError::Validation(format!(
                "auto_advance_interval must be one of {AUTO_ADVANCE_INTERVALS:?}"
            )));
        }
    }
    if repo::slideshow::find_by_conversation(&state.pool, input.conversation_id).await?.is_some() {
        return Err(CoreError::SlideshowAlreadyActive);
    }

    let items: Vec<NewPersonalItem> = input
        .items
        .iter()
        .map(|(media_file_id, caption)| NewPersonalItem {
            media_file_id: *media_file_id,
            caption: *caption,
        })
        .collect();

    let mut record = repo::slideshow::create_personal(&state.pool, input.conversation_id, input.requester_id, &items).await?;
    if input.auto_advance || input.auto_advance_interval.is_some() {
        repo::slideshow::update_auto_advance(&state.pool, record.id, input.auto_advance, input.auto_advance_interval).await?;
        record.auto_advance = input.auto_advance;
        record.auto_advance_interval = input.auto_advance_interval;
    }

    broadcast(state, input.conversation_id, Event::SlideshowStarted(record.clone())).await?;
    Ok(record)
}

pub async fn start_reddit(
    state: &AppState,
    conversation_id: i64,
    requester_id: i64,
    external_source_id: &str,
    external_sort: &str,
    total_items: i32,
) -> CoreResult<SlideshowSessionRecord> {
    let (a, b) = participants(state, conversation_id).await?;
    if requester_id != a && requester_id != b {
        return Err(CoreError::NotParticipant);
    }
    if repo::slideshow::find_by_conversation(&state.pool, conversation_id).await?.is_some() {
        return Err(CoreError::SlideshowAlreadyActive);
    }

    let record = repo::slideshow::create_reddit(
        &state.pool,
        conversation_id,
        requester_id,
        external_source_id,
        external_sort,
        total_items,
    )
    .await?;
    broadcast(state, conversation_id, Event::SlideshowStarted(record.clone())).await?;
    Ok(record)
}

async fn load_active(state: &AppState, session_id: i64) -> CoreResult<SlideshowSessionRecord> {
    repo::slideshow::find_by_id(&state.pool, session_id)
        .await?
        .ok_or(CoreError::NotFound("slideshow session"))
}

pub async fn navigate(state: &AppState, session_id: i64, requester_id: i64, index: i32) -> CoreResult<SlideshowSessionRecord> {
    let session = load_active(state, session_id).await?;
    if session.controller_user_id != requester_id {
        return Err(CoreError::NotController);
    }
    if index < 0 || index >= session.total_items {
        return Err(CoreError::Validation("index out of bounds".to_owned()));
    }

    repo::slideshow::update_index(&state.pool, session_id, index).await?;
    broadcast(
        state,
        session.conversation_id,
        Event::SlideshowNavigate(SlideshowNavigatePayload {
            session_id,
            current_index: index,
        }),
    )
    .await?;

    Ok(SlideshowSessionRecord { current_index: index, ..session })
}

/// Transfers control to the conversation's other participant. The new
/// controller is always derived server-side rather than client-supplied, so
/// the single-controller invariant can never be broken by naming a
/// non-participant.
pub async fn transfer_control(
    state: &AppState,
    session_id: i64,
    requester_id: i64,
) -> CoreResult<SlideshowSessionRecord> {
    let session = load_active(state, session_id).await?;
    if session.controller_user_id != requester_id {
        return Err(CoreError::NotController);
    }
    let (a, b) = participants(state, session.conversation_id).await?;
    let new_controller_id = if requester_id == a { b } else { a };

    repo::slideshow::update_controller(&state.pool, session_id, new_controller_id).await?;
    broadcast(
        state,
        session.conversation_id,
        Event::SlideshowControlTransferred(SlideshowControlTransferredPayload {
            session_id,
            new_controller_id,
        }),
    )
    .await?;

    Ok(SlideshowSessionRecord { controller_user_id: new_controller_id, ..session })
}

pub async fn update_auto_advance(
    state: &AppState,
    session_id: i64,
    requester_id: i64,
    auto_advance: bool,
    interval: Option<i32>,
) -> CoreResult<SlideshowSessionRecord> {
    let session = load_active(state, session_id).await?;
    if session.controller_user_id != requester_id {
        return Err(CoreError::NotController);
    }
    if let Some(interval) = interval {
        if !AUTO_ADVANCE_INTERVALS.contains(&interval) {
            return Err(CoreError::Validation(format!(
                "auto_advance_interval must be one of {AUTO_ADVANCE_INTERVALS:?}"
            )));
        }
    }

    repo::slideshow::update_auto_advance(&state.pool, session_id, auto_advance, interval).await?;
    broadcast(
        state,
        session.conversation_id,
        Event::SlideshowAutoAdvanceUpdated(SlideshowAutoAdvanceUpdatedPayload {
            session_id,
            auto_advance,
            auto_advance_interval: interval,
        }),
    )
    .await?;

    Ok(SlideshowSessionRecord { auto_advance, auto_advance_interval: interval, ..session })
}

/// Either participant may stop a session. Stopping an already-stopped
/// session is a no-op that reports not-found.
pub async fn stop(state: &AppState, session_id: i64, requester_id: i64) -> CoreResult<()> {
    let session = load_active(state, session_id).await?;
    let (a, b) = participants(state, session.conversation_id).await?;
    if requester_id != a && requester_id != b {
        return Err(CoreError::NotParticipant);
    }

    repo::slideshow::stop(&state.pool, session_id).await?;
    broadcast(
        state,
        session.conversation_id,
        Event::SlideshowStopped(SlideshowStoppedPayload { session_id }),
    )
    .await?;
    Ok(())
}
