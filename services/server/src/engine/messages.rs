use rt_protocol::{
    Event, MessageDeliveredPayload, MessageReadPayload, MessageRecord, MessageType,
};

use crate::error::{CoreError, CoreResult};
use crate::repo;
use crate::repo::messages::NewMessage;
use crate::state::AppState;

pub fn parse_message_type(s: &str) -> CoreResult<MessageType> {
    match s {
        "text" => Ok(MessageType::Text),
        "image" => Ok(MessageType::Image),
        "video" => Ok(MessageType::Video),
        "audio" => Ok(MessageType::Audio),
        "gif" => Ok(MessageType::Gif),
        other => Err(CoreError::Validation(format!("unknown message_type: {other}"))),
    }
}

pub struct SendInput<'a> {
    pub conversation_id: i64,
    pub sender_id: i64,
    pub message_type: &'a str,
    pub encrypted_content: &'a str,
    pub sender_encrypted_content: &'a str,
    pub encryption_version: &'a str,
    pub media_file_id: Option<i64>,
    pub recipient_media_key_wrap: Option<&'a str>,
    pub sender_media_key_wrap: Option<&'a str>,
    pub media_iv: Option<&'a str>,
}

/// Sends a message end to end: validates preconditions, persists, advances
/// the conversation, and fans the result out through the hub.
pub async fn send(state: &AppState, input: SendInput<'_>) -> CoreResult<MessageRecord> {
    let conversation = repo::conversations::find_by_id(&state.pool, input.conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    if !conversation.has_participant(input.sender_id) {
        return Err(CoreError::NotParticipant);
    }
    let recipient_id = conversation
        .other_participant(input.sender_id)
        .expect("sender already confirmed a participant");

    if repo::blocks::is_blocked(&state.pool, recipient_id, input.sender_id).await? {
        return Err(CoreError::Blocked);
    }

    let message_type = parse_message_type(input.message_type)?;

    if let Some(media_file_id) = input.media_file_id {
        let media = repo::media::find_by_id(&state.pool, media_file_id)
            .await?
            .ok_or(CoreError::MediaNotOwned)?;
        if media.owner_id != input.sender_id || media.used_in_message_id.is_some() {
            return Err(CoreError::MediaNotOwned);
        }
    }

    let mut record = repo::messages::insert(
        &state.pool,
        NewMessage {
            conversation_id: input.conversation_id,
            sender_id: input.sender_id,
            recipient_id,
            message_type,
            encrypted_content: input.encrypted_content,
            sender_encrypted_content: input.sender_encrypted_content,
            encryption_version: input.encryption_version,
            media_file_id: input.media_file_id,
            recipient_media_key_wrap: input.recipient_media_key_wrap,
            sender_media_key_wrap: input.sender_media_key_wrap,
            media_iv: input.media_iv,
        },
    )
    .await?;

    repo::conversations::touch_last_message_at(&state.pool, input.conversation_id, record.sent_at).await?;
    if let Some(media_file_id) = input.media_file_id {
        repo::media::mark_used_in_message(&state.pool, media_file_id, record.id).await?;
    }

    state.hub.deliver_to(recipient_id, Event::NewMessage(record.clone())).await;

    // The recipient is deemed to have received the message (and thus the
    // sender gets a delivery receipt) only once a delivered_at stamp is
    // actually recorded; the conditional UPDATE makes this race-safe against
    // a concurrent history fetch.
    if state.hub.is_online(recipient_id).await {
        if let Some(delivered_at) = repo::messages::mark_delivered(&state.pool, record.id).await? {
            record.delivered_at = Some(delivered_at);
            state
                .hub
                .deliver_to(
                    input.sender_id,
                    Event::MessageDelivered(MessageDeliveredPayload {
                        message_id: record.id,
                        conversation_id: input.conversation_id,
                    }),
                )
                .await;
        }
    }

    Ok(record)
}

/// Fetches paged history for the requesting participant, marking every
/// returned message delivered as a side effect: delivered is set the
/// first time the recipient either fetches messages or receives the
/// `new_message` event.
pub async fn list_history(
    state: &AppState,
    conversation_id: i64,
    viewer_id: i64,
    before_id: Option<i64>,
    limit: i64,
) -> CoreResult<Vec<MessageRecord>> {
    let conversation = repo::conversations::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    if !conversation.has_participant(viewer_id) {
        return Err(CoreError::NotParticipant);
    }

    let mut records = repo::messages::list_for_conversation(&state.pool, conversation_id, viewer_id, before_id, limit).await?;

    for record in &mut records {
        if record.recipient_id != viewer_id {
            continue;
        }
        if let Some(delivered_at) = repo::messages::mark_delivered(&state.pool, record.id).await? {
            record.delivered_at = Some(delivered_at);
            state
                .hub
                .deliver_to(
                    record.sender_id,
                    Event::MessageDelivered(MessageDeliveredPayload {
                        message_id: record.id,
                        conversation_id,
                    }),
                )
                .await;
        }
    }

    Ok(records)
}

pub async fn mark_read(state: &AppState, message_id: i64, reader_id: i64) -> CoreResult<()> {
    let record = repo::messages::find_by_id(&state.pool, message_id)
        .await?
        .ok_or(CoreError::NotFound("message"))?;
    if record.recipient_id != reader_id {
        return Err(CoreError::NotParticipant);
    }
    if repo::messages::mark_read(&state.pool, message_id).await?.is_some() {
        state
            .hub
            .deliver_to(
                record.sender_id,
                Event::MessageRead(MessageReadPayload {
                    message_id,
                    conversation_id: record.conversation_id,
                    reader_id,
                }),
            )
            .await;
    }
    Ok(())
}

/// Bulk-marks every unread message addressed to `reader_id` as read,
/// emitting one `conversation_read` plus one `message_read` per message
/// actually transitioned.
pub async fn mark_conversation_read(state: &AppState, conversation_id: i64, reader_id: i64) -> CoreResult<usize> {
    let conversation = repo::conversations::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    let sender_id = conversation.other_participant(reader_id).ok_or(CoreError::NotParticipant)?;

    let message_ids = repo::messages::mark_conversation_read(&state.pool, conversation_id, reader_id).await?;
    if message_ids.is_empty() {
        return Ok(0);
    }

    for message_id in &message_ids {
        state
            .hub
            .deliver_to(
                sender_id,
                Event::MessageRead(MessageReadPayload {
                    message_id: *message_id,
                    conversation_id,
                    reader_id,
                }),
            )
            .await;
    }
    state
        .hub
        .deliver_to(
            sender_id,
            Event::ConversationRead(rt_protocol::ConversationReadPayload {
                conversation_id,
                reader_id,
            }),
        )
        .await;

    Ok(message_ids.len())
}

pub enum DeleteScope {
    SenderOnly,
    Both,
}

/// Soft-deletes a message for the requester, hard-deleting once both
/// participant flags end up set. `Both` is only honored for the original
/// sender; a non-sender requesting `Both` is rejected outright (see
/// DESIGN.md for why that open question is resolved this way).
pub async fn delete(
    state: &AppState,
    message_id: i64,
    requester_id: i64,
    scope: DeleteScope,
) -> CoreResult<()> {
    let record = repo::messages::find_by_id(&state.pool, message_id)
        .await?
        .ok_or(CoreError::NotFound("message"))?;
    if record.sender_id != requester_id && record.recipient_id != requester_id {
        return Err(CoreError::NotParticipant);
    }
    if matches!(scope, DeleteScope::Both) && record.sender_id != requester_id {
        return Err(CoreError::NotParticipant);
    }

    repo::messages::soft_delete(&state.pool, message_id, requester_id, record.sender_id, record.recipient_id).await?;

    if matches!(scope, DeleteScope::Both) {
        repo::messages::soft_delete(&state.pool, message_id, record.recipient_id, record.sender_id, record.recipient_id)
            .await?;
    }

    repo::messages::hard_delete_if_both_deleted(&state.pool, message_id).await?;

    Ok(())
}
