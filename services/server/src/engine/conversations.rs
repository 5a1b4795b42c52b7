use crate::error::{CoreError, CoreResult};
use crate::repo;
use crate::state::AppState;
use repo::conversations::ConversationRow;

/// Creates or idempotently retrieves the canonical conversation for a pair
/// of users: creating the same conversation twice returns the same id.
pub async fn create_or_get(
    state: &AppState,
    user_id: i64,
    other_user_id: i64,
) -> CoreResult<(ConversationRow, bool)> {
    if user_id == other_user_id {
        return Err(CoreError::Validation(
            "cannot start a conversation with yourself".to_owned(),
        ));
    }
    let (row, created) = repo::conversations::create_or_get(&state.pool, user_id, other_user_id).await?;
    Ok((row, created))
}

pub async fn get_as_participant(state: &AppState, conversation_id: i64, user_id: i64) -> CoreResult<ConversationRow> {
    let row = repo::conversations::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound("conversation"))?;
    if !row.has_participant(user_id) {
        return Err(CoreError::NotParticipant);
    }
    Ok(row)
}

pub async fn list_for_user(state: &AppState, user_id: i64) -> CoreResult<Vec<ConversationRow>> {
    Ok(repo::conversations::list_for_user(&state.pool, user_id).await?)
}

pub async fn delete(state: &AppState, conversation_id: i64, user_id: i64) -> CoreResult<()> {
    get_as_participant(state, conversation_id, user_id).await?;
    repo::conversations::delete(&state.pool, conversation_id).await?;
    Ok(())
}
