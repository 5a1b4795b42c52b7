use crate::error::{CoreError, CoreResult};
use crate::repo;
use crate::repo::blocks::BlockedUserRow;
use crate::state::AppState;

/// Blocks the named user on behalf of `blocker_id`. A blocker can never
/// equal the blocked user, and at most one row exists per ordered pair.
/// Blocking an already-blocked user is a no-op, enforced by the
/// `blocked_users_unique_pair` constraint's `ON CONFLICT DO NOTHING`.
pub async fn block(state: &AppState, blocker_id: i64, blocked_username: &str) -> CoreResult<()> {
    let user = repo::users::find_by_username(&state.pool, blocked_username)
        .await?
        .ok_or(CoreError::NotFound("user"))?;
    if blocker_id == user.id {
        return Err(CoreError::Validation("cannot block yourself".to_owned()));
    }
    repo::blocks::block(&state.pool, blocker_id, user.id).await?;
    Ok(())
}

pub async fn unblock(state: &AppState, blocker_id: i64, blocked_username: &str) -> CoreResult<()> {
    let user = repo::users::find_by_username(&state.pool, blocked_username)
        .await?
        .ok_or(CoreError::NotFound("user"))?;
    repo::blocks::unblock(&state.pool, blocker_id, user.id).await?;
    Ok(())
}

pub async fn list_blocked(state: &AppState, blocker_id: i64) -> CoreResult<Vec<BlockedUserRow>> {
    Ok(repo::blocks::list_blocked(&state.pool, blocker_id).await?)
}
