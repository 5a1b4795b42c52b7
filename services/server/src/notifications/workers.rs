use chrono::Utc;
use rt_protocol::{ContentType, Event, NotificationType};
use tracing::{error, info};

use super::velocity;
use crate::repo;
use crate::repo::notifications::NewNotification;
use crate::state::AppState;

fn velocity_type(content_type: ContentType) -> NotificationType {
    match content_type {
        ContentType::Post => NotificationType::PostVelocity,
        ContentType::Comment => NotificationType::CommentVelocity,
    }
}

/// Claims every due pending batch and either emits or expires it. Runs on
/// `Config::batch_worker_interval`, honoring shutdown.
pub async fn run_batch_worker(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.batch_worker_interval);
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = process_due_batches(&state).await {
                    error!(error = %e, "batch worker tick failed");
                }
            }
        }
    }
}

async fn process_due_batches(state: &AppState) -> Result<(), sqlx::Error> {
    let due = repo::notification_batches::find_due(&state.pool, Utc::now()).await?;
    for batch in due {
        let vph = velocity::current_votes_per_hour(&state.pool, batch.content_type, batch.content_id).await?;
        let meets_threshold = state
            .velocity_detector
            .should_notify(&state.pool, batch.user_id, batch.content_type, vph)
            .await?;

        if meets_threshold {
            let noun = match batch.content_type {
                ContentType::Post => "post",
                ContentType::Comment => "comment",
            };
            let user_id = batch.user_id;
            let notification = repo::notifications::insert_if_absent(
                &state.pool,
                NewNotification {
                    user_id,
                    notification_type: velocity_type(batch.content_type),
                    content_type: Some(batch.content_type),
                    content_id: Some(batch.content_id),
                    milestone_count: None,
                    votes_per_hour: Some(vph),
                    message: &format!("Your {noun} is trending at {vph:.1} upvotes/hour!"),
                },
            )
            .await?;
            if let Some(record) = notification {
                state.hub.deliver_to(user_id, Event::Notification(record)).await;
            }
        }

        repo::notification_batches::mark_processed(&state.pool, batch.id).await?;
    }
    Ok(())
}

/// Adaptive baseline window, in days: more history earns a wider lookback.
fn baseline_window_days(total_posts: i32, total_comments: i32) -> i64 {
    match total_posts + total_comments {
        0..=10 => 7,
        11..=50 => 30,
        _ => 90,
    }
}

/// Recomputes every user's vote-rate baseline on a fixed cadence.
/// `total_posts`/`total_comments` are owned by the out-of-core content
/// system; this worker only refreshes the derived averages over the
/// window those totals select, using whatever totals are already on
/// file (0/0 for a user with none yet).
pub async fn run_baseline_worker(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.baseline_worker_interval);
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = recompute_all_baselines(&state).await {
                    error!(error = %e, "baseline worker tick failed");
                }
            }
        }
    }
}

async fn recompute_all_baselines(state: &AppState) -> Result<(), sqlx::Error> {
    let user_ids = repo::baselines::all_user_ids(&state.pool).await?;
    for user_id in user_ids {
        let existing = repo::baselines::find_by_user(&state.pool, user_id).await?;
        let (total_posts, total_comments) = existing
            .map(|b| (b.total_posts, b.total_comments))
            .unwrap_or((0, 0));
        let window_days = baseline_window_days(total_posts, total_comments);

        let avg_post = repo::vote_activity::average_votes_per_hour_for_author(
            &state.pool,
            user_id,
            ContentType::Post,
            window_days,
        )
        .await?;
        let avg_comment = repo::vote_activity::average_votes_per_hour_for_author(
            &state.pool,
            user_id,
            ContentType::Comment,
            window_days,
        )
        .await?;

        repo::baselines::upsert(&state.pool, user_id, avg_post, avg_comment, total_posts, total_comments).await?;
    }
    info!("baseline recalculation pass complete");
    Ok(())
}

/// Daily sweep: drops notifications past the configured retention horizon
/// and vote-activity rows past the lookback-plus-margin horizon.
pub async fn run_retention_worker(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.retention_worker_interval);
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = sweep_retention(&state).await {
                    error!(error = %e, "retention worker tick failed");
                }
            }
        }
    }
}

async fn sweep_retention(state: &AppState) -> Result<(), sqlx::Error> {
    let notifications = repo::notifications::delete_older_than_days(&state.pool, state.config.notification_retention_days).await?;
    let votes = repo::vote_activity::delete_older_than_days(&state.pool, state.config.vote_activity_retention_days).await?;
    info!(notifications, votes, "retention sweep complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_widens_with_more_history() {
        assert_eq!(baseline_window_days(0, 0), 7);
        assert_eq!(baseline_window_days(10, 0), 7);
        assert_eq!(baseline_window_days(11, 0), 30);
        assert_eq!(baseline_window_days(50, 0), 30);
        assert_eq!(baseline_window_days(51, 0), 90);
    }
}
