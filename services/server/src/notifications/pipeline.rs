use chrono::{Duration, Utc};
use rt_protocol::{ContentType, Event, NotificationType};
use tokio::sync::mpsc;
use tracing::{error, warn};

use super::events::{NotificationEvent, ReplyCreated, VoteRegistered};
use super::milestones;
use super::velocity;
use crate::repo;
use crate::repo::notifications::NewNotification;
use crate::state::AppState;

/// How far ahead a coalesced velocity batch is scheduled.
const BATCH_DELAY: Duration = Duration::minutes(15);

/// Drains the notification-event channel until the sender is dropped or
/// shutdown is requested. Every event is handled independently and its
/// failures are logged, never propagated: a single bad event must never
/// take the worker down.
pub async fn run(state: AppState, mut events: mpsc::UnboundedReceiver<NotificationEvent>) {
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            event = events.recv() => {
                match event {
                    Some(NotificationEvent::Vote(vote)) => {
                        if let Err(e) = handle_vote(&state, vote).await {
                            error!(error = %e, "notification pipeline: vote handling failed");
                        }
                    }
                    Some(NotificationEvent::Reply(reply)) => {
                        if let Err(e) = handle_reply(&state, reply).await {
                            error!(error = %e, "notification pipeline: reply handling failed");
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

fn velocity_type(content_type: ContentType) -> NotificationType {
    match content_type {
        ContentType::Post => NotificationType::PostVelocity,
        ContentType::Comment => NotificationType::CommentVelocity,
    }
}

fn milestone_type(content_type: ContentType) -> NotificationType {
    match content_type {
        ContentType::Post => NotificationType::PostMilestone,
        ContentType::Comment => NotificationType::CommentMilestone,
    }
}

async fn notify(state: &AppState, new: NewNotification<'_>) -> Result<(), sqlx::Error> {
    let user_id = new.user_id;
    if let Some(record) = repo::notifications::insert_if_absent(&state.pool, new).await? {
        state.hub.deliver_to(user_id, Event::Notification(record)).await;
    }
    Ok(())
}

async fn handle_vote(state: &AppState, vote: VoteRegistered) -> Result<(), sqlx::Error> {
    if let Some(threshold) = milestones::highest_crossed(vote.current_upvotes) {
        let noun = match vote.content_type {
            ContentType::Post => "post",
            ContentType::Comment => "comment",
        };
        notify(
            state,
            NewNotification {
                user_id: vote.author_id,
                notification_type: milestone_type(vote.content_type),
                content_type: Some(vote.content_type),
                content_id: Some(vote.content_id),
                milestone_count: Some(threshold as i32),
                votes_per_hour: None,
                message: &format!("Your {noun} reached {threshold} upvotes!"),
            },
        )
        .await?;
    }

    let vph = velocity::current_votes_per_hour(&state.pool, vote.content_type, vote.content_id).await?;
    if !state
        .velocity_detector
        .should_notify(&state.pool, vote.author_id, vote.content_type, vph)
        .await?
    {
        return Ok(());
    }

    let exponential = state
        .velocity_detector
        .is_exponential_growth(&state.pool, vote.content_type, vote.content_id, vph)
        .await?;

    let noun = match vote.content_type {
        ContentType::Post => "post",
        ContentType::Comment => "comment",
    };

    if exponential {
        repo::notification_batches::cancel_pending(
            &state.pool,
            vote.author_id,
            vote.content_type,
            vote.content_id,
            velocity_type(vote.content_type),
        )
        .await?;
        notify(
            state,
            NewNotification {
                user_id: vote.author_id,
                notification_type: velocity_type(vote.content_type),
                content_type: Some(vote.content_type),
                content_id: Some(vote.content_id),
                milestone_count: None,
                votes_per_hour: Some(vph),
                message: &format!("Your {noun} is trending at {vph:.1} upvotes/hour!"),
            },
        )
        .await?;
    } else {
        repo::notification_batches::schedule_or_get_pending(
            &state.pool,
            vote.author_id,
            vote.content_type,
            vote.content_id,
            velocity_type(vote.content_type),
            Utc::now() + BATCH_DELAY,
        )
        .await?;
    }

    Ok(())
}

async fn handle_reply(state: &AppState, reply: ReplyCreated) -> Result<(), sqlx::Error> {
    if reply.parent_author_id == reply.reply_author_id {
        return Ok(());
    }
    if !repo::preferences::notify_comment_replies(&state.pool, reply.parent_author_id).await? {
        return Ok(());
    }

    notify(
        state,
        NewNotification {
            user_id: reply.parent_author_id,
            notification_type: NotificationType::CommentReply,
            content_type: Some(ContentType::Comment),
            content_id: Some(reply.reply_id),
            milestone_count: None,
            votes_per_hour: None,
            message: &format!("{} replied to your comment", reply.reply_author_username),
        },
    )
    .await?;
    Ok(())
}

/// Sends a [`NotificationEvent`] without blocking the caller, logging (not
/// propagating) a send failure — the receiver only ever disappears at
/// shutdown.
pub fn fire_and_forget(state: &AppState, event: NotificationEvent) {
    if state.notification_events.send(event).is_err() {
        warn!("notification pipeline channel closed, dropping event");
    }
}
