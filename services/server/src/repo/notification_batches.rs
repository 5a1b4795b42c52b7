use chrono::{DateTime, Utc};
use rt_protocol::{ContentType, NotificationType};
use sqlx::{PgPool, Row};

pub struct BatchRow {
    pub id: i64,
    pub user_id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub notification_type: NotificationType,
    pub scheduled_for: DateTime<Utc>,
}

fn parse_content_type(s: &str) -> ContentType {
    match s {
        "comment" => ContentType::Comment,
        _ => ContentType::Post,
    }
}

fn parse_velocity_type(s: &str) -> NotificationType {
    match s {
        "comment_velocity" => NotificationType::CommentVelocity,
        _ => NotificationType::PostVelocity,
    }
}

fn row_to_batch(row: sqlx::postgres::PgRow) -> BatchRow {
    BatchRow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        content_type: parse_content_type(row.get::<String, _>("content_type").as_str()),
        content_id: row.get("content_id"),
        notification_type: parse_velocity_type(row.get::<String, _>("notification_type").as_str()),
        scheduled_for: row.get("scheduled_for"),
    }
}

/// Schedules a new pending batch, or returns the one already pending for the
/// same `(user, content, notification_type)` key — the partial unique index
/// `notification_batches_one_pending` enforces at most one at a time, which
/// is what lets velocity events coalesce.
pub async fn schedule_or_get_pending(
    pool: &PgPool,
    user_id: i64,
    content_type: ContentType,
    content_id: i64,
    notification_type: NotificationType,
    scheduled_for: DateTime<Utc>,
) -> Result<BatchRow, sqlx::Error> {
    let inserted = sqlx::query(
        r#"INSERT INTO notification_batches
               (user_id, content_type, content_id, notification_type, scheduled_for, status)
           VALUES ($1, $2, $3, $4, $5, 'pending')
           ON CONFLICT (user_id, content_type, content_id, notification_type) WHERE status = 'pending'
           DO NOTHING
           RETURNING id, user_id, content_type, content_id, notification_type, scheduled_for"#,
    )
    .bind(user_id)
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(notification_type.as_str())
    .bind(scheduled_for)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return Ok(row_to_batch(row));
    }

    let existing = sqlx::query(
        r#"SELECT id, user_id, content_type, content_id, notification_type, scheduled_for
           FROM notification_batches
           WHERE user_id = $1 AND content_type = $2 AND content_id = $3
             AND notification_type = $4 AND status = 'pending'"#,
    )
    .bind(user_id)
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(notification_type.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row_to_batch(existing))
}

pub async fn find_due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<BatchRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, user_id, content_type, content_id, notification_type, scheduled_for
           FROM notification_batches
           WHERE status = 'pending' AND scheduled_for <= $1"#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_batch).collect())
}

pub async fn mark_processed(pool: &PgPool, batch_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notification_batches SET status = 'processed', processed_at = now() WHERE id = $1")
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Cancels any still-pending batch for the key, used when a velocity
/// event's exponential-growth shortcut fires a notification immediately
/// and the deferred batch is no longer needed.
pub async fn cancel_pending(
    pool: &PgPool,
    user_id: i64,
    content_type: ContentType,
    content_id: i64,
    notification_type: NotificationType,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE notification_batches
           SET status = 'cancelled'
           WHERE user_id = $1 AND content_type = $2 AND content_id = $3
             AND notification_type = $4 AND status = 'pending'"#,
    )
    .bind(user_id)
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(notification_type.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
