use rt_protocol::{ContentType, NotificationRecord, NotificationType};
use sqlx::{PgPool, Row};

fn parse_notification_type(s: &str) -> NotificationType {
    match s {
        "post_velocity" => NotificationType::PostVelocity,
        "comment_milestone" => NotificationType::CommentMilestone,
        "comment_velocity" => NotificationType::CommentVelocity,
        "comment_reply" => NotificationType::CommentReply,
        _ => NotificationType::PostMilestone,
    }
}

fn parse_content_type(s: &str) -> ContentType {
    match s {
        "comment" => ContentType::Comment,
        _ => ContentType::Post,
    }
}

fn row_to_record(row: sqlx::postgres::PgRow) -> NotificationRecord {
    NotificationRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        notification_type: parse_notification_type(row.get::<String, _>("notification_type").as_str()),
        content_type: row
            .get::<Option<String>, _>("content_type")
            .map(|s| parse_content_type(&s)),
        content_id: row.get("content_id"),
        milestone_count: row.get("milestone_count"),
        votes_per_hour: row.get("votes_per_hour"),
        message: row.get("message"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

pub struct NewNotification<'a> {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content_type: Option<ContentType>,
    pub content_id: Option<i64>,
    pub milestone_count: Option<i32>,
    pub votes_per_hour: Option<f64>,
    pub message: &'a str,
}

/// Inserts a notification, relying on `notifications`' unique key over
/// `(user_id, content_type, content_id, notification_type, milestone_count)`
/// to make milestone notifications idempotent under concurrent vote
/// registration. Returns `None` when the row already existed.
pub async fn insert_if_absent(
    pool: &PgPool,
    new: NewNotification<'_>,
) -> Result<Option<NotificationRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO notifications
               (user_id, notification_type, content_type, content_id, milestone_count, votes_per_hour, message)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           ON CONFLICT (user_id, content_type, content_id, notification_type, milestone_count) DO NOTHING
           RETURNING id, user_id, notification_type, content_type, content_id, milestone_count, votes_per_hour, message, read, created_at"#,
    )
    .bind(new.user_id)
    .bind(new.notification_type.as_str())
    .bind(new.content_type.map(ContentType::as_str))
    .bind(new.content_id)
    .bind(new.milestone_count)
    .bind(new.votes_per_hour)
    .bind(new.message)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_record))
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<NotificationRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, user_id, notification_type, content_type, content_id, milestone_count, votes_per_hour, message, read, created_at
           FROM notifications
           WHERE user_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_record).collect())
}

pub async fn mark_read(pool: &PgPool, notification_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, notification_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_older_than_days(pool: &PgPool, days: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE created_at < now() - make_interval(days => $1)")
        .bind(days as i32)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
