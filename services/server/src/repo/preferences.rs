use sqlx::PgPool;

/// Reads `notify_comment_replies`, defaulting to `true` for a user who has
/// never written a row (the column default, applied lazily rather than
/// backfilled — see migration 0011).
pub async fn notify_comment_replies(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
    let value: Option<bool> = sqlx::query_scalar(
        "SELECT notify_comment_replies FROM user_notification_preferences WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(value.unwrap_or(true))
}

pub async fn set_notify_comment_replies(
    pool: &PgPool,
    user_id: i64,
    value: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO user_notification_preferences (user_id, notify_comment_replies)
           VALUES ($1, $2)
           ON CONFLICT (user_id) DO UPDATE SET notify_comment_replies = EXCLUDED.notify_comment_replies"#,
    )
    .bind(user_id)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
