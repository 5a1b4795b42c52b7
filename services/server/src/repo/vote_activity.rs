use rt_protocol::ContentType;
use sqlx::PgPool;

/// Out-of-core vote handling writes here directly; the notification
/// pipeline only ever reads this table (see migration 0009).
pub async fn record_vote(
    pool: &PgPool,
    content_type: ContentType,
    content_id: i64,
    author_id: i64,
    voter_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO vote_activity (content_type, content_id, author_id, voter_id, hour_bucket)
           VALUES ($1, $2, $3, $4, date_trunc('hour', now()))"#,
    )
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(author_id)
    .bind(voter_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Votes per hour for a piece of content over the trailing `window_hours`,
/// used by the velocity detector.
pub async fn votes_per_hour(
    pool: &PgPool,
    content_type: ContentType,
    content_id: i64,
    window_hours: i64,
) -> Result<f64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM vote_activity
           WHERE content_type = $1 AND content_id = $2
             AND created_at >= now() - make_interval(hours => $3)"#,
    )
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(window_hours as i32)
    .fetch_one(pool)
    .await?;
    Ok(count as f64 / window_hours as f64)
}

/// Vote count in the single hour bucket `hours_ago` hours before the
/// current one, used to evaluate exponential growth against the
/// immediately preceding hour.
pub async fn votes_in_hour_offset(
    pool: &PgPool,
    content_type: ContentType,
    content_id: i64,
    hours_ago: i64,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM vote_activity
           WHERE content_type = $1 AND content_id = $2
             AND hour_bucket = date_trunc('hour', now()) - make_interval(hours => $3)"#,
    )
    .bind(content_type.as_str())
    .bind(content_id)
    .bind(hours_ago as i32)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Average votes/hour for everything a user authored of one content type,
/// over a trailing window measured in days. Feeds the baseline worker's
/// adaptive-window recalculation.
pub async fn average_votes_per_hour_for_author(
    pool: &PgPool,
    author_id: i64,
    content_type: ContentType,
    window_days: i64,
) -> Result<f64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM vote_activity
           WHERE author_id = $1 AND content_type = $2
             AND created_at >= now() - make_interval(days => $3)"#,
    )
    .bind(author_id)
    .bind(content_type.as_str())
    .bind(window_days as i32)
    .fetch_one(pool)
    .await?;
    Ok(count as f64 / (window_days as f64 * 24.0))
}

pub async fn delete_older_than_days(pool: &PgPool, days: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM vote_activity WHERE created_at < now() - make_interval(days => $1)")
        .bind(days as i32)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
