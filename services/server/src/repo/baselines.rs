use sqlx::{PgPool, Row};

pub struct BaselineRow {
    pub user_id: i64,
    pub avg_post_votes_per_hour: f64,
    pub avg_comment_votes_per_hour: f64,
    pub total_posts: i32,
    pub total_comments: i32,
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<BaselineRow>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT user_id, avg_post_votes_per_hour, avg_comment_votes_per_hour, total_posts, total_comments
         FROM user_baselines WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| BaselineRow {
        user_id: r.get("user_id"),
        avg_post_votes_per_hour: r.get("avg_post_votes_per_hour"),
        avg_comment_votes_per_hour: r.get("avg_comment_votes_per_hour"),
        total_posts: r.get("total_posts"),
        total_comments: r.get("total_comments"),
    }))
}

pub async fn all_user_ids(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<i64> = sqlx::query_scalar("SELECT id FROM users").fetch_all(pool).await?;
    Ok(rows)
}

pub async fn upsert(
    pool: &PgPool,
    user_id: i64,
    avg_post_votes_per_hour: f64,
    avg_comment_votes_per_hour: f64,
    total_posts: i32,
    total_comments: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO user_baselines
               (user_id, avg_post_votes_per_hour, avg_comment_votes_per_hour, total_posts, total_comments, last_calculated_at)
           VALUES ($1, $2, $3, $4, $5, now())
           ON CONFLICT (user_id) DO UPDATE SET
               avg_post_votes_per_hour = EXCLUDED.avg_post_votes_per_hour,
               avg_comment_votes_per_hour = EXCLUDED.avg_comment_votes_per_hour,
               total_posts = EXCLUDED.total_posts,
               total_comments = EXCLUDED.total_comments,
               last_calculated_at = now()"#,
    )
    .bind(user_id)
    .bind(avg_post_votes_per_hour)
    .bind(avg_comment_votes_per_hour)
    .bind(total_posts)
    .bind(total_comments)
    .execute(pool)
    .await?;
    Ok(())
}
