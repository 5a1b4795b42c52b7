use sqlx::{PgPool, Row};

pub struct BlockedUserRow {
    pub user_id: i64,
    pub username: String,
}

pub async fn is_blocked(pool: &PgPool, blocker_id: i64, blocked_id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM blocked_users WHERE blocker_id = $1 AND blocked_id = $2",
    )
    .bind(blocker_id)
    .bind(blocked_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn block(pool: &PgPool, blocker_id: i64, blocked_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO blocked_users (blocker_id, blocked_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(blocker_id)
    .bind(blocked_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn unblock(pool: &PgPool, blocker_id: i64, blocked_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM blocked_users WHERE blocker_id = $1 AND blocked_id = $2")
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_blocked(pool: &PgPool, blocker_id: i64) -> Result<Vec<BlockedUserRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT u.id, u.username FROM blocked_users b
           JOIN users u ON u.id = b.blocked_id
           WHERE b.blocker_id = $1
           ORDER BY u.username"#,
    )
    .bind(blocker_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| BlockedUserRow {
            user_id: r.get("id"),
            username: r.get("username"),
        })
        .collect())
}
