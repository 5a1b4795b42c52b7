use rt_protocol::UserRole;
use sqlx::{PgPool, Row};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub public_key: Option<String>,
}

fn parse_role(role: &str) -> UserRole {
    match role {
        "moderator" => UserRole::Moderator,
        "admin" => UserRole::Admin,
        _ => UserRole::User,
    }
}

pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query("SELECT id, username, role, public_key FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| UserRow {
        id: r.get("id"),
        username: r.get("username"),
        role: parse_role(r.get::<String, _>("role").as_str()),
        public_key: r.get("public_key"),
    }))
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query("SELECT id, username, role, public_key FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| UserRow {
        id: r.get("id"),
        username: r.get("username"),
        role: parse_role(r.get::<String, _>("role").as_str()),
        public_key: r.get("public_key"),
    }))
}

pub async fn touch_last_seen(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_seen_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
