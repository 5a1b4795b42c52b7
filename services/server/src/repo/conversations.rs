use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

pub struct ConversationRow {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ConversationRow {
    pub fn participants(&self) -> (i64, i64) {
        (self.user1_id, self.user2_id)
    }

    pub fn other_participant(&self, user_id: i64) -> Option<i64> {
        if user_id == self.user1_id {
            Some(self.user2_id)
        } else if user_id == self.user2_id {
            Some(self.user1_id)
        } else {
            None
        }
    }

    pub fn has_participant(&self, user_id: i64) -> bool {
        user_id == self.user1_id || user_id == self.user2_id
    }
}

fn row_to_conversation(row: sqlx::postgres::PgRow) -> ConversationRow {
    ConversationRow {
        id: row.get("id"),
        user1_id: row.get("user1_id"),
        user2_id: row.get("user2_id"),
        created_at: row.get("created_at"),
        last_message_at: row.get("last_message_at"),
    }
}

/// Creates the conversation for `(a, b)` in canonical order if it does not
/// already exist, or returns the existing row. Never creates a duplicate
/// under concurrent calls: relies on `conversations_unique_pair`.
pub async fn create_or_get(
    pool: &PgPool,
    a: i64,
    b: i64,
) -> Result<(ConversationRow, bool), sqlx::Error> {
    let (user1, user2) = if a < b { (a, b) } else { (b, a) };

    let inserted = sqlx::query(
        r#"INSERT INTO conversations (user1_id, user2_id)
           VALUES ($1, $2)
           ON CONFLICT (user1_id, user2_id) DO NOTHING
           RETURNING id, user1_id, user2_id, created_at, last_message_at"#,
    )
    .bind(user1)
    .bind(user2)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return Ok((row_to_conversation(row), true));
    }

    let existing = sqlx::query(
        "SELECT id, user1_id, user2_id, created_at, last_message_at FROM conversations WHERE user1_id = $1 AND user2_id = $2",
    )
    .bind(user1)
    .bind(user2)
    .fetch_one(pool)
    .await?;
    Ok((row_to_conversation(existing), false))
}

pub async fn find_by_id(
    pool: &PgPool,
    conversation_id: i64,
) -> Result<Option<ConversationRow>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, user1_id, user2_id, created_at, last_message_at FROM conversations WHERE id = $1",
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_conversation))
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ConversationRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, user1_id, user2_id, created_at, last_message_at
           FROM conversations
           WHERE user1_id = $1 OR user2_id = $1
           ORDER BY last_message_at DESC NULLS LAST, created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_conversation).collect())
}

pub async fn touch_last_message_at(
    pool: &PgPool,
    conversation_id: i64,
    when: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(when)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, conversation_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
