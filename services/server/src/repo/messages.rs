use chrono::{DateTime, Utc};
use rt_protocol::{MediaRef, MessageRecord, MessageType};
use sqlx::{PgPool, Row};

fn parse_message_type(s: &str) -> MessageType {
    match s {
        "image" => MessageType::Image,
        "video" => MessageType::Video,
        "audio" => MessageType::Audio,
        "gif" => MessageType::Gif,
        _ => MessageType::Text,
    }
}

/// Columns selected by every query in this module, joined against
/// `media_files` so a single round trip produces a full `MessageRecord`.
const SELECT_COLUMNS: &str = r#"
    m.id, m.conversation_id, m.sender_id, m.recipient_id, m.message_type,
    m.encrypted_content, m.sender_encrypted_content, m.encryption_version,
    m.sent_at, m.delivered_at, m.read_at,
    m.media_file_id, m.recipient_media_key_wrap, m.sender_media_key_wrap, m.media_iv,
    mf.storage_path, mf.content_type, mf.size_bytes
"#;

fn row_to_record(row: sqlx::postgres::PgRow) -> MessageRecord {
    let media = row
        .get::<Option<i64>, _>("media_file_id")
        .map(|media_file_id| MediaRef {
            media_file_id,
            url: row.get("storage_path"),
            mime_type: row.get("content_type"),
            size_bytes: row.get("size_bytes"),
            recipient_key_wrap: row.get("recipient_media_key_wrap"),
            sender_key_wrap: row.get("sender_media_key_wrap"),
            iv: row.get("media_iv"),
        });

    MessageRecord {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        message_type: parse_message_type(row.get::<String, _>("message_type").as_str()),
        encrypted_content: row.get("encrypted_content"),
        sender_encrypted_content: row.get("sender_encrypted_content"),
        encryption_version: row.get("encryption_version"),
        media,
        sent_at: row.get("sent_at"),
        delivered_at: row.get("delivered_at"),
        read_at: row.get("read_at"),
    }
}

pub struct NewMessage<'a> {
    pub conversation_id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub message_type: MessageType,
    pub encrypted_content: &'a str,
    pub sender_encrypted_content: &'a str,
    pub encryption_version: &'a str,
    pub media_file_id: Option<i64>,
    pub recipient_media_key_wrap: Option<&'a str>,
    pub sender_media_key_wrap: Option<&'a str>,
    pub media_iv: Option<&'a str>,
}

pub async fn insert(pool: &PgPool, new: NewMessage<'_>) -> Result<MessageRecord, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"WITH inserted AS (
               INSERT INTO messages (
                   conversation_id, sender_id, recipient_id, message_type,
                   encrypted_content, sender_encrypted_content, encryption_version,
                   media_file_id, recipient_media_key_wrap, sender_media_key_wrap, media_iv
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING *
           )
           SELECT {SELECT_COLUMNS}
           FROM inserted m
           LEFT JOIN media_files mf ON mf.id = m.media_file_id"#
    ))
    .bind(new.conversation_id)
    .bind(new.sender_id)
    .bind(new.recipient_id)
    .bind(new.message_type.as_str())
    .bind(new.encrypted_content)
    .bind(new.sender_encrypted_content)
    .bind(new.encryption_version)
    .bind(new.media_file_id)
    .bind(new.recipient_media_key_wrap)
    .bind(new.sender_media_key_wrap)
    .bind(new.media_iv)
    .fetch_one(pool)
    .await?;
    Ok(row_to_record(row))
}

pub async fn find_by_id(pool: &PgPool, message_id: i64) -> Result<Option<MessageRecord>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages m LEFT JOIN media_files mf ON mf.id = m.media_file_id WHERE m.id = $1"
    ))
    .bind(message_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_record))
}

pub async fn list_for_conversation(
    pool: &PgPool,
    conversation_id: i64,
    viewer_id: i64,
    before_id: Option<i64>,
    limit: i64,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"SELECT {SELECT_COLUMNS}
           FROM messages m
           LEFT JOIN media_files mf ON mf.id = m.media_file_id
           WHERE m.conversation_id = $1
             AND ($2::BIGINT IS NULL OR m.id < $2)
             AND NOT ((m.sender_id = $3 AND m.deleted_for_sender)
                   OR (m.recipient_id = $3 AND m.deleted_for_recipient))
           ORDER BY m.id DESC
           LIMIT $4"#
    ))
    .bind(conversation_id)
    .bind(before_id)
    .bind(viewer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_record).collect())
}

pub async fn mark_delivered(pool: &PgPool, message_id: i64) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let row = sqlx::query(
        "UPDATE messages SET delivered_at = now() WHERE id = $1 AND delivered_at IS NULL RETURNING delivered_at",
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.get("delivered_at")))
}

pub async fn mark_read(pool: &PgPool, message_id: i64) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let row = sqlx::query(
        "UPDATE messages SET read_at = now(), delivered_at = COALESCE(delivered_at, now())
         WHERE id = $1 AND read_at IS NULL RETURNING read_at",
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.get("read_at")))
}

/// Marks every unread message addressed to `reader_id` in the conversation
/// as read, returning the affected message ids.
pub async fn mark_conversation_read(
    pool: &PgPool,
    conversation_id: i64,
    reader_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows = sqlx::query(
        r#"UPDATE messages
           SET read_at = now(), delivered_at = COALESCE(delivered_at, now())
           WHERE conversation_id = $1 AND recipient_id = $2 AND read_at IS NULL
           RETURNING id"#,
    )
    .bind(conversation_id)
    .bind(reader_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.get("id")).collect())
}

pub async fn soft_delete(
    pool: &PgPool,
    message_id: i64,
    viewer_id: i64,
    sender_id: i64,
    recipient_id: i64,
) -> Result<(), sqlx::Error> {
    if viewer_id == sender_id {
        sqlx::query("UPDATE messages SET deleted_for_sender = true WHERE id = $1")
            .bind(message_id)
            .execute(pool)
            .await?;
    } else if viewer_id == recipient_id {
        sqlx::query("UPDATE messages SET deleted_for_recipient = true WHERE id = $1")
            .bind(message_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Hard-deletes the row once both participants have soft-deleted it.
/// Returns whether the row was removed.
pub async fn hard_delete_if_both_deleted(pool: &PgPool, message_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM messages WHERE id = $1 AND deleted_for_sender AND deleted_for_recipient",
    )
    .bind(message_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
