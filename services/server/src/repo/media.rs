use sqlx::{PgPool, Row};

pub struct MediaFileRow {
    pub id: i64,
    pub owner_id: i64,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub used_in_message_id: Option<i64>,
}

pub struct NewMediaFile<'a> {
    pub owner_id: i64,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub storage_path: &'a str,
    pub thumbnail_path: Option<&'a str>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<f64>,
}

pub async fn insert(pool: &PgPool, new: NewMediaFile<'_>) -> Result<i64, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO media_files
               (owner_id, content_type, size_bytes, storage_path, thumbnail_path, width, height, duration_seconds)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING id"#,
    )
    .bind(new.owner_id)
    .bind(new.content_type)
    .bind(new.size_bytes)
    .bind(new.storage_path)
    .bind(new.thumbnail_path)
    .bind(new.width)
    .bind(new.height)
    .bind(new.duration_seconds)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn find_by_id(pool: &PgPool, media_file_id: i64) -> Result<Option<MediaFileRow>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, owner_id, content_type, size_bytes, storage_path, used_in_message_id FROM media_files WHERE id = $1",
    )
    .bind(media_file_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| MediaFileRow {
        id: r.get("id"),
        owner_id: r.get("owner_id"),
        content_type: r.get("content_type"),
        size_bytes: r.get("size_bytes"),
        storage_path: r.get("storage_path"),
        used_in_message_id: r.get("used_in_message_id"),
    }))
}

/// Records which message a media file ended up attached to. Soft back-reference
/// only; `messages.media_file_id` remains the authoritative link (see migration 0004).
pub async fn mark_used_in_message(
    pool: &PgPool,
    media_file_id: i64,
    message_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE media_files SET used_in_message_id = $2 WHERE id = $1")
        .bind(media_file_id)
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}
