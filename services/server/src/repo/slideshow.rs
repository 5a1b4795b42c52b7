use rt_protocol::{SlideshowSessionRecord, SlideshowType};
use sqlx::{PgPool, Postgres, Row, Transaction};

fn parse_slideshow_type(s: &str) -> SlideshowType {
    match s {
        "reddit" => SlideshowType::Reddit,
        _ => SlideshowType::Personal,
    }
}

fn row_to_record(row: sqlx::postgres::PgRow) -> SlideshowSessionRecord {
    SlideshowSessionRecord {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        slideshow_type: parse_slideshow_type(row.get::<String, _>("slideshow_type").as_str()),
        current_index: row.get("current_index"),
        total_items: row.get("total_items"),
        controller_user_id: row.get("controller_user_id"),
        auto_advance: row.get("auto_advance"),
        auto_advance_interval: row.get("auto_advance_interval"),
    }
}

pub struct NewPersonalItem<'a> {
    pub media_file_id: i64,
    pub caption: Option<&'a str>,
}

/// Starts a personal-photo slideshow, inserting the full item list in the
/// same transaction so `total_items` and `slideshow_media_items` never
/// disagree. Starting twice on one conversation is rejected by the
/// `slideshow_sessions.conversation_id` unique constraint.
pub async fn create_personal(
    pool: &PgPool,
    conversation_id: i64,
    controller_user_id: i64,
    items: &[NewPersonalItem<'_>],
) -> Result<SlideshowSessionRecord, sqlx::Error> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    let row = sqlx::query(
        r#"INSERT INTO slideshow_sessions
               (conversation_id, slideshow_type, current_index, total_items, controller_user_id)
           VALUES ($1, 'personal', 0, $2, $3)
           RETURNING id, conversation_id, slideshow_type, current_index, total_items,
                     controller_user_id, auto_advance, auto_advance_interval"#,
    )
    .bind(conversation_id)
    .bind(items.len() as i32)
    .bind(controller_user_id)
    .fetch_one(&mut *tx)
    .await?;
    let record = row_to_record(row);

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO slideshow_media_items (session_id, media_file_id, position, caption) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(item.media_file_id)
        .bind(position as i32)
        .bind(item.caption)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(record)
}

/// Starts a Reddit-gallery slideshow. Item count is supplied by the caller
/// (resolved against the external source outside the core); no rows are
/// written to `slideshow_media_items` since membership lives externally.
pub async fn create_reddit(
    pool: &PgPool,
    conversation_id: i64,
    controller_user_id: i64,
    external_source_id: &str,
    external_sort: &str,
    total_items: i32,
) -> Result<SlideshowSessionRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO slideshow_sessions
               (conversation_id, slideshow_type, external_source_id, external_sort, current_index, total_items, controller_user_id)
           VALUES ($1, 'reddit', $2, $3, 0, $4, $5)
           RETURNING id, conversation_id, slideshow_type, current_index, total_items,
                     controller_user_id, auto_advance, auto_advance_interval"#,
    )
    .bind(conversation_id)
    .bind(external_source_id)
    .bind(external_sort)
    .bind(total_items)
    .bind(controller_user_id)
    .fetch_one(pool)
    .await?;
    Ok(row_to_record(row))
}

pub async fn find_by_conversation(
    pool: &PgPool,
    conversation_id: i64,
) -> Result<Option<SlideshowSessionRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, conversation_id, slideshow_type, current_index, total_items,
                  controller_user_id, auto_advance, auto_advance_interval
           FROM slideshow_sessions WHERE conversation_id = $1"#,
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_record))
}

pub async fn find_by_id(pool: &PgPool, session_id: i64) -> Result<Option<SlideshowSessionRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, conversation_id, slideshow_type, current_index, total_items,
                  controller_user_id, auto_advance, auto_advance_interval
           FROM slideshow_sessions WHERE id = $1"#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_record))
}

pub async fn update_index(pool: &PgPool, session_id: i64, new_index: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE slideshow_sessions SET current_index = $2, updated_at = now() WHERE id = $1")
        .bind(session_id)
        .bind(new_index)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_controller(pool: &PgPool, session_id: i64, new_controller: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE slideshow_sessions SET controller_user_id = $2, updated_at = now() WHERE id = $1")
        .bind(session_id)
        .bind(new_controller)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_auto_advance(
    pool: &PgPool,
    session_id: i64,
    auto_advance: bool,
    interval: Option<i32>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE slideshow_sessions SET auto_advance = $2, auto_advance_interval = $3, updated_at = now() WHERE id = $1",
    )
    .bind(session_id)
    .bind(auto_advance)
    .bind(interval)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn stop(pool: &PgPool, session_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM slideshow_sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}
