use crate::error::CoreResult;
use crate::repo;
use crate::repo::media::NewMediaFile;
use crate::state::AppState;

pub struct UploadInput<'a> {
    pub owner_id: i64,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<f64>,
}

pub struct UploadedMedia {
    pub id: i64,
    pub storage_path: String,
    pub thumbnail_path: Option<String>,
}

/// Persists an uploaded blob via the pluggable [`crate::media::MediaStorage`]
/// collaborator and records its metadata. File storage for media blobs and
/// thumbnail generation live outside this crate.
pub async fn upload(state: &AppState, input: UploadInput<'_>) -> CoreResult<UploadedMedia> {
    let stored = state
        .media_storage
        .store(input.owner_id, input.content_type, input.bytes)
        .await?;

    let id = repo::media::insert(
        &state.pool,
        NewMediaFile {
            owner_id: input.owner_id,
            content_type: input.content_type,
            size_bytes: input.bytes.len() as i64,
            storage_path: &stored.storage_path,
            thumbnail_path: stored.thumbnail_path.as_deref(),
            width: input.width,
            height: input.height,
            duration_seconds: input.duration_seconds,
        },
    )
    .await?;

    Ok(UploadedMedia {
        id,
        storage_path: stored.storage_path,
        thumbnail_path: stored.thumbnail_path,
    })
}
