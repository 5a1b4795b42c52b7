use axum::extract::{Multipart, State};
use axum::response::Response;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::engine;
use crate::engine::media::UploadInput;
use crate::error::{CoreError, CoreResult};
use crate::http::response;
use crate::state::AppState;

/// Caps a single upload's body (storage quotas and antivirus scanning are
/// external collaborators; this is just a sane hot-path guard).
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Serialize)]
pub struct MediaUploadResponse {
    pub id: i64,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// `POST /media/upload` — multipart; returns a media record. Only the
/// `file` field is read; everything else (width/height/duration) is left
/// for the client to report out of band via the message send call,
/// matching the data model's soft optional fields on `MediaFile`.
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> CoreResult<Response> {
    let mut content_type = "application/octet-stream".to_owned();
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(CoreError::Validation("file too large".to_owned()));
        }
        bytes = Some(data.to_vec());
    }

    let bytes = bytes.ok_or_else(|| CoreError::Validation("missing file field".to_owned()))?;

    let uploaded = engine::media::upload(
        &state,
        UploadInput {
            owner_id: user.user_id,
            content_type: &content_type,
            bytes: &bytes,
            width: None,
            height: None,
            duration_seconds: None,
        },
    )
    .await?;

    Ok(response::created(MediaUploadResponse {
        id: uploaded.id,
        url: uploaded.storage_path,
        thumbnail_url: uploaded.thumbnail_path,
    }))
}
