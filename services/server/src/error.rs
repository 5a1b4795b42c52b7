use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rt_protocol::HttpErrorEnvelope;

/// Every error the core surfaces to an HTTP caller.
///
/// Background failures (notification dispatch, batch processing, baseline
/// recomputation) never become a `CoreError` on the request path — they are
/// logged and dropped where they occur instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("not a participant in this conversation")]
    NotParticipant,

    #[error("cannot send messages")]
    Blocked,

    #[error("not the slideshow controller")]
    NotController,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("a slideshow session is already active for this conversation")]
    SlideshowAlreadyActive,

    #[error("media is not owned by the sender, or is already attached to another message")]
    MediaNotOwned,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotParticipant | CoreError::Blocked | CoreError::NotController => {
                StatusCode::FORBIDDEN
            }
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::SlideshowAlreadyActive => StatusCode::CONFLICT,
            CoreError::MediaNotOwned => StatusCode::BAD_REQUEST,
            CoreError::Database(_) | CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = HttpErrorEnvelope {
            error: self.to_string(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
