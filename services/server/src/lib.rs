pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod hub;
pub mod http;
pub mod media;
pub mod notifications;
pub mod repo;
pub mod slideshow;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assembles the full HTTP + WebSocket surface into one flat router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(hub::ws::ws_handler))
        .route(
            "/api/v1/conversations",
            post(http::conversations::create_or_get).get(http::conversations::list),
        )
        .route(
            "/api/v1/conversations/{conversation_id}",
            get(http::conversations::get).delete(http::conversations::delete),
        )
        .route("/api/v1/messages", post(http::messages::send))
        .route(
            "/api/v1/conversations/{conversation_id}/messages",
            get(http::messages::history),
        )
        .route(
            "/api/v1/messages/{message_id}/read",
            post(http::messages::mark_read),
        )
        .route(
            "/api/v1/conversations/{conversation_id}/read",
            post(http::messages::mark_conversation_read),
        )
        .route(
            "/api/v1/messages/{message_id}",
            axum::routing::delete(http::messages::delete),
        )
        .route("/api/v1/media/upload", post(http::media::upload))
        .route("/api/v1/users/block", post(http::blocks::block))
        .route(
            "/api/v1/users/block/{username}",
            axum::routing::delete(http::blocks::unblock),
        )
        .route("/api/v1/users/blocked", get(http::blocks::list_blocked))
        .route("/api/v1/users/status", get(http::presence::status))
        .route(
            "/api/v1/conversations/{conversation_id}/slideshow",
            post(http::slideshow::start).get(http::slideshow::get_current),
        )
        .route(
            "/api/v1/slideshows/{session_id}/navigate",
            post(http::slideshow::navigate),
        )
        .route(
            "/api/v1/slideshows/{session_id}/transfer-control",
            post(http::slideshow::transfer_control),
        )
        .route(
            "/api/v1/slideshows/{session_id}/auto-advance",
            put(http::slideshow::update_auto_advance),
        )
        .route(
            "/api/v1/slideshows/{session_id}",
            axum::routing::delete(http::slideshow::stop),
        )
        .route("/api/v1/notifications", get(http::notifications::list))
        .route(
            "/api/v1/notifications/{notification_id}/read",
            post(http::notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/{notification_id}",
            axum::routing::delete(http::notifications::delete),
        )
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
