use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use rt_protocol::{ClientFrame, Event, TypingPayload};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::state::AppState;

/// A per-session send is given this long to land before it's abandoned;
/// the session is torn down on timeout.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// `GET /ws` — single endpoint, bearer token passed in the query string.
/// One socket per session; a user may hold many simultaneously.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
) -> impl IntoResponse {
    match state.token_verifier.verify(&query.token) {
        Some(claims) => ws.on_upgrade(move |socket| handle_socket(socket, state, claims.user_id)),
        None => axum::http::StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: i64) {
    let (session_id, mut rx) = state.hub.register(user_id).await;
    info!(user_id, session_id, "websocket session registered");

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, user_id, &text).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if send_with_timeout(&mut socket, Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(user_id, session_id, "websocket closed by peer");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(user_id, session_id, error = %e, "websocket read error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(event) => {
                        if let Err(e) = send_event(&mut socket, &event).await {
                            warn!(user_id, session_id, error = %e, "write failed, dropping session");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(user_id, session_id, skipped, "session fell behind, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    state.hub.unregister(user_id, session_id).await;
    info!(user_id, session_id, "websocket session unregistered");
}

async fn handle_client_frame(state: &AppState, sender_id: i64, text: &str) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(sender_id, error = %e, "discarding malformed client frame");
            return;
        }
    };
    match frame {
        ClientFrame::Typing {
            conversation_id,
            recipient_id,
            is_typing,
        } => {
            // Forwarded without persistence.
            state
                .hub
                .deliver_to(
                    recipient_id,
                    Event::Typing(TypingPayload {
                        conversation_id,
                        sender_id,
                        is_typing,
                    }),
                )
                .await;
        }
    }
}

async fn send_event(
    socket: &mut WebSocket,
    event: &Event,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            // Serialization errors are logged and discarded.
            warn!(error = %e, "failed to serialize event, dropping");
            return Ok(());
        }
    };
    send_with_timeout(socket, Message::Text(json.into())).await
}

async fn send_with_timeout(socket: &mut WebSocket, message: Message) -> Result<(), axum::Error> {
    match tokio::time::timeout(WRITE_TIMEOUT, socket.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "write deadline exceeded",
        ))),
    }
}
