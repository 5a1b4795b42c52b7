use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::hub::DeliveryHub;
use crate::media::MediaStorage;
use crate::notifications::events::NotificationEvent;
use crate::notifications::velocity::VelocityDetector;

/// Shared process state, cloned into every handler and background task.
/// Cheap to clone: everything inside is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub hub: Arc<DeliveryHub>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub velocity_detector: Arc<dyn VelocityDetector>,
    pub media_storage: Arc<dyn MediaStorage>,
    /// The HTTP adapter's fire-and-forget channel into the notification
    /// pipeline: the adapter fires these from a background task and the
    /// engine itself never blocks the caller.
    pub notification_events: mpsc::UnboundedSender<NotificationEvent>,
    pub config: Config,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Assembles process state around a connected pool, a fresh hub, and
    /// the pluggable collaborators. Returns the event receiver the caller
    /// must hand to [`crate::notifications::pipeline::run`].
    pub fn new(
        pool: PgPool,
        token_verifier: Arc<dyn TokenVerifier>,
        velocity_detector: Arc<dyn VelocityDetector>,
        media_storage: Arc<dyn MediaStorage>,
        config: Config,
    ) -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState {
            pool,
            hub: Arc::new(DeliveryHub::new()),
            token_verifier,
            velocity_detector,
            media_storage,
            notification_events: tx,
            config,
            shutdown: CancellationToken::new(),
        };
        (state, rx)
    }
}
