use std::path::PathBuf;
use std::sync::Arc;

use server::auth::StubTokenVerifier;
use server::config::Config;
use server::db;
use server::media::LocalFsMediaStorage;
use server::notifications::pipeline;
use server::notifications::velocity::RuleBasedVelocityDetector;
use server::notifications::workers;
use server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .init();

    info!("connecting to database...");
    let pool = db::create_pool(&config.database_url).await;
    db::run_migrations(&pool).await;
    info!("migrations applied");

    let media_root = std::env::var("MEDIA_STORAGE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./media"));

    let (state, notification_events) = AppState::new(
        pool,
        Arc::new(StubTokenVerifier),
        Arc::new(RuleBasedVelocityDetector),
        Arc::new(LocalFsMediaStorage::new(media_root)),
        config,
    );

    tokio::spawn(pipeline::run(state.clone(), notification_events));
    tokio::spawn(workers::run_batch_worker(state.clone()));
    tokio::spawn(workers::run_baseline_worker(state.clone()));
    tokio::spawn(workers::run_retention_worker(state.clone()));

    let bind_addr = state.config.bind_addr.clone();
    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");
    info!(addr = %bind_addr, "server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("server error");
    info!("server shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C, then signals every background worker to
/// stop via `AppState::shutdown` before returning. Every background task
/// honors this same cancellation handle.
async fn shutdown_signal(state: AppState) {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
    state.shutdown.cancel();
}
