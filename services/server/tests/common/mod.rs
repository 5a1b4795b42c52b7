//! Shared scaffolding for the integration tests: spins up the real HTTP +
//! WebSocket surface on an ephemeral port against a migrated testcontainer
//! Postgres.

use std::sync::Arc;

use server::auth::StubTokenVerifier;
use server::config::Config;
use server::media::LocalFsMediaStorage;
use server::notifications::pipeline;
use server::notifications::velocity::RuleBasedVelocityDetector;
use server::AppState;
use sqlx::PgPool;

pub struct TestServer {
    pub base_url: String,
    pub ws_url: String,
    pub pool: PgPool,
    pub state: AppState,
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        bind_addr: String::new(),
        log_level: "error".to_owned(),
        batch_worker_interval: std::time::Duration::from_secs(3600),
        baseline_worker_interval: std::time::Duration::from_secs(3600),
        retention_worker_interval: std::time::Duration::from_secs(3600),
        notification_retention_days: 30,
        vote_activity_retention_days: 10,
    }
}

/// Boots the full router (and the notification pipeline worker, but not the
/// periodic batch/baseline/retention sweeps, which tests that need them
/// drive directly) on a random loopback port.
pub async fn spawn(pool: PgPool) -> TestServer {
    let media_root = std::env::temp_dir().join(format!("rt-media-test-{}", std::process::id()));

    let (state, notification_events) = AppState::new(
        pool.clone(),
        Arc::new(StubTokenVerifier),
        Arc::new(RuleBasedVelocityDetector),
        Arc::new(LocalFsMediaStorage::new(media_root)),
        test_config(),
    );

    tokio::spawn(pipeline::run(state.clone(), notification_events));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let router = server::build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server exited");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        pool,
        state,
    }
}

pub fn bearer(user_id: i64) -> String {
    format!("user:{user_id}")
}

pub async fn insert_user(pool: &PgPool, id: i64, username: &str) {
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, 'x')")
        .bind(id)
        .bind(username)
        .execute(pool)
        .await
        .expect("insert test user");
}
