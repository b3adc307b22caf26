use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recruitflow_events::DigestScheduler;
use recruitflow_worker::store::PgRuleStore;
use recruitflow_worker::{Engine, EngineConfig, Scheduler};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recruitflow_worker=debug,recruitflow_events=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = EngineConfig::from_env();
    tracing::info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        concurrency = config.dispatch_concurrency,
        utc_offset = %config.utc_offset,
        "Loaded engine configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);

    let pool = recruitflow_db::create_pool(&database_url, max_connections)
        .await
        .expect("Failed to connect to database");
    recruitflow_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    recruitflow_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Transport ---
    let transport =
        recruitflow_events::transport_from_env().expect("Failed to configure message transport");
    tracing::info!(transport = transport.name(), "Message transport configured");

    // --- Engine ---
    let store = Arc::new(PgRuleStore::new(pool.clone()));
    let engine = Arc::new(Engine::new(store, Arc::clone(&transport), &config));
    let scheduler = Scheduler::new(engine, &config);

    let cancel = CancellationToken::new();

    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    let digest = DigestScheduler::new(pool.clone(), transport)
        .with_interval(config.digest_interval)
        .with_retry(config.retry);
    let digest_cancel = cancel.clone();
    let digest_handle = tokio::spawn(async move {
        digest.run(digest_cancel).await;
    });

    shutdown_signal().await;
    tracing::info!("Shutdown requested");

    cancel.cancel();
    // An in-flight tick finishes or times out on its own; wait for it.
    let _ = tokio::time::timeout(config.tick_timeout + Duration::from_secs(5), scheduler_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), digest_handle).await;

    pool.close().await;
    tracing::info!("Worker stopped");
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
