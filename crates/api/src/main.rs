use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hsseq_core::backend::memory::MemoryBackend;
use hsseq_core::backend::FormBackend;
use hsseq_core::save_guard::SaveGuard;
use hsseq_events::{EventBus, EventLogger};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use hsseq_api::config::{DatabaseConfig, ServerConfig};
use hsseq_api::router::build_router;
use hsseq_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "hsseq_api=debug,hsseq_core=info,hsseq_db=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("HOST and PORT must form a valid socket address");

    let backend = open_backend().await;

    let event_bus = Arc::new(EventBus::default());
    let event_logger = tokio::spawn(EventLogger::run(event_bus.subscribe()));

    let state = AppState {
        backend,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        save_guard: SaveGuard::new(),
    };
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    tracing::info!(%addr, "Form builder API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Last sender gone: the logger drains and exits.
    drop(event_bus);
    match tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), event_logger).await {
        Ok(Ok(logged)) => tracing::info!(events = logged, "Event logger stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Event logger task failed"),
        Err(_) => tracing::warn!("Event logger did not stop before the shutdown timeout"),
    }
    tracing::info!("Shutdown complete");
}

/// PostgreSQL when `DATABASE_URL` is set, the in-memory store otherwise.
///
/// # Panics
///
/// When a configured database cannot be reached or migrated.
async fn open_backend() -> Arc<dyn FormBackend> {
    let Some(db) = DatabaseConfig::from_env() else {
        tracing::warn!("DATABASE_URL is not set; forms are kept in memory only");
        return Arc::new(MemoryBackend::new());
    };

    let pool = hsseq_db::create_pool(&db.url, db.max_connections)
        .await
        .expect("Failed to connect to the database");
    hsseq_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    hsseq_db::run_migrations(&pool)
        .await
        .expect("Failed to apply database migrations");
    tracing::info!(max_connections = db.max_connections, "Database ready");

    Arc::new(hsseq_db::PgFormBackend::new(pool))
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("SIGINT received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
