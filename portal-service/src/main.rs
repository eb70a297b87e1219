use portal_core::observability::logging::init_tracing;
use portal_service::{
    build_router,
    config::PortalConfig,
    services::{Database, NullCache, RedisCache, SlidingWindowLimiter, ViewCache},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), portal_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = PortalConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.security.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting investor portal service"
    );

    // Initialize database connection
    let pool = portal_service::db::create_pool(&config.database)
        .await
        .map_err(|e| portal_core::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    portal_service::db::run_migrations(&pool)
        .await
        .map_err(|e| portal_core::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    let db = Database::new(pool);
    tracing::info!("Database initialized successfully");

    // Initialize the view cache. No configured URL means the portal runs
    // against the store alone; every mutation still walks the invalidation
    // path, it just has nothing to delete.
    let cache: Arc<dyn ViewCache> = match config.cache.url.as_deref() {
        Some(url) => {
            let op_timeout = Duration::from_millis(config.cache.op_timeout_ms);
            match RedisCache::connect(url, op_timeout).await {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    tracing::warn!(error = %e, "Cache unavailable at startup; running without it");
                    Arc::new(NullCache)
                }
            }
        }
        None => {
            tracing::info!("No cache configured; running without one");
            Arc::new(NullCache)
        }
    };

    // Credential-abuse limiter state, injected into the services that
    // guard their operations with it.
    let limiter = Arc::new(SlidingWindowLimiter::new());

    let state = AppState::build(config.clone(), db, cache, limiter);

    // Build application router
    let app = build_router(state).await?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
