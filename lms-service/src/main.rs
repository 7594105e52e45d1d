use lms_service::{
    build_router,
    config::AppConfig,
    services::{seed, AuthService, Database, JwtService},
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    init_tracing(&config.service_name, &config.common.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting LMS backend"
    );

    let pool = lms_service::db::create_pool(&config.database).await?;
    lms_service::db::run_migrations(&pool)
        .await
        .map_err(|e| service_core::error::AppError::Internal(anyhow::anyhow!(e)))?;

    let db = Database::new(pool);

    // Bootstrap default roles/permissions; idempotent across restarts.
    seed::run(&db, &config.seed).await?;

    let jwt = JwtService::new(&config.jwt);
    let auth_service = AuthService::new(db.clone(), jwt.clone());

    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        auth_service,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
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
