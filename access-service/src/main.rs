use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;

use access_service::{
    build_router,
    config::AccessConfig,
    observability::logging::init_tracing,
    services::{ConnectionRegistry, Database, JwtService, WhatsAppNotifier},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), access_service::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AccessConfig::from_env()?;

    init_tracing(&config.log_level);
    access_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting access-control service"
    );

    let db = Database::connect(&config.database.url, config.database.max_connections).await?;
    db.run_migrations().await?;

    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    let whatsapp = WhatsAppNotifier::new(&config.whatsapp);
    if whatsapp.is_enabled() {
        whatsapp.notify_startup(&config.service_name, config.port);
    }

    let registry = Arc::new(ConnectionRegistry::new());

    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        registry,
        whatsapp,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
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
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
        }
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
