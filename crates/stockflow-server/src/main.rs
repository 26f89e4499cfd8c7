//! Stockflow server - Main entry point

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use stockflow_common::logging::{init_logging, LogConfig};
use stockflow_server::{config::Config, db, features, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::from_env()?.with_filter_directives(
        "stockflow_server=debug,tower_http=debug,axum=trace,sqlx=info".to_string(),
    );
    init_logging(&log_config)?;

    info!("Starting Stockflow server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    info!("Database migrations completed");

    let state = features::FeatureState::postgres(pool);
    let app = features::app_router(state)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {timeout_secs} seconds for connections to close");
    tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
}
