//! IT-Ops Server - Main entry point

use anyhow::{Context, Result};
use itops_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use itops_server::{api, audit::AuditWrites, config::Config, db};

const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("itops-server")
        .filter_directives("itops_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let telemetry = init_logging(&log_config)?;
    // tower-http and sqlx log through the default dispatcher
    telemetry.install_global()?;

    info!("Starting IT-Ops Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    let pool = db::create_pool(&db::DbConfig::from(&config.database)).await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!("Database migrations completed");

    let audit_writes = AuditWrites::new();
    let app = api::build_app(pool, &config, telemetry.clone(), audit_writes.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid ITOPS_HOST/ITOPS_PORT")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
    .await?;

    let pending = audit_writes.pending();
    if pending > 0 {
        info!(pending, "Flushing audit writes");
    }
    let abandoned = audit_writes.drain(AUDIT_DRAIN_TIMEOUT).await;
    if abandoned > 0 {
        tracing::error!(abandoned, "Audit writes still running at exit, entries lost");
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then give in-flight requests time to finish
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received terminate signal, starting graceful shutdown"),
    }

    info!(timeout_secs, "Waiting for open connections to close");
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
