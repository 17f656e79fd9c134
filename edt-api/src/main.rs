//! edt-api - Emergency dispatch tracker service
//!
//! Records incoming emergency calls, their transcript, and the field
//! responders assigned to them. Serves a JSON REST API over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use edt_common::config::{CliOverrides, ConfigResolver};
use edt_common::db::init::init_database;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edt_api::api::health::BuildInfo;
use edt_api::{build_router, seed, AppState};

/// Command-line arguments for edt-api
#[derive(Parser, Debug)]
#[command(name = "edt-api")]
#[command(about = "Emergency dispatch tracker API service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Allowed CORS origin (any origin when unset)
    #[arg(long)]
    cors_origin: Option<String>,

    /// Log level filter when RUST_LOG is unset (e.g. "info", "edt_api=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Insert sample districts and responders before serving
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(CliOverrides {
        config_file: args.config,
        database_path: args.database,
        bind_address: args.bind,
        port: args.port,
        cors_origin: args.cors_origin,
        log_level: args.log_level,
    })
    .resolve()
    .context("Failed to resolve configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = BuildInfo::current();
    info!(
        "Starting edt-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        build.git_hash,
        build.timestamp,
        build.profile,
    );
    info!("Database: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    if args.seed {
        seed::seed_sample_data(&pool)
            .await
            .context("Failed to seed sample data")?;
    }

    let state = AppState::new(pool.clone()).with_cors_origin(config.cors_origin.clone());
    let app = build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
