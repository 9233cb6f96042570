use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

const DEFAULT_LOG_FILTER: &str = "job_tracker_api=info,tower_http=info";

#[derive(Parser)]
#[command(name = "job-tracker")]
#[command(about = "Job application tracking API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind address, overrides APP_BIND_HOST")]
        host: Option<String>,

        #[arg(long, help = "Port, overrides APP_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

/// fmt subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::config().clone();

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    database.migrate().await.context("failed to run migrations")?;
    database.close().await;
    Ok(())
}

async fn serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set in {:?}", config.environment);
    }
    if crate::is_production!() && config.security.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin in production");
    }
    if config.security.cors_origins.is_empty() {
        tracing::warn!("CORS_ORIGIN is empty; browser clients will be rejected");
    }

    info!("Starting job tracker API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if config.database.run_migrations {
        database.migrate().await.context("failed to run migrations")?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let router = app(AppState::new(&database, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
