//! SuperLearn server entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use superlearn::state::AppState;
use superlearn::storage::{ConfigService, Database, KeyValueStore, MemoryKvStore, SqliteKvStore};
use superlearn::utils::paths::{database_path_in, ensure_dir, superlearn_dir};
use superlearn::{router, Secrets};

/// SuperLearn learning assistant server
#[derive(Parser)]
#[command(name = "superlearn", version, about = "SuperLearn learning assistant server")]
struct Cli {
    /// Path to the config file (default ~/.superlearn/config.json)
    #[arg(long, env = "SUPERLEARN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the database (default ~/.superlearn)
    #[arg(long, env = "SUPERLEARN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind, overriding the config file
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding the config file
    #[arg(long)]
    port: Option<u16>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("superlearn=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path.clone()),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;
    let mut config = config_service.get_config().clone();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    tracing::info!(path = %config_service.path().display(), "configuration loaded");

    let (store, database): (Arc<dyn KeyValueStore>, Option<Database>) = if cli.in_memory {
        tracing::warn!("running with an in-memory store; data is lost on exit");
        (Arc::new(MemoryKvStore::new()), None)
    } else {
        let data_dir = match cli.data_dir {
            Some(dir) => dir,
            None => superlearn_dir()?,
        };
        ensure_dir(&data_dir)?;
        let db_path = database_path_in(&data_dir);
        let database = Database::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        tracing::info!(path = %db_path.display(), "database opened");
        (Arc::new(SqliteKvStore::new(database.clone())), Some(database))
    };

    let secrets = Secrets::from_env();
    tracing::debug!(?secrets, "secrets resolved");
    let state = AppState::from_config(config.clone(), &secrets, store, database)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "SuperLearn server listening");

    let shutdown_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
            shutdown_state.shutdown();
        })
        .await
        .context("server error")?;
    Ok(())
}
