//! flyer-tours - tour validation service
//!
//! Serves the participation/dashboard API and runs the periodic
//! validation batch. With `--run-once` it runs a single batch, prints the
//! summary as JSON and exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flyer_common::config::{load_toml_config, BootstrapConfig, CliOverrides};
use flyer_common::db::init_database;
use flyer_common::time;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flyer_tours::scheduler::{ValidationSchedule, ValidationService};
use flyer_tours::store::SqliteStore;
use flyer_tours::{build_router, AppState};

/// Command-line arguments for flyer-tours
#[derive(Parser, Debug)]
#[command(name = "flyer-tours")]
#[command(about = "Tour validation service for flyer distribution rounds")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "FLYER_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "FLYER_BIND")]
    bind: Option<String>,

    /// Folder holding the database (overrides FLYER_DATA_FOLDER)
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// TOML bootstrap file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run one validation batch, print the summary and exit
    #[arg(long)]
    run_once: bool,

    /// Evaluation date for --run-once (YYYY-MM-DD, default today)
    #[arg(long, requires = "run_once")]
    date: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let cli = CliOverrides {
        data_folder: args.data_folder.clone(),
        bind: args.bind.clone(),
        port: args.port,
        api_secret: None,
    };
    let config = BootstrapConfig::resolve(&cli, toml);

    let default_filter = format!(
        "flyer_tours={0},flyer_common={0},tower_http=info",
        config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting flyer-tours v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let store = Arc::new(SqliteStore::new(pool.clone()));

    let schedule = ValidationSchedule::from_database(&pool).await;
    let validation = Arc::new(ValidationService::new(schedule, store.clone()));

    if args.run_once {
        let date = match args.date.as_deref() {
            Some(raw) => time::parse_iso_date(raw)
                .with_context(|| format!("Invalid --date '{}', expected YYYY-MM-DD", raw))?,
            None => time::today(),
        };
        let summary = validation.run_now(date).await.context("Validation batch failed")?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if config.api_secret.is_none() {
        info!("API authentication disabled (no secret configured)");
    }

    let scheduler_handle = validation.clone().run();

    let state = AppState::new(store, validation, config.api_secret.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("flyer-tours listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

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
