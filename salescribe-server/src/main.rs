//! salescribe-server - sales data ingestion and report generation service
//!
//! Accepts CSV uploads, stores normalized sales records per scope and
//! generates five perspective reports from them on request.

use anyhow::{Context, Result};
use clap::Parser;
use salescribe_common::config::{self, ConfigOverrides};
use salescribe_server::generation::GeminiClient;
use salescribe_server::storage::StorageGateway;
use salescribe_server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments. Each falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(name = "salescribe-server", version, about)]
struct Args {
    /// TOML config file
    #[arg(long, env = "SALESCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long, env = "SALESCRIBE_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(long, env = "SALESCRIBE_PORT")]
    port: Option<u16>,

    /// Durable storage URL (e.g. sqlite://salescribe.db); omit for volatile storage
    #[arg(long, env = "SALESCRIBE_DATABASE_URL")]
    database_url: Option<String>,

    /// Generation API key
    #[arg(long, env = "SALESCRIBE_GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generation model
    #[arg(long, env = "SALESCRIBE_MODEL")]
    model: Option<String>,

    /// Per-agent generation timeout in seconds
    #[arg(long, env = "SALESCRIBE_AGENT_TIMEOUT_SECS")]
    agent_timeout_secs: Option<u64>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_file: args.config,
            host: args.host,
            port: args.port,
            database_url: args.database_url,
            api_key: args.api_key,
            model: args.model,
            agent_timeout_secs: args.agent_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let overrides = ConfigOverrides::from(Args::parse());
    let config = config::resolve(&overrides).context("Failed to resolve configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting salescribe-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let storage = Arc::new(StorageGateway::connect(&config).await);
    info!(backend = storage.active_backend().as_str(), "Storage initialized");

    let generator = GeminiClient::new(&config.generation).context("Failed to build HTTP client")?;
    if !generator.has_api_key() {
        warn!("No generation API key configured, every agent will fail until one is set");
    }
    info!(model = %config.generation.model, "Generation client ready");

    let state = AppState::new(
        storage,
        Arc::new(generator),
        Duration::from_secs(config.generation.agent_timeout_secs),
    );
    let app = salescribe_server::build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
