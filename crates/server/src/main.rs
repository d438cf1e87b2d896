//! Darkroom server binary.

use anyhow::{Context, Result};
use clap::Parser;
use darkroom_core::config::AppConfig;
use darkroom_server::{AppState, create_router};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Darkroom - an image metadata and recognition-results service
#[derive(Parser, Debug)]
#[command(name = "darkroomd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "DARKROOM_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Darkroom v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration. The file is optional: env vars can provide or
    // override everything, and the defaults (in-memory metadata, local
    // filesystem storage) boot a usable local instance.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::info!(
            config_path = %args.config,
            "No config file found, using environment variables and defaults"
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("DARKROOM_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize storage backend and verify connectivity before accepting
    // requests, so misconfiguration surfaces at startup.
    let storage = darkroom_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend ready");

    // Initialize metadata store
    let metadata = Arc::new(
        darkroom_metadata::from_config(&config.metadata)
            .await
            .context("failed to initialize metadata store")?,
    );
    metadata
        .health_check()
        .await
        .context("metadata health check failed")?;
    tracing::info!("Metadata store ready");

    let bind = config.server.bind.clone();
    let state = AppState::new(config, storage, metadata);
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
