//! `cdfd`, the connected device framework server binary.
//!
//! Usage:
//!   cdfd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/cdf/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use cdf_core::Module;
use tracing::info;

use assetlibrary::events::{EventEmitter, LogEmitter};
use assetlibrary::AssetLibraryModule;
use config::ServerConfig;

/// CDF server.
#[derive(Parser, Debug)]
#[command(name = "cdfd", about = "Connected device framework server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = cdf_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let kv: Arc<dyn cdf_kv::KVStore> = Arc::new(
        cdf_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let events: Arc<dyn EventEmitter> = Arc::new(LogEmitter);

    let assetlibrary_module =
        AssetLibraryModule::new(kv, events, server_config.assetlibrary_config());
    info!(
        topic = %server_config.events.topic,
        "Asset library module initialized"
    );

    let app = routes::build_router(vec![(
        assetlibrary_module.name(),
        assetlibrary_module.routes(),
    )]);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("CDF server listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
