//! Lobby server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lobby-config.yaml` (defaults if absent)
//! 2. Initialize structured logging
//! 3. Connect the document store and load the catalog
//! 4. Serve HTTP until `Ctrl-C`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lobby_server::config::{LobbyConfig, LoggingConfig};
use lobby_server::server::start_server;
use lobby_server::state::AppState;

const CONFIG_PATH: &str = "lobby-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LobbyConfig::load_or_default(Path::new(CONFIG_PATH))
        .with_context(|| format!("loading {CONFIG_PATH}"))?;
    init_tracing(&config.logging);

    info!(
        port = config.server.port,
        backend = ?config.store.backend,
        daily_grant = config.economy.daily_grant,
        season = config.economy.season,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config)
        .await
        .context("initializing services")?;
    start_server(&config.server, Arc::new(state))
        .await
        .context("running server")?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
