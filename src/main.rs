use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use intervue::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional YAML config path as the only argument
    let mut args = env::args();
    let _ = args.next();
    let config_path = args.next().map(PathBuf::from);
    if let Some(extra) = args.next() {
        anyhow::bail!("Unexpected argument '{extra}'. Usage: intervue [config.yaml]");
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    if !config.has_speech() {
        tracing::warn!("Azure Speech is not configured, /api/azure-speech will return 500");
    }
    if !config.has_openai() {
        tracing::warn!("Azure OpenAI is not configured, /api/azure-chat will return 500");
    }

    let address = config.address();

    // Create application state
    let app_state = AppState::new(config)?;
    let app = routes::create_app(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
