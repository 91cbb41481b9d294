//! EU indicator map server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), overlays
//! `EUMAP_*` environment variables, and serves the map on the configured
//! address.
//!
//! ```text
//! EUMAP_PORT=8080 cargo run -p eumap-server --bin server
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use eumap_server::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "EU indicator map server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  if !server_cfg.public_dir.is_dir() {
    tracing::warn!(
      public_dir = ?server_cfg.public_dir,
      "public directory does not exist; static requests will 404"
    );
  }

  let state = AppState::new(&server_cfg).context("failed to build World Bank client")?;
  let app = eumap_server::router(state);
  let address = server_cfg.address();

  tracing::info!("Server running at http://{address}/");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
