//! `eumap`: query EU macro indicators from the terminal.
//!
//! # Usage
//!
//! ```text
//! eumap latest gdp
//! eumap eu gdp cpi --json
//! eumap history germany --items gdp,population
//! eumap calc DE gdp divide population
//! eumap --custom data.json export map.png --select gdp
//! ```

mod commands;
mod lookup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use eumap_cache::DataCache;
use eumap_view::{Command as ViewCommand, ViewSynchronizer};
use eumap_worldbank::{ClientConfig, WorldBankClient};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "eumap", about = "EU macro indicators from the World Bank")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// World Bank API root (default: https://api.worldbank.org/v2).
  #[arg(long, env = "EUMAP_WORLDBANK_URL")]
  base_url: Option<String>,

  /// Request timeout in seconds.
  #[arg(long, env = "EUMAP_TIMEOUT_SECS")]
  timeout: Option<u64>,

  /// Answer from a custom JSON dataset instead of the provider.
  #[arg(long, value_name = "FILE")]
  custom: Option<PathBuf>,

  /// Print JSON instead of tables.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  worldbank: ClientConfig,
  #[serde(default)]
  custom:    Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let mut client_cfg = file_cfg.worldbank;
  if let Some(url) = args.base_url {
    client_cfg.base_url = url;
  }
  if let Some(secs) = args.timeout {
    client_cfg.timeout_secs = secs;
  }

  let client = WorldBankClient::new(client_cfg).context("failed to build HTTP client")?;
  let view = ViewSynchronizer::new(DataCache::new(client));

  if let Some(path) = args.custom.or(file_cfg.custom) {
    let raw = std::fs::read_to_string(&path)
      .with_context(|| format!("reading custom data {}", path.display()))?;
    let document = serde_json::from_str(&raw)
      .with_context(|| format!("{} is not valid JSON", path.display()))?;
    view
      .apply(ViewCommand::LoadCustomData(document))
      .await
      .context("loading custom data")?;
  }

  let out = commands::run(&view, args.command, args.json).await?;
  print!("{out}");

  let failures = view.cache().source().failures();
  if failures > 0 {
    tracing::warn!(failures, "some provider requests failed; affected values show N/A");
  }
  Ok(())
}
