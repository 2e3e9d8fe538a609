//! forge-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `FORGE_*` environment variables, opens the SQLite store and the audio
//! directory, and serves the CollabForge API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use forge_server::ServerConfig;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "CollabForge API server")]
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

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("public_url", "http://localhost:8080")?
    .set_default("store_path", "~/.local/share/collabforge/forge.db")?
    .set_default("audio_dir", "~/.local/share/collabforge/audio")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FORGE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let engine = forge_server::open_engine(&server_cfg).await?;

  // Pick up songs whose likes crossed the threshold without being flagged,
  // e.g. after a crash between the like and the completion write.
  match engine.reconcile().await {
    Ok(flipped) if !flipped.is_empty() => {
      tracing::info!(count = flipped.len(), "marked songs complete at startup");
    }
    Ok(_) => {}
    Err(e) => tracing::warn!(error = %e, "startup reconcile failed"),
  }

  let app = forge_server::app(engine);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
