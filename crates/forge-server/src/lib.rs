//! HTTP server for CollabForge.
//!
//! Wires the SQLite store and the filesystem blob store into a
//! [`VersionEngine`] and serves the JSON API under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use forge_api::SharedEngine;
use forge_core::{
  VersionEngine,
  policy::CallPolicy,
  store::{BlobStore, SongStore},
};
use forge_store_sqlite::{FsBlobStore, SqliteStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FORGE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Externally reachable base URL, used to build audio URLs.
  pub public_url:        String,
  pub store_path:        PathBuf,
  pub audio_dir:         PathBuf,
  #[serde(default = "default_call_timeout_secs")]
  pub call_timeout_secs: u64,
  #[serde(default = "default_read_attempts")]
  pub read_attempts:     u32,
}

fn default_call_timeout_secs() -> u64 { 10 }

fn default_read_attempts() -> u32 { 3 }

impl ServerConfig {
  pub fn policy(&self) -> CallPolicy {
    CallPolicy {
      timeout:       Duration::from_secs(self.call_timeout_secs),
      read_attempts: self.read_attempts,
    }
  }

  /// Base URL stored audio is served under.
  pub fn audio_url(&self) -> String {
    format!("{}/api/audio", self.public_url.trim_end_matches('/'))
  }
}

// ─── Startup ──────────────────────────────────────────────────────────────────

/// Open both backends named by `config` and build the engine.
pub async fn open_engine(
  config: &ServerConfig,
) -> anyhow::Result<SharedEngine<SqliteStore, FsBlobStore>> {
  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let audio_dir = expand_tilde(&config.audio_dir);
  let blobs = FsBlobStore::open(&audio_dir, config.audio_url())
    .await
    .with_context(|| format!("failed to open audio directory {audio_dir:?}"))?;

  let engine =
    VersionEngine::new(Arc::new(store), Arc::new(blobs)).with_policy(config.policy());
  Ok(Arc::new(engine))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router with request tracing.
pub fn app<S, B>(engine: SharedEngine<S, B>) -> Router
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    .nest("/api", forge_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────
