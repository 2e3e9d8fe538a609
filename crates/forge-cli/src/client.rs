//! Async HTTP client wrapping the CollabForge JSON API.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use forge_core::{
  engine::Dashboard,
  like::LikeOutcome,
  song::{SongView, VersionCategory},
  user::User,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the CollabForge API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the CollabForge JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// An audio file read from disk, ready to upload inline.
#[derive(Debug, Serialize)]
pub struct InlineAudio {
  pub file_name:    String,
  pub audio_base64: String,
}

impl InlineAudio {
  pub async fn read(path: &Path) -> Result<Self> {
    let bytes = tokio::fs::read(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    Ok(Self {
      file_name,
      audio_base64: B64.encode(bytes),
    })
  }
}

#[derive(Debug, Serialize)]
struct SignupBody<'a> {
  username: &'a str,
  email:    &'a str,
  password: &'a str,
}

#[derive(Debug, Serialize)]
struct ReleaseBody<'a> {
  title:       &'a str,
  description: Option<&'a str>,
  tags:        Option<&'a str>,
  #[serde(flatten)]
  audio:       InlineAudio,
}

#[derive(Debug, Serialize)]
struct ReworkBody<'a> {
  notes:    Option<&'a str>,
  category: Option<VersionCategory>,
  #[serde(flatten)]
  audio:    InlineAudio,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
}

/// Decode a JSON success body, or turn the server's `{"error": ...}` body
/// into an error naming the request.
async fn decode<T: DeserializeOwned>(what: &str, resp: Response) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"));
  }
  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
  };
  Err(anyhow!("{what} → {status}: {message}"))
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  /// `POST /api/users` with the configured username and password.
  pub async fn signup(&self, email: &str) -> Result<User> {
    let body = SignupBody {
      username: &self.config.username,
      email,
      password: &self.config.password,
    };
    let resp = self
      .client
      .post(self.url("/users"))
      .json(&body)
      .send()
      .await
      .context("POST /users failed")?;
    decode("POST /users", resp).await
  }

  /// `GET /api/me`
  pub async fn me(&self) -> Result<User> {
    let resp = self
      .auth(self.client.get(self.url("/me")))
      .send()
      .await
      .context("GET /me failed")?;
    decode("GET /me", resp).await
  }

  // ── Songs ─────────────────────────────────────────────────────────────────

  /// `GET /api/songs[?author=<id>]`
  pub async fn list_songs(&self, author: Option<Uuid>, limit: Option<usize>) -> Result<Vec<SongView>> {
    let mut query = Vec::new();
    if let Some(author) = author {
      query.push(("author", author.to_string()));
    }
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    let resp = self
      .client
      .get(self.url("/songs"))
      .query(&query)
      .send()
      .await
      .context("GET /songs failed")?;
    decode("GET /songs", resp).await
  }

  /// `GET /api/songs/<id>`
  pub async fn song(&self, song_id: Uuid) -> Result<SongView> {
    let resp = self
      .client
      .get(self.url(&format!("/songs/{song_id}")))
      .send()
      .await
      .context("GET /songs/{id} failed")?;
    decode("GET /songs/{id}", resp).await
  }

  /// `POST /api/songs`
  pub async fn release(
    &self,
    title: &str,
    description: Option<&str>,
    tags: Option<&str>,
    audio: InlineAudio,
  ) -> Result<SongView> {
    let body = ReleaseBody {
      title,
      description,
      tags,
      audio,
    };
    let resp = self
      .auth(self.client.post(self.url("/songs")))
      .json(&body)
      .send()
      .await
      .context("POST /songs failed")?;
    decode("POST /songs", resp).await
  }

  /// `POST /api/songs/<id>/versions`
  pub async fn add_version(
    &self,
    song_id: Uuid,
    notes: Option<&str>,
    category: Option<VersionCategory>,
    audio: InlineAudio,
  ) -> Result<SongView> {
    let body = ReworkBody {
      notes,
      category,
      audio,
    };
    let resp = self
      .auth(self.client.post(self.url(&format!("/songs/{song_id}/versions"))))
      .json(&body)
      .send()
      .await
      .context("POST /songs/{id}/versions failed")?;
    decode("POST /songs/{id}/versions", resp).await
  }

  // ── Likes & dashboard ─────────────────────────────────────────────────────

  /// `POST /api/versions/<id>/like`
  pub async fn toggle_like(&self, version_id: Uuid) -> Result<LikeOutcome> {
    let resp = self
      .auth(self.client.post(self.url(&format!("/versions/{version_id}/like"))))
      .send()
      .await
      .context("POST /versions/{id}/like failed")?;
    decode("POST /versions/{id}/like", resp).await
  }

  /// `GET /api/dashboard`
  pub async fn dashboard(&self) -> Result<Dashboard> {
    let resp = self
      .auth(self.client.get(self.url("/dashboard")))
      .send()
      .await
      .context("GET /dashboard failed")?;
    decode("GET /dashboard", resp).await
  }
}
