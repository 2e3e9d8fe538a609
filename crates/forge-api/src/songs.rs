//! Handlers for `/songs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/songs` | Optional `?author=<uuid>&limit=&offset=`; newest first |
//! | `POST` | `/songs` | Body: [`ReleaseBody`]; 201 + ranked song |
//! | `GET`  | `/songs/{id}` | 404 if not found |
//! | `POST` | `/songs/{id}/versions` | Body: [`ReworkBody`]; 201 + ranked song |
//!
//! Audio travels inline as base64 next to its original file name.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use forge_core::{
  engine::{Release, Rework},
  song::{AudioUpload, SongView, VersionCategory},
  store::{BlobStore, SongQuery, SongStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{SharedEngine, auth::Authenticated, error::ApiError};

/// Decode an inline upload. No audio at all is passed through as `None` so
/// the engine reports it as missing.
fn decode_upload(
  file_name: Option<String>,
  audio_base64: Option<String>,
) -> Result<Option<AudioUpload>, ApiError> {
  let Some(encoded) = audio_base64 else {
    return Ok(None);
  };
  let bytes = B64
    .decode(encoded.trim())
    .map_err(|e| ApiError::BadRequest(format!("audio_base64: {e}")))?;
  Ok(Some(AudioUpload {
    file_name: file_name.unwrap_or_default(),
    bytes:     Bytes::from(bytes),
  }))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub author: Option<Uuid>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /songs[?author=<uuid>]`
pub async fn list<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SongView>>, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  let query = SongQuery {
    author_id: params.author,
    limit:     params.limit,
    offset:    params.offset,
  };
  Ok(Json(engine.load_feed(&query).await?))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /songs/{id}`
pub async fn get_one<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SongView>, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  Ok(Json(engine.song(id).await?))
}

// ─── Release ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /songs`.
#[derive(Debug, Deserialize)]
pub struct ReleaseBody {
  #[serde(default)]
  pub title:        String,
  pub description:  Option<String>,
  pub tags:         Option<String>,
  pub file_name:    Option<String>,
  pub audio_base64: Option<String>,
}

/// `POST /songs`
pub async fn release<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Authenticated(user): Authenticated,
  Json(body): Json<ReleaseBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  let release = Release {
    title:       body.title,
    description: body.description,
    tags:        body.tags,
    upload:      decode_upload(body.file_name, body.audio_base64)?,
  };
  let song = engine.release_song(&user, release).await?;
  Ok((StatusCode::CREATED, Json(song)))
}

// ─── Add version ─────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /songs/{id}/versions`.
#[derive(Debug, Deserialize)]
pub struct ReworkBody {
  pub notes:        Option<String>,
  pub category:     Option<VersionCategory>,
  pub file_name:    Option<String>,
  pub audio_base64: Option<String>,
}

/// `POST /songs/{id}/versions`
pub async fn add_version<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Path(id): Path<Uuid>,
  Authenticated(user): Authenticated,
  Json(body): Json<ReworkBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  let rework = Rework {
    notes:    body.notes,
    category: body.category,
    upload:   decode_upload(body.file_name, body.audio_base64)?,
  };
  let (_, song) = engine.add_version(id, &user, rework).await?;
  Ok((StatusCode::CREATED, Json(song)))
}
