//! `GET /audio/{key}`: serve a stored audio file.

use axum::{
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use forge_core::store::{BlobStore, SongStore};

use crate::{SharedEngine, error::ApiError};

fn content_type(key: &str) -> &'static str {
  let ext = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
  match ext {
    "mp3" => "audio/mpeg",
    "wav" => "audio/wav",
    "ogg" => "audio/ogg",
    "flac" => "audio/flac",
    "m4a" => "audio/mp4",
    "aac" => "audio/aac",
    _ => "application/octet-stream",
  }
}

pub async fn handler<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  let bytes = engine
    .policy()
    .blob("get_audio", engine.blobs().get(&key))
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("audio {key} not found")))?;
  Ok(([(header::CONTENT_TYPE, content_type(&key))], bytes))
}
