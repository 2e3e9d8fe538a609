//! `POST /versions/{id}/like`: toggle the caller's like on a version.

use axum::{
  Json,
  extract::{Path, State},
};
use forge_core::{
  like::LikeOutcome,
  store::{BlobStore, SongStore},
};
use uuid::Uuid;

use crate::{SharedEngine, auth::Authenticated, error::ApiError};

pub async fn toggle<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Path(id): Path<Uuid>,
  Authenticated(user): Authenticated,
) -> Result<Json<LikeOutcome>, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  Ok(Json(engine.toggle_like(id, &user).await?))
}
