//! `GET /dashboard`: the caller's releases, contributions and like totals.

use axum::{Json, extract::State};
use forge_core::{
  engine::Dashboard,
  store::{BlobStore, SongStore},
};

use crate::{SharedEngine, auth::Authenticated, error::ApiError};

pub async fn handler<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Authenticated(user): Authenticated,
) -> Result<Json<Dashboard>, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  Ok(Json(engine.dashboard(&user).await?))
}
