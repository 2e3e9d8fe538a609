//! Handlers for account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: `{"username","email","password"}`; 201 + user |
//! | `GET`  | `/me` | The authenticated user |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use forge_core::{
  store::{BlobStore, SongStore},
  user::{NewUser, User},
  validate,
};
use serde::Deserialize;

use crate::{SharedEngine, auth::Authenticated, auth::hash_password, error::ApiError};

// ─── Sign up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

/// `POST /users`
pub async fn signup<S, B>(
  State(engine): State<SharedEngine<S, B>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  validate::password(&body.password).map_err(forge_core::Error::from)?;
  let password_hash = hash_password(&body.password)?;

  let user = engine
    .register(NewUser {
      username: body.username,
      email: body.email,
      password_hash,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Me ──────────────────────────────────────────────────────────────────────

/// `GET /me`
pub async fn me(Authenticated(user): Authenticated) -> Json<User> { Json(user) }
