//! HTTP Basic-auth extractor and password hashing.
//!
//! Credentials are checked on every request against the argon2 hash stored
//! with the user; there are no server-side sessions.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use forge_core::{
  VersionEngine,
  store::{BlobStore, SongStore},
  user::User,
};
use rand_core::OsRng;

use crate::error::ApiError;

/// The user whose credentials accompanied the request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub User);

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// Split a `Basic` authorization header into username and password.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_string(), password.to_string()))
}

/// Verify the request's Basic credentials against the stored hash.
pub async fn verify_auth<S, B>(
  headers: &HeaderMap,
  engine: &VersionEngine<S, B>,
) -> Result<User, ApiError>
where
  S: SongStore,
  B: BlobStore,
{
  let (username, password) = basic_credentials(headers)?;

  let creds = engine
    .credentials(&username)
    .await?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&creds.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(creds.user)
}

impl<S, B> FromRequestParts<Arc<VersionEngine<S, B>>> for Authenticated
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    engine: &Arc<VersionEngine<S, B>>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, engine).await.map(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;
  use forge_core::user::NewUser;
  use forge_store_sqlite::{FsBlobStore, SqliteStore};

  use super::*;

  async fn engine(
    dir: &tempfile::TempDir,
  ) -> Arc<VersionEngine<SqliteStore, FsBlobStore>> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let blobs = FsBlobStore::open(dir.path(), "http://localhost/api/audio")
      .await
      .unwrap();
    let engine = VersionEngine::new(Arc::new(store), Arc::new(blobs));
    engine
      .register(NewUser {
        username:      "user".into(),
        email:         "user@example.com".into(),
        password_hash: hash_password("secret").unwrap(),
      })
      .await
      .unwrap();
    Arc::new(engine)
  }

  async fn extract(
    req: Request<axum::body::Body>,
    engine: &Arc<VersionEngine<SqliteStore, FsBlobStore>>,
  ) -> Result<Authenticated, ApiError> {
    let (mut parts, _) = req.into_parts();
    Authenticated::from_request_parts(&mut parts, engine).await
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  fn request(auth: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder();
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(axum::body::Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn correct_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;
    let Authenticated(user) = extract(request(Some(&basic("user", "secret"))), &engine)
      .await
      .unwrap();
    assert_eq!(user.username, "user");
  }

  #[tokio::test]
  async fn wrong_password() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;
    let res = extract(request(Some(&basic("user", "wrong"))), &engine).await;
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_user() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;
    let res = extract(request(Some(&basic("nobody", "secret"))), &engine).await;
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn missing_or_malformed_header() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;
    assert!(matches!(
      extract(request(None), &engine).await,
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      extract(request(Some("Basic !!!not-base64!!!")), &engine).await,
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      extract(request(Some("Bearer token")), &engine).await,
      Err(ApiError::Unauthorized)
    ));
  }
}
