//! JSON REST API for CollabForge.
//!
//! Exposes an axum [`Router`] backed by a [`VersionEngine`] over any
//! [`SongStore`] and [`BlobStore`]. Mutating endpoints require HTTP Basic
//! credentials; TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", forge_api::api_router(engine.clone()))
//! ```

pub mod audio;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod likes;
pub mod songs;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use forge_core::{
  VersionEngine,
  store::{BlobStore, SongStore},
};

pub use auth::Authenticated;
pub use error::ApiError;

/// Handler state: the engine shared by every request.
pub type SharedEngine<S, B> = Arc<VersionEngine<S, B>>;

/// Request bodies carry base64 audio, so allow a 10 MiB file plus encoding
/// overhead.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(engine: SharedEngine<S, B>) -> Router<()>
where
  S: SongStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    // Accounts
    .route("/users", post(users::signup::<S, B>))
    .route("/me", get(users::me))
    // Songs & versions
    .route("/songs", get(songs::list::<S, B>).post(songs::release::<S, B>))
    .route("/songs/{id}", get(songs::get_one::<S, B>))
    .route("/songs/{id}/versions", post(songs::add_version::<S, B>))
    // Likes
    .route("/versions/{id}/like", post(likes::toggle::<S, B>))
    // Dashboard & audio
    .route("/dashboard", get(dashboard::handler::<S, B>))
    .route("/audio/{key}", get(audio::handler::<S, B>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(engine)
}
