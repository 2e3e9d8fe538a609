//! The `SongStore` and `BlobStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `forge-store-sqlite`).
//! The engine and every layer above it depend on these abstractions, not on
//! any concrete backend.

use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::{
  like::Like,
  song::{AudioRef, NewSong, NewVersion, Song, SongView, Version, VersionView},
  user::{Credentials, NewUser, User},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`SongStore::list_songs`].
#[derive(Debug, Clone, Default)]
pub struct SongQuery {
  /// Restrict to songs released by this user.
  pub author_id: Option<Uuid>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// Parameters for [`SongStore::list_versions`].
#[derive(Debug, Clone, Default)]
pub struct VersionQuery {
  /// Restrict to versions created by this user.
  pub creator_id:        Option<Uuid>,
  /// If `false`, original versions are left out.
  pub include_originals: bool,
}

// ─── SongStore ───────────────────────────────────────────────────────────────

/// Abstraction over the relational side of a CollabForge backend.
///
/// Songs and versions are insert-only; the only mutations are toggling like
/// pairs and the one-way completion flag.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SongStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by username.
  fn find_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  // ── Songs & versions ──────────────────────────────────────────────────

  /// Persist a new song. The store assigns id and timestamp, and the song
  /// starts incomplete.
  fn insert_song(
    &self,
    input: NewSong,
  ) -> impl Future<Output = Result<Song, Self::Error>> + Send + '_;

  fn insert_version(
    &self,
    input: NewVersion,
  ) -> impl Future<Output = Result<Version, Self::Error>> + Send + '_;

  fn get_version(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Version>, Self::Error>> + Send + '_;

  /// A song with all of its versions and their like counts. Version order is
  /// unspecified.
  fn get_song(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SongView>, Self::Error>> + Send + '_;

  /// Songs matching `query`, newest first, each with nested versions.
  fn list_songs<'a>(
    &'a self,
    query: &'a SongQuery,
  ) -> impl Future<Output = Result<Vec<SongView>, Self::Error>> + Send + 'a;

  /// Versions matching `query`, newest first.
  fn list_versions<'a>(
    &'a self,
    query: &'a VersionQuery,
  ) -> impl Future<Output = Result<Vec<VersionView>, Self::Error>> + Send + 'a;

  // ── Likes ─────────────────────────────────────────────────────────────

  fn find_like(
    &self,
    version_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Like>, Self::Error>> + Send + '_;

  /// Insert the `(version_id, user_id)` pair. If the pair already exists the
  /// existing like is returned unchanged.
  fn insert_like(
    &self,
    version_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Like, Self::Error>> + Send + '_;

  /// Remove a like. Returns `false` if it was already gone.
  fn delete_like(
    &self,
    like_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_likes(
    &self,
    version_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Set the song's completion flag. Idempotent: returns `true` only if this
  /// call changed it.
  fn mark_song_complete(
    &self,
    song_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── BlobStore ───────────────────────────────────────────────────────────────

/// Durable storage for audio files.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under a key derived from their content, ending in
  /// `.{extension}`, and return a reference whose URL can be fetched by
  /// anyone. Storing the same bytes twice yields the same key.
  fn put<'a>(
    &'a self,
    extension: &'a str,
    bytes: Bytes,
  ) -> impl Future<Output = Result<AudioRef, Self::Error>> + Send + 'a;

  /// Fetch a stored file. Returns `None` for unknown or malformed keys.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + 'a;
}
