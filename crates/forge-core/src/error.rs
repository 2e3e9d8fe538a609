//! Error types for `forge-core`.

use thiserror::Error;
use uuid::Uuid;

/// Input rejected before any store or blob call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("a song needs a title")]
  MissingTitle,

  #[error("please select an audio file")]
  MissingAudio,

  #[error("audio file is empty")]
  EmptyAudio,

  #[error("file must be under {limit} bytes, got {size}")]
  AudioTooLarge { size: usize, limit: usize },

  #[error("unsupported audio file: {0:?}")]
  UnsupportedAudio(String),

  #[error("the original version cannot carry a category")]
  CategoryOnOriginal,

  #[error("username must be 3-32 letters, digits, '_' or '-'")]
  InvalidUsername,

  #[error("invalid email address")]
  InvalidEmail,

  #[error("password must be at least {0} characters")]
  WeakPassword(usize),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("song not found: {0}")]
  SongNotFound(Uuid),

  #[error("version not found: {0}")]
  VersionNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("song {0} already has an original version")]
  OriginalExists(Uuid),

  /// The call did not finish in time. For mutations the outcome is unknown
  /// until the next reload.
  #[error("{0} timed out")]
  Timeout(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("blob store error: {0}")]
  Blob(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
