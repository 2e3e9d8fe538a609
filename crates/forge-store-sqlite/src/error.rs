//! Error type for `forge-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown version category: {0:?}")]
  UnknownCategory(String),

  #[error("song not found: {0}")]
  SongNotFound(uuid::Uuid),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid audio extension: {0:?}")]
  InvalidExtension(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
