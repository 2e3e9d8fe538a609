//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so lexical order matches chronological order. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use forge_core::{
  like::Like,
  song::{AudioRef, Song, SongView, Version, VersionCategory, VersionView},
  user::{Credentials, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── VersionCategory ─────────────────────────────────────────────────────────

pub fn encode_category(c: VersionCategory) -> &'static str {
  match c {
    VersionCategory::Alter => "alter",
    VersionCategory::Cover => "cover",
  }
}

pub fn decode_category(s: &str) -> Result<VersionCategory> {
  VersionCategory::from_str(s).map_err(|_| Error::UnknownCategory(s.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, email, password_hash, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          User {
        user_id:    decode_uuid(&self.user_id)?,
        username:   self.username,
        email:      self.email,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.user) }
}

/// Raw values read from a `songs` row joined with its author.
pub struct RawSong {
  pub song_id:     String,
  pub title:       String,
  pub description: Option<String>,
  pub author_id:   String,
  pub is_complete: bool,
  pub created_at:  String,
  pub author:      String,
}

impl RawSong {
  pub const SELECT: &'static str = "SELECT s.song_id, s.title, s.description,
       s.author_id, s.is_complete, s.created_at, u.username
     FROM songs s
     JOIN users u ON u.user_id = s.author_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      song_id:     row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      author_id:   row.get(3)?,
      is_complete: row.get(4)?,
      created_at:  row.get(5)?,
      author:      row.get(6)?,
    })
  }

  pub fn into_view(self, versions: Vec<RawVersion>) -> Result<SongView> {
    Ok(SongView {
      song:     Song {
        song_id:     decode_uuid(&self.song_id)?,
        title:       self.title,
        description: self.description,
        author_id:   decode_uuid(&self.author_id)?,
        is_complete: self.is_complete,
        created_at:  decode_dt(&self.created_at)?,
      },
      author:   self.author,
      versions: versions
        .into_iter()
        .map(RawVersion::into_view)
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw values read from a `versions` row, optionally joined with its creator
/// and like count.
pub struct RawVersion {
  pub version_id:  String,
  pub song_id:     String,
  pub creator_id:  String,
  pub audio_key:   String,
  pub audio_url:   String,
  pub is_original: bool,
  pub notes:       Option<String>,
  pub category:    Option<String>,
  pub created_at:  String,
  pub creator:     String,
  pub like_count:  i64,
}

impl RawVersion {
  /// Select list producing every column [`RawVersion::from_row`] reads.
  pub const SELECT: &'static str = "SELECT v.version_id, v.song_id, v.creator_id,
       v.audio_key, v.audio_url, v.is_original, v.notes, v.category,
       v.created_at, u.username,
       (SELECT COUNT(*) FROM version_likes l WHERE l.version_id = v.version_id)
     FROM versions v
     JOIN users u ON u.user_id = v.creator_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version_id:  row.get(0)?,
      song_id:     row.get(1)?,
      creator_id:  row.get(2)?,
      audio_key:   row.get(3)?,
      audio_url:   row.get(4)?,
      is_original: row.get(5)?,
      notes:       row.get(6)?,
      category:    row.get(7)?,
      created_at:  row.get(8)?,
      creator:     row.get(9)?,
      like_count:  row.get(10)?,
    })
  }

  pub fn into_version(self) -> Result<Version> { Ok(self.into_view()?.version) }

  pub fn into_view(self) -> Result<VersionView> {
    let version = Version {
      version_id:  decode_uuid(&self.version_id)?,
      song_id:     decode_uuid(&self.song_id)?,
      creator_id:  decode_uuid(&self.creator_id)?,
      audio:       AudioRef {
        key: self.audio_key,
        url: self.audio_url,
      },
      is_original: self.is_original,
      notes:       self.notes,
      category:    self.category.as_deref().map(decode_category).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
    };
    Ok(VersionView {
      version,
      creator: self.creator,
      like_count: self.like_count.max(0) as u64,
    })
  }
}

/// Raw values read from a `version_likes` row.
pub struct RawLike {
  pub like_id:    String,
  pub version_id: String,
  pub user_id:    String,
  pub created_at: String,
}

impl RawLike {
  pub const SELECT: &'static str =
    "SELECT like_id, version_id, user_id, created_at FROM version_likes";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      like_id:    row.get(0)?,
      version_id: row.get(1)?,
      user_id:    row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_like(self) -> Result<Like> {
    Ok(Like {
      like_id:    decode_uuid(&self.like_id)?,
      version_id: decode_uuid(&self.version_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn category_round_trips_and_rejects_unknown() {
    for c in [VersionCategory::Alter, VersionCategory::Cover] {
      assert_eq!(decode_category(encode_category(c)).unwrap(), c);
    }
    assert!(matches!(
      decode_category("bootleg"),
      Err(Error::UnknownCategory(s)) if s == "bootleg"
    ));
  }
}
