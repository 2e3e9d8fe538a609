//! Songs and their versions.
//!
//! A song is released together with exactly one original version. Everyone
//! else contributes further versions (alterations or covers). Nothing here is
//! ever deleted: an originator cannot revoke released work.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

// ─── Audio ───────────────────────────────────────────────────────────────────

/// Where a version's audio lives in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRef {
  /// Store-relative key, e.g. `9f86d0…08.mp3`.
  pub key: String,
  /// Publicly dereferenceable URL for playback.
  pub url: String,
}

/// A raw audio file as submitted by a user, not yet stored.
#[derive(Debug, Clone)]
pub struct AudioUpload {
  /// Client-side file name; only its extension is used.
  pub file_name: String,
  pub bytes:     Bytes,
}

// ─── Category ────────────────────────────────────────────────────────────────

/// What kind of rework a non-original version is.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VersionCategory {
  /// Same song, changed arrangement, lyrics, genre, ...
  Alter,
  /// A fresh performance of the original.
  Cover,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A released work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
  pub song_id:     Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub author_id:   Uuid,
  /// Set once any version reaches the like threshold; never cleared.
  pub is_complete: bool,
  pub created_at:  DateTime<Utc>,
}

/// A single audio rendition of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
  pub version_id:  Uuid,
  pub song_id:     Uuid,
  pub creator_id:  Uuid,
  pub audio:       AudioRef,
  /// Exactly one version per song has this set, fixed at release time.
  pub is_original: bool,
  pub notes:       Option<String>,
  pub category:    Option<VersionCategory>,
  pub created_at:  DateTime<Utc>,
}

// ─── Store inputs ────────────────────────────────────────────────────────────

/// Input to [`crate::store::SongStore::insert_song`].
/// `song_id`, `created_at` and `is_complete` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSong {
  pub title:       String,
  pub description: Option<String>,
  pub author_id:   Uuid,
}

/// Input to [`crate::store::SongStore::insert_version`].
#[derive(Debug, Clone)]
pub struct NewVersion {
  pub song_id:     Uuid,
  pub creator_id:  Uuid,
  pub audio:       AudioRef,
  pub is_original: bool,
  pub notes:       Option<String>,
  pub category:    Option<VersionCategory>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A version with the creator's name and its current like count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionView {
  #[serde(flatten)]
  pub version:    Version,
  pub creator:    String,
  /// Number of distinct users liking this version; derived, never stored.
  pub like_count: u64,
}

/// A song with its author's name and all of its versions.
///
/// Versions are in ranked order once they have passed through
/// [`crate::rank::rank`]; stores return them unordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongView {
  #[serde(flatten)]
  pub song:     Song,
  pub author:   String,
  pub versions: Vec<VersionView>,
}

impl SongView {
  pub fn song_id(&self) -> Uuid { self.song.song_id }

  pub fn original(&self) -> Option<&VersionView> {
    self.versions.iter().find(|v| v.version.is_original)
  }

  pub fn version(&self, version_id: Uuid) -> Option<&VersionView> {
    self
      .versions
      .iter()
      .find(|v| v.version.version_id == version_id)
  }

  /// Likes summed over every version of the song.
  pub fn total_likes(&self) -> u64 {
    self.versions.iter().map(|v| v.like_count).sum()
  }
}
