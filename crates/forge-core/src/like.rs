//! Likes and the result of toggling one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::song::SongView;

/// A user's endorsement of a version. At most one per `(version_id, user_id)`
/// pair (enforced by a UNIQUE constraint in the SQLite store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
  pub like_id:    Uuid,
  pub version_id: Uuid,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

/// What a like toggle did, with the freshly re-read state of the song.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeOutcome {
  pub version_id:     Uuid,
  pub song_id:        Uuid,
  /// `true` if the toggle inserted a like, `false` if it removed one.
  pub liked:          bool,
  pub like_count:     u64,
  /// `true` only when this toggle flipped the song to complete.
  pub song_completed: bool,
  /// The parent song, re-read from the store and ranked.
  pub song:           SongView,
}
