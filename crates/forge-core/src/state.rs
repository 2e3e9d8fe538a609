//! Client-side application state.
//!
//! A [`FeedState`] is owned by a single controller. It is filled by a full
//! reload and then patched from the results of mutations; when a patch does
//! not fit the local copy the controller reloads instead.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{like::LikeOutcome, rank, song::SongView, user::User};

/// Result of applying a mutation result to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
  Applied,
  /// Local state disagrees with the mutation result; reload everything.
  Stale,
}

#[derive(Debug, Clone, Default)]
pub struct FeedState {
  viewer:    Option<User>,
  songs:     Vec<SongView>,
  loaded_at: Option<DateTime<Utc>>,
}

impl FeedState {
  pub fn new(viewer: Option<User>) -> Self {
    Self {
      viewer,
      ..Default::default()
    }
  }

  pub fn viewer(&self) -> Option<&User> { self.viewer.as_ref() }

  pub fn set_viewer(&mut self, viewer: Option<User>) { self.viewer = viewer; }

  pub fn songs(&self) -> &[SongView] { &self.songs }

  pub fn song(&self, song_id: Uuid) -> Option<&SongView> {
    self.songs.iter().find(|s| s.song_id() == song_id)
  }

  /// When the last full reload happened, if ever.
  pub fn loaded_at(&self) -> Option<DateTime<Utc>> { self.loaded_at }

  /// Replace everything with a fresh full load (newest song first).
  pub fn replace(&mut self, songs: Vec<SongView>) {
    self.songs = songs.into_iter().map(rank::ranked).collect();
    self.loaded_at = Some(Utc::now());
  }

  /// Patch the liked version's song from a toggle result.
  ///
  /// Stale if the song is unknown locally or its set of versions differs from
  /// the one the server returned.
  pub fn apply_like(&mut self, outcome: &LikeOutcome) -> Patch {
    let Some(local) = self.songs.iter_mut().find(|s| s.song_id() == outcome.song_id)
    else {
      return Patch::Stale;
    };

    let mut local_ids: Vec<Uuid> =
      local.versions.iter().map(|v| v.version.version_id).collect();
    let mut remote_ids: Vec<Uuid> =
      outcome.song.versions.iter().map(|v| v.version.version_id).collect();
    local_ids.sort();
    remote_ids.sort();
    if local_ids != remote_ids {
      return Patch::Stale;
    }

    let was_complete = local.song.is_complete;
    *local = rank::ranked(outcome.song.clone());
    // Completion never reverts, even if the server copy is older.
    local.song.is_complete |= was_complete;
    Patch::Applied
  }

  /// Insert or replace a song returned by a release or a new version.
  /// Newly seen songs go to the top of the feed.
  pub fn upsert_song(&mut self, song: SongView) {
    let song = rank::ranked(song);
    match self.songs.iter_mut().find(|s| s.song_id() == song.song_id()) {
      Some(local) => {
        let was_complete = local.song.is_complete;
        *local = song;
        local.song.is_complete |= was_complete;
      }
      None => self.songs.insert(0, song),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::song::{AudioRef, Song, Version, VersionView};

  fn version(song_id: Uuid, original: bool, likes: u64, secs: i64) -> VersionView {
    VersionView {
      version:    Version {
        version_id: Uuid::new_v4(),
        song_id,
        creator_id: Uuid::nil(),
        audio: AudioRef {
          key: "k.mp3".into(),
          url: "http://localhost/audio/k.mp3".into(),
        },
        is_original: original,
        notes: None,
        category: None,
        created_at: Utc.timestamp_opt(secs, 0).unwrap(),
      },
      creator:    "someone".into(),
      like_count: likes,
    }
  }

  fn song(title: &str, versions: Vec<VersionView>) -> SongView {
    let song_id = versions.first().map(|v| v.version.song_id).unwrap_or_default();
    SongView {
      song: Song {
        song_id,
        title: title.into(),
        description: None,
        author_id: Uuid::nil(),
        is_complete: false,
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
      },
      author: "someone".into(),
      versions,
    }
  }

  fn outcome(song: SongView, version_id: Uuid, like_count: u64) -> LikeOutcome {
    LikeOutcome {
      version_id,
      song_id: song.song_id(),
      liked: true,
      like_count,
      song_completed: false,
      song,
    }
  }

  #[test]
  fn replace_ranks_songs() {
    let id = Uuid::new_v4();
    let mut state = FeedState::default();
    state.replace(vec![song("s", vec![version(id, false, 9, 1), version(id, true, 0, 0)])]);
    assert!(state.songs()[0].versions[0].version.is_original);
    assert!(state.loaded_at().is_some());
  }

  #[test]
  fn like_patch_updates_counts_and_order() {
    let id = Uuid::new_v4();
    let original = version(id, true, 0, 0);
    let a = version(id, false, 2, 1);
    let b = version(id, false, 2, 2);
    let mut state = FeedState::default();
    state.replace(vec![song("s", vec![original.clone(), a.clone(), b.clone()])]);

    let mut liked_b = b.clone();
    liked_b.like_count = 3;
    let remote = song("s", vec![original, a.clone(), liked_b.clone()]);
    let patch = state.apply_like(&outcome(remote, liked_b.version.version_id, 3));

    assert_eq!(patch, Patch::Applied);
    let local = state.song(id).unwrap();
    assert_eq!(local.versions[1].version.version_id, b.version.version_id);
    assert_eq!(local.versions[1].like_count, 3);
    assert_eq!(local.versions[2].version.version_id, a.version.version_id);
  }

  #[test]
  fn unknown_song_is_stale() {
    let id = Uuid::new_v4();
    let remote = song("s", vec![version(id, true, 1, 0)]);
    let version_id = remote.versions[0].version.version_id;
    let mut state = FeedState::default();
    assert_eq!(state.apply_like(&outcome(remote, version_id, 1)), Patch::Stale);
  }

  #[test]
  fn new_remote_version_is_stale() {
    let id = Uuid::new_v4();
    let original = version(id, true, 0, 0);
    let mut state = FeedState::default();
    state.replace(vec![song("s", vec![original.clone()])]);

    let remote = song("s", vec![original.clone(), version(id, false, 0, 1)]);
    assert_eq!(
      state.apply_like(&outcome(remote, original.version.version_id, 1)),
      Patch::Stale
    );
  }

  #[test]
  fn patches_never_clear_completion() {
    let id = Uuid::new_v4();
    let original = version(id, true, 1000, 0);
    let mut complete = song("s", vec![original.clone()]);
    complete.song.is_complete = true;

    let mut state = FeedState::default();
    state.replace(vec![complete.clone()]);

    let mut older = complete.clone();
    older.song.is_complete = false;
    state.apply_like(&outcome(older.clone(), original.version.version_id, 999));
    assert!(state.song(id).unwrap().song.is_complete);

    state.upsert_song(older);
    assert!(state.song(id).unwrap().song.is_complete);
  }

  #[test]
  fn upsert_puts_new_songs_first() {
    let first = song("first", vec![version(Uuid::new_v4(), true, 0, 0)]);
    let second = song("second", vec![version(Uuid::new_v4(), true, 0, 0)]);
    let mut state = FeedState::new(None);
    state.replace(vec![first]);
    state.upsert_song(second.clone());
    assert_eq!(state.songs()[0].song_id(), second.song_id());
    assert_eq!(state.songs().len(), 2);
  }
}
