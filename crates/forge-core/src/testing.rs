//! In-memory `SongStore` and `BlobStore` used by the engine tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest as _, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  like::Like,
  song::{AudioRef, NewSong, NewVersion, Song, SongView, Version, VersionView},
  store::{BlobStore, SongQuery, SongStore, VersionQuery},
  user::{Credentials, NewUser, User},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("injected failure")]
  Injected,
  #[error("unknown song {0}")]
  UnknownSong(Uuid),
}

#[derive(Default)]
struct Tables {
  users:    Vec<Credentials>,
  songs:    Vec<Song>,
  versions: Vec<Version>,
  likes:    Vec<Like>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables:                   Mutex<Tables>,
  /// Number of mutating calls made so far.
  pub writes:               AtomicUsize,
  pub fail_version_inserts: AtomicBool,
}

impl MemoryStore {
  /// Add `n` likes from throwaway users.
  pub fn seed_likes(&self, version_id: Uuid, n: u64) {
    let mut t = self.tables.lock().unwrap();
    for _ in 0..n {
      t.likes.push(Like {
        like_id: Uuid::new_v4(),
        version_id,
        user_id: Uuid::new_v4(),
        created_at: Utc::now(),
      });
    }
  }

  fn wrote(&self) { self.writes.fetch_add(1, Ordering::SeqCst); }
}

impl Tables {
  fn username(&self, user_id: Uuid) -> String {
    self
      .users
      .iter()
      .find(|c| c.user.user_id == user_id)
      .map(|c| c.user.username.clone())
      .unwrap_or_default()
  }

  fn version_view(&self, version: &Version) -> VersionView {
    VersionView {
      version:    version.clone(),
      creator:    self.username(version.creator_id),
      like_count: self
        .likes
        .iter()
        .filter(|l| l.version_id == version.version_id)
        .count() as u64,
    }
  }

  fn song_view(&self, song: &Song) -> SongView {
    SongView {
      song:     song.clone(),
      author:   self.username(song.author_id),
      versions: self
        .versions
        .iter()
        .filter(|v| v.song_id == song.song_id)
        .map(|v| self.version_view(v))
        .collect(),
    }
  }
}

impl SongStore for MemoryStore {
  type Error = MemoryError;

  async fn add_user(&self, input: NewUser) -> Result<User, MemoryError> {
    self.wrote();
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      email:      input.email,
      created_at: Utc::now(),
    };
    self.tables.lock().unwrap().users.push(Credentials {
      user:          user.clone(),
      password_hash: input.password_hash,
    });
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.users.iter().find(|c| c.user.user_id == id).map(|c| c.user.clone()))
  }

  async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.users.iter().find(|c| c.user.username == username).cloned())
  }

  async fn insert_song(&self, input: NewSong) -> Result<Song, MemoryError> {
    self.wrote();
    let song = Song {
      song_id:     Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      author_id:   input.author_id,
      is_complete: false,
      created_at:  Utc::now(),
    };
    self.tables.lock().unwrap().songs.push(song.clone());
    Ok(song)
  }

  async fn insert_version(&self, input: NewVersion) -> Result<Version, MemoryError> {
    self.wrote();
    if self.fail_version_inserts.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected);
    }
    let mut t = self.tables.lock().unwrap();
    if !t.songs.iter().any(|s| s.song_id == input.song_id) {
      return Err(MemoryError::UnknownSong(input.song_id));
    }
    let version = Version {
      version_id:  Uuid::new_v4(),
      song_id:     input.song_id,
      creator_id:  input.creator_id,
      audio:       input.audio,
      is_original: input.is_original,
      notes:       input.notes,
      category:    input.category,
      created_at:  Utc::now(),
    };
    t.versions.push(version.clone());
    Ok(version)
  }

  async fn get_version(&self, id: Uuid) -> Result<Option<Version>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.versions.iter().find(|v| v.version_id == id).cloned())
  }

  async fn get_song(&self, id: Uuid) -> Result<Option<SongView>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.songs.iter().find(|s| s.song_id == id).map(|s| t.song_view(s)))
  }

  async fn list_songs(&self, query: &SongQuery) -> Result<Vec<SongView>, MemoryError> {
    let t = self.tables.lock().unwrap();
    // Newest first; later inserts win ties.
    let mut songs: Vec<&Song> = t
      .songs
      .iter()
      .rev()
      .filter(|s| query.author_id.is_none_or(|a| s.author_id == a))
      .collect();
    songs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(
      songs
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|s| t.song_view(s))
        .collect(),
    )
  }

  async fn list_versions(&self, query: &VersionQuery) -> Result<Vec<VersionView>, MemoryError> {
    let t = self.tables.lock().unwrap();
    let mut versions: Vec<&Version> = t
      .versions
      .iter()
      .rev()
      .filter(|v| query.creator_id.is_none_or(|c| v.creator_id == c))
      .filter(|v| query.include_originals || !v.is_original)
      .collect();
    versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(versions.into_iter().map(|v| t.version_view(v)).collect())
  }

  async fn find_like(&self, version_id: Uuid, user_id: Uuid) -> Result<Option<Like>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.likes
        .iter()
        .find(|l| l.version_id == version_id && l.user_id == user_id)
        .cloned(),
    )
  }

  async fn insert_like(&self, version_id: Uuid, user_id: Uuid) -> Result<Like, MemoryError> {
    self.wrote();
    let mut t = self.tables.lock().unwrap();
    if let Some(existing) = t
      .likes
      .iter()
      .find(|l| l.version_id == version_id && l.user_id == user_id)
    {
      return Ok(existing.clone());
    }
    let like = Like {
      like_id: Uuid::new_v4(),
      version_id,
      user_id,
      created_at: Utc::now(),
    };
    t.likes.push(like.clone());
    Ok(like)
  }

  async fn delete_like(&self, like_id: Uuid) -> Result<bool, MemoryError> {
    self.wrote();
    let mut t = self.tables.lock().unwrap();
    let before = t.likes.len();
    t.likes.retain(|l| l.like_id != like_id);
    Ok(t.likes.len() != before)
  }

  async fn count_likes(&self, version_id: Uuid) -> Result<u64, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.likes.iter().filter(|l| l.version_id == version_id).count() as u64)
  }

  async fn mark_song_complete(&self, song_id: Uuid) -> Result<bool, MemoryError> {
    self.wrote();
    let mut t = self.tables.lock().unwrap();
    match t.songs.iter_mut().find(|s| s.song_id == song_id) {
      Some(song) if !song.is_complete => {
        song.is_complete = true;
        Ok(true)
      }
      Some(_) => Ok(false),
      None => Err(MemoryError::UnknownSong(song_id)),
    }
  }
}

#[derive(Default)]
pub struct MemoryBlobs {
  files: Mutex<HashMap<String, Bytes>>,
}

impl MemoryBlobs {
  pub fn len(&self) -> usize { self.files.lock().unwrap().len() }
}

impl BlobStore for MemoryBlobs {
  type Error = MemoryError;

  async fn put(&self, extension: &str, bytes: Bytes) -> Result<AudioRef, MemoryError> {
    let key = format!("{}.{extension}", hex::encode(Sha256::digest(&bytes)));
    self.files.lock().unwrap().insert(key.clone(), bytes);
    Ok(AudioRef {
      url: format!("memory://{key}"),
      key,
    })
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>, MemoryError> {
    Ok(self.files.lock().unwrap().get(key).cloned())
  }
}
