//! [`VersionEngine`] — ranking, like toggling, completion and version
//! submission on top of a [`SongStore`] and a [`BlobStore`].
//!
//! The store is the single source of truth. Every mutation re-reads the state
//! it depends on immediately before acting and returns the re-read, ranked
//! song rather than a locally predicted one.
//!
//! Mutations are serialised per acting user: while one of a user's actions is
//! waiting on the backend, that user's next action waits its turn. Actions of
//! different users run concurrently; conflicts between them are settled by the
//! store's uniqueness constraints.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  like::LikeOutcome,
  policy::CallPolicy,
  rank,
  song::{
    AudioRef, AudioUpload, NewSong, NewVersion, SongView, Version, VersionCategory,
    VersionView,
  },
  store::{BlobStore, SongQuery, SongStore, VersionQuery},
  user::{Credentials, NewUser, User},
  validate,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`VersionEngine::submit_version`]: a version whose audio has
/// already been stored.
#[derive(Debug, Clone)]
pub struct SubmitVersion {
  pub audio:       Option<AudioRef>,
  pub notes:       Option<String>,
  pub category:    Option<VersionCategory>,
  pub is_original: bool,
}

/// Input to [`VersionEngine::release_song`].
#[derive(Debug, Clone)]
pub struct Release {
  pub title:       String,
  pub description: Option<String>,
  /// Mood / genre tags; kept as the original version's notes.
  pub tags:        Option<String>,
  pub upload:      Option<AudioUpload>,
}

/// Input to [`VersionEngine::add_version`].
#[derive(Debug, Clone)]
pub struct Rework {
  pub notes:    Option<String>,
  pub category: Option<VersionCategory>,
  pub upload:   Option<AudioUpload>,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// A user's own releases and contributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub user:             User,
  pub songs_released:   usize,
  pub versions_created: usize,
  /// Likes across every version of every song the user released.
  pub total_likes:      u64,
  pub songs:            Vec<SongView>,
  /// Non-original versions the user created, newest first.
  pub versions:         Vec<VersionView>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

type Gates = Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>;

pub struct VersionEngine<S, B> {
  store:  Arc<S>,
  blobs:  Arc<B>,
  policy: CallPolicy,
  gates:  Gates,
}

/// A held per-user mutation slot. The map entry goes away with its last
/// holder.
struct UserGate<'a> {
  guard:   Option<OwnedMutexGuard<()>>,
  user_id: Uuid,
  gates:   &'a Gates,
}

impl Drop for UserGate<'_> {
  fn drop(&mut self) {
    drop(self.guard.take());
    // Waiters clone the Arc under the map lock, so a count of one means
    // nobody else holds or awaits this slot.
    let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
    if gates
      .get(&self.user_id)
      .is_some_and(|gate| Arc::strong_count(gate) == 1)
    {
      gates.remove(&self.user_id);
    }
  }
}

impl<S, B> VersionEngine<S, B>
where
  S: SongStore,
  B: BlobStore,
{
  pub fn new(store: Arc<S>, blobs: Arc<B>) -> Self {
    Self {
      store,
      blobs,
      policy: CallPolicy::default(),
      gates: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_policy(mut self, policy: CallPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn blobs(&self) -> &B { &self.blobs }

  pub fn policy(&self) -> &CallPolicy { &self.policy }

  /// Wait for exclusive use of `user_id`'s mutation slot.
  async fn gate(&self, user_id: Uuid) -> UserGate<'_> {
    let gate = {
      let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
      gates.entry(user_id).or_default().clone()
    };
    UserGate {
      guard: Some(gate.lock_owned().await),
      user_id,
      gates: &self.gates,
    }
  }

  #[cfg(test)]
  fn open_gates(&self) -> usize {
    self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  // ── Ranking ───────────────────────────────────────────────────────────

  /// Put a song's versions into display order.
  pub fn rank(&self, song: &mut SongView) { rank::rank(&mut song.versions); }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// One song, ranked.
  pub async fn song(&self, song_id: Uuid) -> Result<SongView> {
    let store = &*self.store;
    let song = self
      .policy
      .read("get_song", move || store.get_song(song_id))
      .await?
      .ok_or(Error::SongNotFound(song_id))?;
    Ok(rank::ranked(song))
  }

  /// Songs matching `query`, newest first, each ranked.
  pub async fn load_feed(&self, query: &SongQuery) -> Result<Vec<SongView>> {
    let store = &*self.store;
    let songs = self
      .policy
      .read("list_songs", move || store.list_songs(query))
      .await?;
    Ok(songs.into_iter().map(rank::ranked).collect())
  }

  /// Full reload followed by a completion check on every song. Returns the
  /// ids of songs this pass marked complete.
  pub async fn reconcile(&self) -> Result<Vec<Uuid>> {
    let mut flipped = Vec::new();
    for mut song in self.load_feed(&SongQuery::default()).await? {
      if self.check_completion(&mut song).await? {
        flipped.push(song.song_id());
      }
    }
    Ok(flipped)
  }

  pub async fn dashboard(&self, user: &User) -> Result<Dashboard> {
    let songs = self
      .load_feed(&SongQuery {
        author_id: Some(user.user_id),
        ..Default::default()
      })
      .await?;

    let query = VersionQuery {
      creator_id:        Some(user.user_id),
      include_originals: false,
    };
    let store = &*self.store;
    let query = &query;
    let versions = self
      .policy
      .read("list_versions", move || store.list_versions(query))
      .await?;

    Ok(Dashboard {
      user: user.clone(),
      songs_released: songs.len(),
      versions_created: versions.len(),
      total_likes: songs.iter().map(SongView::total_likes).sum(),
      songs,
      versions,
    })
  }

  // ── Likes ─────────────────────────────────────────────────────────────

  /// Like `version_id` if `user` does not like it yet, otherwise unlike it.
  ///
  /// The existing-like check is re-read right before deciding. Two toggles
  /// of the same pair racing from different processes can still both see
  /// the same state; the store's unique constraint keeps the data valid but
  /// the resulting state may not be what either caller expected.
  pub async fn toggle_like(&self, version_id: Uuid, user: &User) -> Result<LikeOutcome> {
    let _gate = self.gate(user.user_id).await;
    let store = &*self.store;
    let user_id = user.user_id;

    let version = self
      .policy
      .read("get_version", move || store.get_version(version_id))
      .await?
      .ok_or(Error::VersionNotFound(version_id))?;

    let existing = self
      .policy
      .read("find_like", move || store.find_like(version_id, user_id))
      .await?;

    let liked = match existing {
      Some(like) => {
        self
          .policy
          .write("delete_like", store.delete_like(like.like_id))
          .await?;
        false
      }
      None => {
        self
          .policy
          .write("insert_like", store.insert_like(version_id, user_id))
          .await?;
        true
      }
    };

    let like_count = self
      .policy
      .read("count_likes", move || store.count_likes(version_id))
      .await?;
    tracing::debug!(%version_id, user = %user.username, liked, like_count, "toggled like");

    let mut song = self.song(version.song_id).await?;
    let song_completed = if liked {
      self.check_completion(&mut song).await?
    } else {
      false
    };

    Ok(LikeOutcome {
      version_id,
      song_id: version.song_id,
      liked,
      like_count,
      song_completed,
      song,
    })
  }

  /// Mark `song` complete if it is not yet and any version reached the
  /// threshold. Completion is sticky: a complete song is left alone no
  /// matter its current counts. Returns `true` if this call flipped it.
  pub async fn check_completion(&self, song: &mut SongView) -> Result<bool> {
    if song.song.is_complete || !rank::reaches_completion(&song.versions) {
      return Ok(false);
    }

    let song_id = song.song_id();
    let flipped = self
      .policy
      .write("mark_song_complete", self.store.mark_song_complete(song_id))
      .await?;
    song.song.is_complete = true;

    if flipped {
      tracing::info!(%song_id, title = %song.song.title, "song reached completion");
    }
    Ok(flipped)
  }

  // ── Versions ──────────────────────────────────────────────────────────

  /// Record a version whose audio is already stored and return it with the
  /// re-ranked song.
  pub async fn submit_version(
    &self,
    song_id: Uuid,
    creator: &User,
    submission: SubmitVersion,
  ) -> Result<(Version, SongView)> {
    let _gate = self.gate(creator.user_id).await;
    self.record_version(song_id, creator, submission).await
  }

  async fn record_version(
    &self,
    song_id: Uuid,
    creator: &User,
    submission: SubmitVersion,
  ) -> Result<(Version, SongView)> {
    let audio = submission.audio.ok_or(ValidationError::MissingAudio)?;
    if submission.is_original && submission.category.is_some() {
      return Err(ValidationError::CategoryOnOriginal.into());
    }

    let song = self.song(song_id).await?;
    if submission.is_original && song.original().is_some() {
      return Err(Error::OriginalExists(song_id));
    }

    let new = NewVersion {
      song_id,
      creator_id: creator.user_id,
      audio,
      is_original: submission.is_original,
      notes: validate::optional_text(submission.notes),
      category: submission.category,
    };
    let version = self
      .policy
      .write("insert_version", self.store.insert_version(new))
      .await?;

    let song = self.song(song_id).await?;
    Ok((version, song))
  }

  /// Release a new song: store the audio, create the song, then its original
  /// version.
  ///
  /// If a record insert fails after the audio was stored, the file stays in
  /// the blob store with nothing pointing at it; no cleanup is attempted.
  pub async fn release_song(&self, author: &User, release: Release) -> Result<SongView> {
    let title = validate::title(&release.title)?;
    let extension = validate::upload(release.upload.as_ref())?;
    let upload = release.upload.ok_or(ValidationError::MissingAudio)?;

    let _gate = self.gate(author.user_id).await;

    let audio = self
      .policy
      .blob("put_audio", self.blobs.put(&extension, upload.bytes))
      .await?;

    let new_song = NewSong {
      title,
      description: validate::optional_text(release.description),
      author_id: author.user_id,
    };
    let song = match self
      .policy
      .write("insert_song", self.store.insert_song(new_song))
      .await
    {
      Ok(song) => song,
      Err(e) => {
        orphaned(&audio, &e);
        return Err(e);
      }
    };

    let original = SubmitVersion {
      audio:       Some(audio.clone()),
      notes:       release.tags,
      category:    None,
      is_original: true,
    };
    match self.record_version(song.song_id, author, original).await {
      Ok((_, view)) => {
        tracing::info!(
          song_id = %song.song_id,
          title = %song.title,
          author = %author.username,
          "released song"
        );
        Ok(view)
      }
      Err(e) => {
        orphaned(&audio, &e);
        Err(e)
      }
    }
  }

  /// Add a remix or cover to an existing song.
  pub async fn add_version(
    &self,
    song_id: Uuid,
    creator: &User,
    rework: Rework,
  ) -> Result<(Version, SongView)> {
    let extension = validate::upload(rework.upload.as_ref())?;
    let upload = rework.upload.ok_or(ValidationError::MissingAudio)?;

    let _gate = self.gate(creator.user_id).await;

    // Fail on an unknown song before anything is written.
    self.song(song_id).await?;

    let audio = self
      .policy
      .blob("put_audio", self.blobs.put(&extension, upload.bytes))
      .await?;

    let submission = SubmitVersion {
      audio:       Some(audio.clone()),
      notes:       rework.notes,
      category:    rework.category,
      is_original: false,
    };
    let result = self.record_version(song_id, creator, submission).await;
    match &result {
      Ok((version, _)) => tracing::info!(
        %song_id,
        version_id = %version.version_id,
        creator = %creator.username,
        "added version"
      ),
      Err(e) => orphaned(&audio, e),
    }
    result
  }

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account. The password must already be hashed.
  pub async fn register(&self, input: NewUser) -> Result<User> {
    let username = validate::username(&input.username)?;
    let email = validate::email(&input.email)?;

    if self.credentials(&username).await?.is_some() {
      return Err(Error::UsernameTaken(username));
    }

    let user = self
      .policy
      .write(
        "add_user",
        self.store.add_user(NewUser {
          username,
          email,
          password_hash: input.password_hash,
        }),
      )
      .await?;
    tracing::info!(user_id = %user.user_id, username = %user.username, "registered user");
    Ok(user)
  }

  /// Stored credentials for `username`, used to verify a login.
  pub async fn credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let store = &*self.store;
    self
      .policy
      .read("find_credentials", move || store.find_credentials(username))
      .await
  }

  pub async fn user(&self, user_id: Uuid) -> Result<User> {
    let store = &*self.store;
    self
      .policy
      .read("get_user", move || store.get_user(user_id))
      .await?
      .ok_or(Error::UserNotFound(user_id))
  }
}

fn orphaned(audio: &AudioRef, error: &Error) {
  tracing::warn!(
    key = %audio.key,
    %error,
    "audio stored but no version references it"
  );
}
