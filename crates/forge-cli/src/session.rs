//! The CLI's controller: owns the local [`FeedState`], sends mutations and
//! folds their results back in.

use anyhow::Result;
use forge_core::{
  like::LikeOutcome,
  song::{SongView, VersionCategory},
  state::{FeedState, Patch},
  user::User,
};
use uuid::Uuid;

use crate::client::{ApiClient, InlineAudio};

pub struct Session {
  client: ApiClient,
  state:  FeedState,
}

impl Session {
  pub fn new(client: ApiClient) -> Self {
    Self {
      client,
      state: FeedState::default(),
    }
  }

  pub fn state(&self) -> &FeedState { &self.state }

  pub fn client(&self) -> &ApiClient { &self.client }

  /// Resolve the configured credentials to a user.
  pub async fn sign_in(&mut self) -> Result<User> {
    let user = self.client.me().await?;
    self.state.set_viewer(Some(user.clone()));
    Ok(user)
  }

  /// Replace local state with a fresh feed.
  pub async fn reload(&mut self, author: Option<Uuid>, limit: Option<usize>) -> Result<()> {
    match self.client.list_songs(author, limit).await {
      Ok(songs) => {
        self.state.replace(songs);
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "failed to load songs");
        Err(e.context("failed to load songs"))
      }
    }
  }

  /// Toggle a like and patch the affected song; falls back to a full reload
  /// when the local copy no longer matches the server.
  pub async fn toggle_like(&mut self, version_id: Uuid) -> Result<LikeOutcome> {
    let outcome = self.client.toggle_like(version_id).await?;
    if self.state.apply_like(&outcome) == Patch::Stale {
      tracing::debug!(song_id = %outcome.song_id, "local feed stale, reloading");
      if self.reload(None, None).await.is_err() {
        // The outcome itself is authoritative for the song it touched.
        self.state.upsert_song(outcome.song.clone());
      }
    }
    Ok(outcome)
  }

  pub async fn release(
    &mut self,
    title: &str,
    description: Option<&str>,
    tags: Option<&str>,
    audio: InlineAudio,
  ) -> Result<SongView> {
    let song = self.client.release(title, description, tags, audio).await?;
    self.state.upsert_song(song.clone());
    Ok(song)
  }

  pub async fn remix(
    &mut self,
    song_id: Uuid,
    notes: Option<&str>,
    category: Option<VersionCategory>,
    audio: InlineAudio,
  ) -> Result<SongView> {
    let song = self.client.add_version(song_id, notes, category, audio).await?;
    self.state.upsert_song(song.clone());
    Ok(song)
  }
}
