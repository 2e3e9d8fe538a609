//! [`SqliteStore`], the SQLite implementation of [`SongStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use forge_core::{
  like::Like,
  song::{NewSong, NewVersion, Song, SongView, Version, VersionView},
  store::{SongQuery, SongStore, VersionQuery},
  user::{Credentials, NewUser, User},
};

use crate::{
  encode::{
    encode_category, encode_dt, encode_uuid, now, RawLike, RawSong, RawUser, RawVersion,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CollabForge song store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Fetch every version of `song_id` with creator and like count.
fn song_versions(
  conn: &rusqlite::Connection,
  song_id: &str,
) -> rusqlite::Result<Vec<RawVersion>> {
  let mut stmt = conn.prepare_cached(&format!(
    "{} WHERE v.song_id = ?1 ORDER BY v.created_at, v.rowid",
    RawVersion::SELECT
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![song_id], RawVersion::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn like_by_pair(
  conn: &rusqlite::Connection,
  version_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawLike>> {
  conn
    .query_row(
      &format!("{} WHERE version_id = ?1 AND user_id = ?2", RawLike::SELECT),
      rusqlite::params![version_id, user_id],
      RawLike::from_row,
    )
    .optional()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a raw statement, bypassing the store API.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, [])?))
      .await?;
    Ok(changed)
  }
}

// ─── SongStore impl ──────────────────────────────────────────────────────────

impl SongStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      email:      input.email,
      created_at: now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let username  = user.username.clone();
    let email     = user.email.clone();
    let hash      = input.password_hash;
    let at_str    = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, email, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_credentials).transpose()
  }

  // ── Songs & versions ──────────────────────────────────────────────────────

  async fn insert_song(&self, input: NewSong) -> Result<Song> {
    let song = Song {
      song_id:     Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      author_id:   input.author_id,
      is_complete: false,
      created_at:  now(),
    };

    let id_str      = encode_uuid(song.song_id);
    let title       = song.title.clone();
    let description = song.description.clone();
    let author_str  = encode_uuid(song.author_id);
    let at_str      = encode_dt(song.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO songs (song_id, title, description, author_id, is_complete, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5)",
          rusqlite::params![id_str, title, description, author_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(song)
  }

  async fn insert_version(&self, input: NewVersion) -> Result<Version> {
    let version = Version {
      version_id:  Uuid::new_v4(),
      song_id:     input.song_id,
      creator_id:  input.creator_id,
      audio:       input.audio,
      is_original: input.is_original,
      notes:       input.notes,
      category:    input.category,
      created_at:  now(),
    };

    let id_str       = encode_uuid(version.version_id);
    let song_str     = encode_uuid(version.song_id);
    let creator_str  = encode_uuid(version.creator_id);
    let audio_key    = version.audio.key.clone();
    let audio_url    = version.audio.url.clone();
    let is_original  = version.is_original;
    let notes        = version.notes.clone();
    let category_str = version.category.map(encode_category);
    let at_str       = encode_dt(version.created_at);

    let song_exists = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM songs WHERE song_id = ?1",
            rusqlite::params![song_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO versions (
             version_id, song_id, creator_id, audio_key, audio_url,
             is_original, notes, category, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            song_str,
            creator_str,
            audio_key,
            audio_url,
            is_original,
            notes,
            category_str,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !song_exists {
      return Err(Error::SongNotFound(version.song_id));
    }
    Ok(version)
  }

  async fn get_version(&self, id: Uuid) -> Result<Option<Version>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{} WHERE v.version_id = ?1", RawVersion::SELECT),
              rusqlite::params![id_str],
              RawVersion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_version).transpose()
  }

  async fn get_song(&self, id: Uuid) -> Result<Option<SongView>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawSong, Vec<RawVersion>)> = self
      .conn
      .call(move |conn| {
        let song = conn
          .query_row(
            &format!("{} WHERE s.song_id = ?1", RawSong::SELECT),
            rusqlite::params![id_str],
            RawSong::from_row,
          )
          .optional()?;
        let Some(song) = song else {
          return Ok(None);
        };
        let versions = song_versions(conn, &song.song_id)?;
        Ok(Some((song, versions)))
      })
      .await?;

    raw.map(|(song, versions)| song.into_view(versions)).transpose()
  }

  async fn list_songs(&self, query: &SongQuery) -> Result<Vec<SongView>> {
    let author_str = query.author_id.map(encode_uuid);
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query.limit.map_or(-1, |l| l.min(i64::MAX as usize) as i64);
    let offset = query.offset.unwrap_or(0).min(i64::MAX as usize) as i64;

    let raws: Vec<(RawSong, Vec<RawVersion>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{} WHERE (?1 IS NULL OR s.author_id = ?1)
           ORDER BY s.created_at DESC, s.rowid DESC
           LIMIT ?2 OFFSET ?3",
          RawSong::SELECT
        ))?;
        let songs = stmt
          .query_map(rusqlite::params![author_str, limit, offset], RawSong::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(songs.len());
        for song in songs {
          let versions = song_versions(conn, &song.song_id)?;
          out.push((song, versions));
        }
        Ok(out)
      })
      .await?;

    raws
      .into_iter()
      .map(|(song, versions)| song.into_view(versions))
      .collect()
  }

  async fn list_versions(&self, query: &VersionQuery) -> Result<Vec<VersionView>> {
    let creator_str = query.creator_id.map(encode_uuid);
    let include_originals = query.include_originals;

    let raws: Vec<RawVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{} WHERE (?1 IS NULL OR v.creator_id = ?1)
             AND (?2 OR v.is_original = 0)
           ORDER BY v.created_at DESC, v.rowid DESC",
          RawVersion::SELECT
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![creator_str, include_originals],
            RawVersion::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVersion::into_view).collect()
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn find_like(&self, version_id: Uuid, user_id: Uuid) -> Result<Option<Like>> {
    let version_str = encode_uuid(version_id);
    let user_str    = encode_uuid(user_id);

    let raw: Option<RawLike> = self
      .conn
      .call(move |conn| Ok(like_by_pair(conn, &version_str, &user_str)?))
      .await?;

    raw.map(RawLike::into_like).transpose()
  }

  async fn insert_like(&self, version_id: Uuid, user_id: Uuid) -> Result<Like> {
    let id_str      = encode_uuid(Uuid::new_v4());
    let version_str = encode_uuid(version_id);
    let user_str    = encode_uuid(user_id);
    let at_str      = encode_dt(now());

    let raw: RawLike = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO version_likes (like_id, version_id, user_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (version_id, user_id) DO NOTHING",
          rusqlite::params![id_str, version_str, user_str, at_str],
        )?;
        // Either the row just inserted or the one that was already there.
        Ok(conn.query_row(
          &format!("{} WHERE version_id = ?1 AND user_id = ?2", RawLike::SELECT),
          rusqlite::params![version_str, user_str],
          RawLike::from_row,
        )?)
      })
      .await?;

    raw.into_like()
  }

  async fn delete_like(&self, like_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(like_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM version_likes WHERE like_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn count_likes(&self, version_id: Uuid) -> Result<u64> {
    let version_str = encode_uuid(version_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM version_likes WHERE version_id = ?1",
          rusqlite::params![version_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn mark_song_complete(&self, song_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(song_id);

    let (changed, exists) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE songs SET is_complete = 1 WHERE song_id = ?1 AND is_complete = 0",
          rusqlite::params![id_str],
        )?;
        if changed > 0 {
          return Ok((true, true));
        }
        let exists = conn
          .query_row(
            "SELECT 1 FROM songs WHERE song_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok((false, exists))
      })
      .await?;

    if !exists {
      return Err(Error::SongNotFound(song_id));
    }
    if changed {
      tracing::info!(%song_id, "song marked complete");
    }
    Ok(changed)
  }
}
