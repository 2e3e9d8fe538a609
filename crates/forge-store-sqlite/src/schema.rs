//! SQL schema for the CollabForge SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS songs (
    song_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    author_id   TEXT NOT NULL REFERENCES users(user_id),
    is_complete INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- Versions are insert-only. Like counts are never stored here.
CREATE TABLE IF NOT EXISTS versions (
    version_id  TEXT PRIMARY KEY,
    song_id     TEXT NOT NULL REFERENCES songs(song_id),
    creator_id  TEXT NOT NULL REFERENCES users(user_id),
    audio_key   TEXT NOT NULL,
    audio_url   TEXT NOT NULL,
    is_original INTEGER NOT NULL,
    notes       TEXT,
    category    TEXT,              -- 'alter' | 'cover' | NULL
    created_at  TEXT NOT NULL,
    CHECK (is_original = 0 OR category IS NULL)
);

-- Exactly one original per song.
CREATE UNIQUE INDEX IF NOT EXISTS versions_one_original
    ON versions(song_id) WHERE is_original = 1;

CREATE TABLE IF NOT EXISTS version_likes (
    like_id    TEXT PRIMARY KEY,
    version_id TEXT NOT NULL REFERENCES versions(version_id),
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    UNIQUE (version_id, user_id)
);

-- Completion is one-way.
CREATE TRIGGER IF NOT EXISTS songs_completion_sticky
BEFORE UPDATE OF is_complete ON songs
WHEN OLD.is_complete = 1 AND NEW.is_complete = 0
BEGIN
    SELECT RAISE(ABORT, 'song completion is permanent');
END;

-- Released work cannot be revoked.
CREATE TRIGGER IF NOT EXISTS songs_no_delete
BEFORE DELETE ON songs
BEGIN
    SELECT RAISE(ABORT, 'released songs cannot be deleted');
END;

CREATE TRIGGER IF NOT EXISTS versions_no_delete
BEFORE DELETE ON versions
BEGIN
    SELECT RAISE(ABORT, 'versions cannot be deleted');
END;

CREATE INDEX IF NOT EXISTS songs_created_idx   ON songs(created_at);
CREATE INDEX IF NOT EXISTS songs_author_idx    ON songs(author_id);
CREATE INDEX IF NOT EXISTS versions_song_idx   ON versions(song_id);
CREATE INDEX IF NOT EXISTS versions_creator_idx ON versions(creator_id);
CREATE INDEX IF NOT EXISTS likes_version_idx   ON version_likes(version_id);

PRAGMA user_version = 1;
";
