//! Plain-text rendering of songs, versions and dashboards.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use forge_core::{
  engine::Dashboard,
  song::{SongView, VersionView},
};

/// Ranked versions shown per song before the rest are collapsed.
pub const VISIBLE_VERSIONS: usize = 11;

/// Human-friendly age of `then` as seen at `now`.
pub fn relative_date(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let days = (now - then).num_days();
  match days {
    ..=0 => "Today".to_string(),
    1 => "Yesterday".to_string(),
    2..=6 => format!("{days} days ago"),
    7..=29 => format!("{} weeks ago", days / 7),
    _ => then.format("%b %-d, %Y").to_string(),
  }
}

fn version_line(out: &mut String, v: &VersionView, now: DateTime<Utc>) {
  let label = if v.version.is_original {
    "ORIGINAL".to_string()
  } else {
    v.version
      .category
      .map_or("REMIX".to_string(), |c| c.as_ref().to_uppercase())
  };
  let _ = write!(out, "  [{label}] @{}", v.creator);
  if let Some(notes) = &v.version.notes {
    let _ = write!(out, " · {notes}");
  }
  let _ = writeln!(
    out,
    " · ♡ {} · {}",
    v.like_count,
    relative_date(v.version.created_at, now)
  );
  let _ = writeln!(out, "      {}  {}", v.version.version_id, v.version.audio.url);
}

/// Render a ranked song. Unless `all` is set only the first
/// [`VISIBLE_VERSIONS`] versions are listed.
pub fn song(song: &SongView, now: DateTime<Utc>, all: bool) -> String {
  let mut out = String::new();
  let _ = write!(
    out,
    "{}  by @{} · {}",
    song.song.title,
    song.author,
    relative_date(song.song.created_at, now)
  );
  if song.song.is_complete {
    out.push_str(" · Ready for distribution");
  }
  out.push('\n');
  let _ = writeln!(out, "  id {}", song.song.song_id);
  if let Some(description) = &song.song.description {
    let _ = writeln!(out, "  {description}");
  }

  let n = song.versions.len();
  let _ = writeln!(out, "  {n} version{}", if n == 1 { "" } else { "s" });

  let shown = if all { n } else { n.min(VISIBLE_VERSIONS) };
  for v in &song.versions[..shown] {
    version_line(&mut out, v, now);
  }
  if shown < n {
    let hidden = n - shown;
    let _ = writeln!(
      out,
      "  … {hidden} more version{} (forge show {})",
      if hidden == 1 { "" } else { "s" },
      song.song.song_id
    );
  }
  out
}

pub fn dashboard(d: &Dashboard, now: DateTime<Utc>) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "@{}", d.user.username);
  let _ = writeln!(out, "  Songs Released    {}", d.songs_released);
  let _ = writeln!(out, "  Versions Created  {}", d.versions_created);
  let _ = writeln!(out, "  Total Likes       {}", d.total_likes);

  if !d.songs.is_empty() {
    out.push_str("\nYour songs\n");
    for s in &d.songs {
      let _ = writeln!(
        out,
        "  {}  ♡ {} · {} version{}{}",
        s.song.title,
        s.total_likes(),
        s.versions.len(),
        if s.versions.len() == 1 { "" } else { "s" },
        if s.song.is_complete { " · complete" } else { "" }
      );
    }
  }

  if !d.versions.is_empty() {
    out.push_str("\nYour versions\n");
    for v in &d.versions {
      version_line(&mut out, v, now);
    }
  }
  out
}
