//! Version ordering and completion detection.
//!
//! The original version is pinned first. Every other version is ordered by
//! like count, most liked first; equal counts keep the oldest first, and the
//! version id settles anything left so the order is fully deterministic.

use std::cmp::Ordering;

use crate::song::{SongView, VersionView};

/// Like count at which a version marks its song complete.
pub const COMPLETION_THRESHOLD: u64 = 1000;

/// Display order between two versions of the same song.
pub fn compare(a: &VersionView, b: &VersionView) -> Ordering {
  b.version
    .is_original
    .cmp(&a.version.is_original)
    .then_with(|| b.like_count.cmp(&a.like_count))
    .then_with(|| a.version.created_at.cmp(&b.version.created_at))
    .then_with(|| a.version.version_id.cmp(&b.version.version_id))
}

/// Sort `versions` into display order in place.
pub fn rank(versions: &mut [VersionView]) { versions.sort_by(compare); }

/// Consume a song and return it with its versions ranked.
pub fn ranked(mut song: SongView) -> SongView {
  rank(&mut song.versions);
  song
}

/// Whether any version has reached [`COMPLETION_THRESHOLD`].
pub fn reaches_completion(versions: &[VersionView]) -> bool {
  versions.iter().any(|v| v.like_count >= COMPLETION_THRESHOLD)
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::song::{AudioRef, Version};

  fn view(name: &str, original: bool, likes: u64, created_secs: i64) -> VersionView {
    VersionView {
      version:    Version {
        version_id:  Uuid::new_v4(),
        song_id:     Uuid::nil(),
        creator_id:  Uuid::nil(),
        audio:       AudioRef {
          key: format!("{name}.mp3"),
          url: format!("http://localhost/audio/{name}.mp3"),
        },
        is_original: original,
        notes:       None,
        category:    None,
        created_at:  Utc.timestamp_opt(created_secs, 0).unwrap(),
      },
      creator:    name.to_string(),
      like_count: likes,
    }
  }

  fn names(versions: &[VersionView]) -> Vec<&str> {
    versions.iter().map(|v| v.creator.as_str()).collect()
  }

  #[test]
  fn equal_likes_keep_creation_order() {
    let mut versions = vec![
      view("C", false, 5, 2),
      view("A", true, 0, 0),
      view("B", false, 5, 1),
    ];
    rank(&mut versions);
    assert_eq!(names(&versions), ["A", "B", "C"]);
  }

  #[test]
  fn original_first_even_with_fewest_likes() {
    let mut versions = vec![
      view("remix", false, 900, 5),
      view("cover", false, 12, 3),
      view("orig", true, 1, 0),
    ];
    rank(&mut versions);
    assert_eq!(names(&versions), ["orig", "remix", "cover"]);
  }

  #[test]
  fn non_originals_sorted_by_likes_descending() {
    let mut versions = vec![
      view("orig", true, 40, 0),
      view("a", false, 3, 1),
      view("b", false, 70, 2),
      view("c", false, 3, 3),
      view("d", false, 0, 4),
      view("e", false, 71, 5),
    ];
    rank(&mut versions);
    assert_eq!(names(&versions), ["orig", "e", "b", "a", "c", "d"]);

    for pair in versions[1..].windows(2) {
      assert!(pair[0].like_count >= pair[1].like_count);
      if pair[0].like_count == pair[1].like_count {
        assert!(pair[0].version.created_at <= pair[1].version.created_at);
      }
    }
  }

  #[test]
  fn ranking_ignores_input_order() {
    let base = vec![
      view("orig", true, 2, 0),
      view("x", false, 9, 1),
      view("y", false, 9, 2),
      view("z", false, 4, 3),
    ];
    let mut forward = base.clone();
    let mut backward: Vec<_> = base.into_iter().rev().collect();
    rank(&mut forward);
    rank(&mut backward);
    assert_eq!(forward, backward);
  }

  #[test]
  fn song_without_original_still_ranks() {
    let mut versions = vec![view("a", false, 1, 0), view("b", false, 2, 1)];
    rank(&mut versions);
    assert_eq!(names(&versions), ["b", "a"]);
  }

  #[test]
  fn completion_threshold_is_inclusive() {
    assert!(!reaches_completion(&[view("a", true, 999, 0)]));
    assert!(reaches_completion(&[
      view("a", true, 0, 0),
      view("b", false, COMPLETION_THRESHOLD, 1),
    ]));
    assert!(!reaches_completion(&[]));
  }
}
