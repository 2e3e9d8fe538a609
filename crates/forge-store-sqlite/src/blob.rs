//! [`FsBlobStore`], audio files kept in a local directory.
//!
//! Files are named by the hex SHA-256 of their contents plus the upload's
//! extension, so storing the same bytes twice yields the same key.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use forge_core::{song::AudioRef, store::BlobStore};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

const HASH_HEX_LEN: usize = 64;
const MAX_EXTENSION_LEN: usize = 5;

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root:        PathBuf,
  /// Base URL under which `root` is served, without trailing slash.
  public_base: String,
}

fn valid_extension(ext: &str) -> bool {
  !ext.is_empty()
    && ext.len() <= MAX_EXTENSION_LEN
    && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `true` for keys this store could have produced.
fn valid_key(key: &str) -> bool {
  let Some((hash, ext)) = key.split_once('.') else {
    return false;
  };
  hash.len() == HASH_HEX_LEN
    && hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
    && valid_extension(ext)
}

impl FsBlobStore {
  /// Use `root` as the storage directory, creating it if needed.
  pub async fn open(root: impl AsRef<Path>, public_base: impl Into<String>) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self {
      root,
      public_base: public_base.into().trim_end_matches('/').to_string(),
    })
  }

  pub fn root(&self) -> &Path { &self.root }

  pub fn url_for(&self, key: &str) -> String { format!("{}/{key}", self.public_base) }
}

impl BlobStore for FsBlobStore {
  type Error = Error;

  async fn put(&self, extension: &str, bytes: Bytes) -> Result<AudioRef> {
    let extension = extension.to_ascii_lowercase();
    if !valid_extension(&extension) {
      return Err(Error::InvalidExtension(extension));
    }

    let key = format!("{}.{extension}", hex::encode(Sha256::digest(&bytes)));
    let path = self.root.join(&key);

    if tokio::fs::try_exists(&path).await? {
      tracing::debug!(%key, "audio already stored");
    } else {
      // Write under a unique name, then rename so readers never see a
      // partial file.
      let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4().simple()));
      tokio::fs::write(&tmp, &bytes).await?;
      if let Err(e) = tokio::fs::rename(&tmp, &path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
      }
      tracing::debug!(%key, size = bytes.len(), "audio stored");
    }

    Ok(AudioRef {
      url: self.url_for(&key),
      key,
    })
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>> {
    if !valid_key(key) {
      return Ok(None);
    }
    match tokio::fs::read(self.root.join(key)).await {
      Ok(data) => Ok(Some(Bytes::from(data))),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn blobs() -> (tempfile::TempDir, FsBlobStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsBlobStore::open(dir.path().join("audio"), "http://localhost:8080/api/audio/")
      .await
      .expect("open blob store");
    (dir, store)
  }

  #[tokio::test]
  async fn put_then_get() {
    let (_dir, store) = blobs().await;
    let audio = store.put("MP3", Bytes::from_static(b"ID3 fake")).await.unwrap();

    assert!(audio.key.ends_with(".mp3"));
    assert_eq!(audio.url, format!("http://localhost:8080/api/audio/{}", audio.key));
    let got = store.get(&audio.key).await.unwrap();
    assert_eq!(got.as_deref(), Some(&b"ID3 fake"[..]));
  }

  #[tokio::test]
  async fn same_bytes_same_key() {
    let (_dir, store) = blobs().await;
    let a = store.put("wav", Bytes::from_static(b"RIFF")).await.unwrap();
    let b = store.put("wav", Bytes::from_static(b"RIFF")).await.unwrap();
    let c = store.put("wav", Bytes::from_static(b"RIFX")).await.unwrap();
    assert_eq!(a, b);
    assert_ne!(a.key, c.key);
  }

  #[tokio::test]
  async fn rejects_bad_extensions() {
    let (_dir, store) = blobs().await;
    for ext in ["", "../mp3", "toolong", "m p3"] {
      let err = store.put(ext, Bytes::from_static(b"x")).await.unwrap_err();
      assert!(matches!(err, Error::InvalidExtension(_)), "{ext:?}");
    }
  }

  #[tokio::test]
  async fn unknown_or_malformed_keys_are_none() {
    let (_dir, store) = blobs().await;
    let missing = format!("{}.mp3", "0".repeat(64));
    assert!(store.get(&missing).await.unwrap().is_none());
    assert!(store.get("../etc/passwd").await.unwrap().is_none());
    assert!(store.get("abc.mp3").await.unwrap().is_none());
  }
}
