//! Timeout and retry policy for calls into the store and blob backends.
//!
//! Every call is bounded by [`CallPolicy::timeout`]. Reads are idempotent and
//! retried; mutations run exactly once so a slow success is never submitted
//! twice.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
  pub timeout:       Duration,
  /// Total attempts for a read, including the first. Values below 1 act as 1.
  pub read_attempts: u32,
}

impl Default for CallPolicy {
  fn default() -> Self {
    Self {
      timeout:       Duration::from_secs(10),
      read_attempts: 3,
    }
  }
}

impl CallPolicy {
  /// Run an idempotent store read, retrying on error or timeout.
  pub async fn read<T, E, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let attempts = self.read_attempts.max(1);
    let mut attempt = 1;
    loop {
      match self.once(op, call(), Error::Store).await {
        Ok(value) => return Ok(value),
        Err(e) if attempt < attempts => {
          tracing::warn!(op, attempt, error = %e, "read failed, retrying");
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }

  /// Run a store mutation once.
  pub async fn write<T, E, Fut>(&self, op: &'static str, call: Fut) -> Result<T>
  where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    self.once(op, call, Error::Store).await
  }

  /// Run a blob store call once.
  pub async fn blob<T, E, Fut>(&self, op: &'static str, call: Fut) -> Result<T>
  where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    self.once(op, call, Error::Blob).await
  }

  async fn once<T, E, Fut>(
    &self,
    op: &'static str,
    call: Fut,
    wrap: fn(BoxError) -> Error,
  ) -> Result<T>
  where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    match tokio::time::timeout(self.timeout, call).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => Err(wrap(Box::new(e))),
      Err(_) => Err(Error::Timeout(op)),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    io,
    sync::atomic::{AtomicU32, Ordering},
  };

  use super::*;

  fn policy() -> CallPolicy {
    CallPolicy {
      timeout:       Duration::from_millis(50),
      read_attempts: 3,
    }
  }

  #[tokio::test]
  async fn read_retries_until_success() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let value = policy()
      .read("flaky", move || async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(io::Error::other("connection reset"))
        } else {
          Ok(42)
        }
      })
      .await
      .unwrap();
    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn read_gives_up_after_attempts() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let err = policy()
      .read("broken", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(io::Error::other("down"))
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn write_is_never_retried() {
    let calls = AtomicU32::new(0);
    let err = policy()
      .write("insert", async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(io::Error::other("constraint"))
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn slow_write_times_out() {
    let err = policy()
      .write("insert_like", async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, io::Error>(())
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Timeout("insert_like")));
  }

  #[tokio::test]
  async fn blob_errors_are_tagged() {
    let err = policy()
      .blob("put_audio", async { Err::<(), _>(io::Error::other("disk full")) })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Blob(_)));
  }
}
