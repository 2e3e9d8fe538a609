//! SQLite and filesystem backend for CollabForge.
//!
//! [`SqliteStore`] wraps [`tokio_rusqlite`] so all database access runs on a
//! dedicated thread without blocking the async runtime. [`FsBlobStore`] keeps
//! audio files in a directory, named by content hash.

mod blob;
mod encode;
mod schema;
mod store;

pub mod error;

pub use blob::FsBlobStore;
pub use error::{Error, Result};
pub use store::SqliteStore;
