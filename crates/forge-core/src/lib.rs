//! Core types and trait definitions for CollabForge.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the version ranking rules, the like/completion engine, and the storage
//! traits every backend implements.

pub mod engine;
pub mod error;
pub mod like;
pub mod policy;
pub mod rank;
pub mod song;
pub mod state;
pub mod store;
pub mod user;
pub mod validate;

#[cfg(test)]
mod testing;

pub use engine::VersionEngine;
pub use error::{Error, Result, ValidationError};
