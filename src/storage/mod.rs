//! Device-local key-value storage
//!
//! Everything the client persists (the bearer token, the pending PKCE verifier
//! and the custom album library) goes through [`KeyValueStore`], so the backing
//! medium can be swapped for an in-memory map in tests.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Bearer token for the catalog service
pub const TOKEN_KEY: &str = "spotify_token";

/// PKCE verifier written before the authorization redirect
pub const VERIFIER_KEY: &str = "verifier";

/// Serialized array of custom albums
pub const CUSTOM_ALBUMS_KEY: &str = "customAlbums";

/// Copy of a `customAlbums` value that could not be fully read
pub const CUSTOM_ALBUMS_BACKUP_KEY: &str = "customAlbums.bak";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage capability.
///
/// `set` and `remove` must be durable when they return `Ok`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
