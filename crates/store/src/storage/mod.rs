//! Storage backend abstraction.
//!
//! The cart is mirrored into a key-value store with string keys and
//! serialized-text values. The backend is pluggable so the same store works
//! against device-local files in production and an in-memory map in tests.

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Errors that can occur when reading or writing the backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Asynchronous key-value persistence contract.
///
/// `get` of a key that was never written returns `Ok(None)`. `set` replaces
/// the whole value for the key; the backend serializes writes by call order
/// but enforces no ordering between callers (last write wins).
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}
