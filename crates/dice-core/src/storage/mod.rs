//! Keyed document storage and the canvas persistence adapter.

mod adapter;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use adapter::{LoadOutcome, PersistenceAdapter, school_key};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Keyed store of serialized documents.
///
/// Backends deal in raw JSON text so that a corrupt payload reaches the
/// adapter, which decides how to degrade, instead of failing inside the
/// backend.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Create or overwrite the document stored under `key`.
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the document stored under `key`, `NotFound` if absent.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;
}

/// Keyed store of serialized documents (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Create or overwrite the document stored under `key`.
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the document stored under `key`, `NotFound` if absent.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;
}
