//! Content-addressable blob storage collaborator interface.
//!
//! File ciphertext lives in an external store (IPFS or similar); the core
//! only keeps the returned content id inside block payloads.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressable blob store.
pub trait BlobStore: Send + Sync {
    /// Store `bytes`, returning their content id.
    fn put(&self, bytes: &[u8]) -> Result<String, StorageError>;

    /// Fetch the bytes previously stored under `content_id`.
    fn get(&self, content_id: &str) -> Result<Vec<u8>, StorageError>;
}
