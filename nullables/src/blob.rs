//! In-memory content-addressable blob store.

use peershare_store::{BlobStore, StorageError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Thread-safe in-memory blob store. Content ids are the SHA-256 hex digest
/// of the stored bytes, so identical content always maps to the same id.
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, bytes: &[u8]) -> Result<String, StorageError> {
        let content_id = hex::encode(Sha256::digest(bytes));
        self.blobs
            .lock()
            .unwrap()
            .insert(content_id.clone(), bytes.to_vec());
        Ok(content_id)
    }

    fn get(&self, content_id: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(content_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(content_id.to_string()))
    }
}
