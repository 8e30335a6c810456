//! SHA-256 helpers for block hashing.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Header hash for a membership block: the pipe-joined fields in this exact
/// order. The merkle root commits to the payload, so the header hash covers
/// the whole block.
pub fn block_hash(index: u64, timestamp_ms: i64, prev_hash: &str, merkle_root: &str) -> String {
    sha256_hex(&format!("{index}|{timestamp_ms}|{prev_hash}|{merkle_root}"))
}
