//! Bottom-up Merkle root over canonical record strings.

use crate::hash::sha256_hex;

/// Compute the Merkle root of a list of canonical record strings.
///
/// Adjacent elements are pairwise hashed (the last one is duplicated when a
/// level has odd length) until a single digest remains. An empty input
/// yields the empty string.
pub fn merkle_root(records: &[String]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut level: Vec<String> = records.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(sha256_hex(&format!("{left}{right}")));
        }
        level = next;
    }
    level.pop().unwrap_or_default()
}
