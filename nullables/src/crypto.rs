//! Null crypto collaborators.
//!
//! Signatures are keyed digests and "sealed" keys are plain tagged strings.
//! Deterministic and reversible, with zero confidentiality. Development and
//! test use only.

use peershare_crypto::{CryptoError, Encryptor, KeyPair, KeyStore, Signer};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Derives per-peer key pairs on demand: `pub-<id>` / `priv-<id>`.
pub struct MemoryKeyStore;

impl KeyStore for MemoryKeyStore {
    fn load_key_pair(&self, peer_id: &str) -> Result<KeyPair, CryptoError> {
        Ok(KeyPair {
            public_key: format!("pub-{peer_id}"),
            private_key: format!("priv-{peer_id}"),
        })
    }
}

/// Signature = SHA-256 over the key identity and the payload.
pub struct NullSigner;

/// The key owner's identity, shared between the `pub-`/`priv-` halves that
/// [`MemoryKeyStore`] hands out.
fn key_identity(key: &str) -> &str {
    key.strip_prefix("priv-")
        .or_else(|| key.strip_prefix("pub-"))
        .unwrap_or(key)
}

impl Signer for NullSigner {
    fn sign(&self, data: &[u8], private_key: &str) -> Result<String, CryptoError> {
        let mut hasher = Sha256::new();
        hasher.update(key_identity(private_key).as_bytes());
        hasher.update(data);
        Ok(hex::encode(hasher.finalize()))
    }

    fn verify(&self, data: &[u8], signature: &str, public_key: &str) -> Result<bool, CryptoError> {
        let mut hasher = Sha256::new();
        hasher.update(key_identity(public_key).as_bytes());
        hasher.update(data);
        Ok(hex::encode(hasher.finalize()) == signature)
    }
}

/// File "encryption" that copies bytes verbatim and seals keys by tagging
/// them with the recipient's public key.
pub struct NullEncryptor {
    counter: AtomicU64,
}

impl NullEncryptor {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for NullEncryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Encryptor for NullEncryptor {
    fn generate_file_key(&self) -> Result<String, CryptoError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("filekey-{n}"))
    }

    fn encrypt_file(&self, input: &Path, output: &Path, _file_key: &str) -> Result<(), CryptoError> {
        std::fs::copy(input, output)?;
        Ok(())
    }

    fn decrypt_file(&self, input: &Path, output: &Path, _file_key: &str) -> Result<(), CryptoError> {
        std::fs::copy(input, output)?;
        Ok(())
    }

    fn seal_key(&self, file_key: &str, public_key: &str) -> Result<String, CryptoError> {
        Ok(format!("{file_key}@{public_key}"))
    }

    fn open_key(&self, sealed_key: &str, _private_key: &str) -> Result<String, CryptoError> {
        match sealed_key.rsplit_once('@') {
            Some((file_key, _)) => Ok(file_key.to_string()),
            None => Err(CryptoError::Decrypt(format!(
                "malformed sealed key: {sealed_key}"
            ))),
        }
    }
}
