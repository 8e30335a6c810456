//! Cryptography collaborator interfaces.
//!
//! The protocol core only embeds opaque references (sealed keys, signatures,
//! content ids) inside block payloads. The actual asymmetric and symmetric
//! schemes live behind these traits, so the node can be wired with a real
//! implementation or with the nullables used in tests.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key pair not found for peer {0}")]
    KeyNotFound(String),

    #[error("signing failed: {0}")]
    Sign(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A peer's key material, as loaded from the key store.
///
/// Both halves are opaque strings; the core never inspects them.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Transaction signing.
pub trait Signer: Send + Sync {
    /// Sign `data` with `private_key`.
    fn sign(&self, data: &[u8], private_key: &str) -> Result<String, CryptoError>;

    /// Verify `signature` over `data` against `public_key`.
    fn verify(&self, data: &[u8], signature: &str, public_key: &str) -> Result<bool, CryptoError>;
}

/// Symmetric file encryption plus sealing of file keys to peer public keys.
pub trait Encryptor: Send + Sync {
    /// Generate a fresh symmetric file key.
    fn generate_file_key(&self) -> Result<String, CryptoError>;

    /// Encrypt the file at `input` into `output` with `file_key`.
    fn encrypt_file(&self, input: &Path, output: &Path, file_key: &str) -> Result<(), CryptoError>;

    /// Decrypt the file at `input` into `output` with `file_key`.
    fn decrypt_file(&self, input: &Path, output: &Path, file_key: &str) -> Result<(), CryptoError>;

    /// Seal a file key to a peer's public key.
    fn seal_key(&self, file_key: &str, public_key: &str) -> Result<String, CryptoError>;

    /// Recover a file key sealed to us, using our private key.
    fn open_key(&self, sealed_key: &str, private_key: &str) -> Result<String, CryptoError>;
}

/// Access to per-peer key pairs.
pub trait KeyStore: Send + Sync {
    fn load_key_pair(&self, peer_id: &str) -> Result<KeyPair, CryptoError>;
}
