//! Nullable collaborator implementations.
//!
//! Deterministic, dependency-free stand-ins for the Signer / Encryptor /
//! KeyStore / BlobStore collaborators. They provide no confidentiality and
//! exist so the node can run end-to-end in development and tests without a
//! real crypto or storage backend.

pub mod blob;
pub mod crypto;

pub use blob::MemoryBlobStore;
pub use crypto::{MemoryKeyStore, NullEncryptor, NullSigner};
