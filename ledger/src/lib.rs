//! The two append-only ledgers: the membership chain (grouped peers and
//! election votes, one block per cycle) and the transaction chain (file
//! upload/share records). Both share the same hash-linking mechanics through
//! [`Chain`]; they differ only in block payloads.

pub mod block;
pub mod chain;
pub mod error;
pub mod hash;
pub mod merkle;

pub use block::{BlockLink, MembershipBlock, TransactionBlock};
pub use chain::{Chain, MembershipChain, TransactionChain};
pub use error::ChainError;
pub use hash::{block_hash, sha256_hex};
pub use merkle::merkle_root;
