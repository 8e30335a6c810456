//! Core data types shared across the peershare protocol crates.

pub mod peer;
pub mod time;
pub mod transaction;
pub mod vote;

pub use peer::PeerInfo;
pub use time::Timestamp;
pub use transaction::{FileRecord, FileTransaction, ParticipantRecord, TransactionKind};
pub use vote::Vote;
