//! Node-level error type.

use peershare_consensus::ConsensusError;
use peershare_crypto::CryptoError;
use peershare_ledger::ChainError;
use peershare_messages::WireError;
use peershare_network::NetworkError;
use peershare_store::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no transaction block at index {index}")]
    BlockNotFound { index: u64 },

    #[error("peer {id} is not in the current registry")]
    PeerNotFound { id: String },

    #[error("no current leader; wait for the next election cycle")]
    NoCurrentLeader,
}
