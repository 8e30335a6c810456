//! Quorum-commit consensus rounds.
//!
//! One state machine serves both scopes: the all-leaders scope that commits
//! membership blocks and the single-group scope that commits transaction
//! blocks. The proposing leader holds the round; everyone else only reacts
//! to the messages it emits.

pub mod round;

pub use round::{quorum, ConsensusRound, Phase};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    /// A commit arrived from a peer outside the round's scope.
    #[error("peer {peer_id} is not a participant of this round")]
    NotInScope { peer_id: String },

    /// A commit arrived for a different block than the one proposed.
    #[error("commit hash {got} does not match proposed block {expected}")]
    BlockMismatch { expected: String, got: String },

    /// Finalize was called before the round reached quorum.
    #[error("round has {commits} of {required} required commits")]
    QuorumNotReached { commits: usize, required: usize },
}
